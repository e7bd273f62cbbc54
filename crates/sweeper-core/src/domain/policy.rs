//! Expiry policies: is this entity expired, and what is its terminal state?
//!
//! Policies are pure functions: given a snapshot and `now`, they answer the
//! expiry question and know how to apply the terminal mutation to the
//! snapshot in memory. Persisting the result (and releasing any held stock
//! first) is the job of the sweep that owns the entity.

use chrono::{DateTime, Duration, Utc};

use super::cart::Cart;
use super::errors::DomainError;
use super::order::Order;
use super::reservation::StockReservation;
use super::state::{CartStatus, OrderStatus, PaymentStatus, ReservationStatus};

/// Trait for deciding expiry of one kind of entity.
pub trait ExpiryPolicy: Send + Sync {
    type Entity;

    /// Is `entity` expired at `now`?
    fn is_expired(&self, entity: &Self::Entity, now: DateTime<Utc>) -> bool;

    /// Apply the terminal transition to the snapshot (no I/O).
    fn expire(&self, entity: &mut Self::Entity, now: DateTime<Utc>) -> Result<(), DomainError>;
}

/// Reservation: `expires_at <= now` → released.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReservationExpiry;

impl ExpiryPolicy for ReservationExpiry {
    type Entity = StockReservation;

    fn is_expired(&self, reservation: &StockReservation, now: DateTime<Utc>) -> bool {
        match reservation.status {
            ReservationStatus::Active => reservation.expires_at <= now,
            ReservationStatus::Released | ReservationStatus::Consumed => false,
        }
    }

    fn expire(&self, reservation: &mut StockReservation, now: DateTime<Utc>) -> Result<(), DomainError> {
        reservation.release(now)
    }
}

/// Generic order expiry: `pending/pending` and `now >= payment_timeout`
/// → cancelled/failed, reservation flag cleared.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderPaymentExpiry;

impl ExpiryPolicy for OrderPaymentExpiry {
    type Entity = Order;

    fn is_expired(&self, order: &Order, now: DateTime<Utc>) -> bool {
        match (order.status, order.payment_status) {
            (OrderStatus::Pending, PaymentStatus::Pending) => now >= order.payment_timeout,
            _ => false,
        }
    }

    fn expire(&self, order: &mut Order, now: DateTime<Utc>) -> Result<(), DomainError> {
        order.cancel_for_payment_timeout(now)
    }
}

/// Payment-timeout expiry: payment still pending past its deadline,
/// whatever the (non-terminal) order status is.
///
/// Shipped/completed/cancelled orders are never picked up, even when the
/// payment status was left pending by some other writer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentTimeoutExpiry;

impl ExpiryPolicy for PaymentTimeoutExpiry {
    type Entity = Order;

    fn is_expired(&self, order: &Order, now: DateTime<Utc>) -> bool {
        let status_allows = match order.status {
            OrderStatus::Pending | OrderStatus::Confirmed | OrderStatus::Processing => true,
            OrderStatus::Shipped | OrderStatus::Completed | OrderStatus::Cancelled => false,
        };
        status_allows && order.is_payment_expired(now)
    }

    fn expire(&self, order: &mut Order, now: DateTime<Utc>) -> Result<(), DomainError> {
        order.cancel_for_payment_timeout(now)
    }
}

/// Cart: active and idle for at least `idle_timeout` → abandoned.
#[derive(Debug, Clone, Copy)]
pub struct CartIdleExpiry {
    idle_timeout: Duration,
}

impl CartIdleExpiry {
    pub fn new(idle_timeout: Duration) -> Self {
        Self { idle_timeout }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Carts whose last activity is at or before this instant are idle enough.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.idle_timeout)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl ExpiryPolicy for CartIdleExpiry {
    type Entity = Cart;

    fn is_expired(&self, cart: &Cart, now: DateTime<Utc>) -> bool {
        match cart.status {
            CartStatus::Active => cart.idle_for(now) >= self.idle_timeout,
            CartStatus::Abandoned | CartStatus::CheckedOut => false,
        }
    }

    fn expire(&self, cart: &mut Cart, now: DateTime<Utc>) -> Result<(), DomainError> {
        cart.mark_abandoned(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::{CartId, OrderId, ProductId, ReservationId};
    use chrono::TimeZone;
    use rstest::rstest;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn order(status: OrderStatus, payment: PaymentStatus) -> Order {
        let mut order = Order::new(OrderId::random(), t0(), t0() + Duration::minutes(30));
        order.status = status;
        order.payment_status = payment;
        order
    }

    #[rstest]
    #[case::pending_pending(OrderStatus::Pending, PaymentStatus::Pending, true)]
    #[case::confirmed_pending(OrderStatus::Confirmed, PaymentStatus::Pending, false)]
    #[case::pending_paid(OrderStatus::Pending, PaymentStatus::Paid, false)]
    #[case::cancelled_failed(OrderStatus::Cancelled, PaymentStatus::Failed, false)]
    fn order_payment_expiry_requires_pending_pair(
        #[case] status: OrderStatus,
        #[case] payment: PaymentStatus,
        #[case] expected: bool,
    ) {
        let order = order(status, payment);
        let after_deadline = t0() + Duration::hours(1);
        assert_eq!(OrderPaymentExpiry.is_expired(&order, after_deadline), expected);
    }

    #[test]
    fn order_payment_expiry_waits_for_deadline() {
        let order = order(OrderStatus::Pending, PaymentStatus::Pending);
        assert!(!OrderPaymentExpiry.is_expired(&order, t0() + Duration::minutes(10)));
        assert!(OrderPaymentExpiry.is_expired(&order, t0() + Duration::minutes(30)));
    }

    #[rstest]
    #[case::pending(OrderStatus::Pending, true)]
    #[case::confirmed(OrderStatus::Confirmed, true)]
    #[case::processing(OrderStatus::Processing, true)]
    #[case::shipped(OrderStatus::Shipped, false)]
    #[case::completed(OrderStatus::Completed, false)]
    #[case::cancelled(OrderStatus::Cancelled, false)]
    fn payment_timeout_ignores_terminal_orders(#[case] status: OrderStatus, #[case] expected: bool) {
        let order = order(status, PaymentStatus::Pending);
        let after_deadline = t0() + Duration::hours(1);
        assert_eq!(PaymentTimeoutExpiry.is_expired(&order, after_deadline), expected);
    }

    #[test]
    fn order_expire_applies_terminal_mutation() {
        let mut order = order(OrderStatus::Confirmed, PaymentStatus::Pending);
        let now = t0() + Duration::hours(1);

        PaymentTimeoutExpiry.expire(&mut order, now).unwrap();

        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.payment_status, PaymentStatus::Failed);
        assert!(!order.inventory_reserved);
    }

    #[test]
    fn reservation_expiry_skips_finished_holds() {
        let mut hold = StockReservation::new(
            ReservationId::random(),
            OrderId::random(),
            ProductId::random(),
            1,
            t0(),
            t0() + Duration::minutes(5),
        );
        let now = t0() + Duration::minutes(5);
        assert!(ReservationExpiry.is_expired(&hold, now));

        ReservationExpiry.expire(&mut hold, now).unwrap();
        assert!(!ReservationExpiry.is_expired(&hold, now));
    }

    #[test]
    fn cart_idle_expiry_uses_threshold() {
        let policy = CartIdleExpiry::new(Duration::hours(24));
        let mut cart = Cart::new(CartId::random(), t0());

        assert!(!policy.is_expired(&cart, t0() + Duration::hours(23)));
        assert!(policy.is_expired(&cart, t0() + Duration::hours(24)));
        assert_eq!(policy.cutoff(t0() + Duration::hours(24)), t0());

        policy.expire(&mut cart, t0() + Duration::hours(24)).unwrap();
        assert_eq!(cart.status, CartStatus::Abandoned);
        assert!(!policy.is_expired(&cart, t0() + Duration::hours(48)));
    }
}
