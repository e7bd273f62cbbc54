//! Order record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::ids::OrderId;
use super::state::{OrderStatus, PaymentStatus};

/// Snapshot of an order as returned by the order repository.
///
/// Design:
/// - The repository owns the row; the sweeper only mutates a fetched copy and
///   writes it back with `OrderRepository::update`.
/// - State transitions go through methods so `status` and `payment_status`
///   never drift apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,

    /// Absolute deadline for the payment to arrive.
    pub payment_timeout: DateTime<Utc>,

    /// Whether stock reservations are currently held for this order.
    pub inventory_reserved: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// New order waiting for payment, with inventory already reserved.
    pub fn new(id: OrderId, created_at: DateTime<Utc>, payment_timeout: DateTime<Utc>) -> Self {
        Self {
            id,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_timeout,
            inventory_reserved: true,
            created_at,
            updated_at: created_at,
        }
    }

    /// Payment is still pending and its deadline has passed.
    pub fn is_payment_expired(&self, now: DateTime<Utc>) -> bool {
        self.payment_status == PaymentStatus::Pending && now >= self.payment_timeout
    }

    pub fn has_inventory_reserved(&self) -> bool {
        self.inventory_reserved
    }

    /// Clear the reservation flag (after the holds were released).
    pub fn release_reservation_flag(&mut self, now: DateTime<Utc>) {
        self.inventory_reserved = false;
        self.updated_at = now;
    }

    /// Terminal mutation for an unpaid order.
    ///
    /// Sets `cancelled` + `failed` together and clears the reservation flag.
    /// Refuses to touch an order that is already terminal.
    pub fn cancel_for_payment_timeout(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status.is_terminal() || self.payment_status.is_terminal() {
            return Err(DomainError::invalid_transition(
                self.id,
                self.status.as_str(),
                OrderStatus::Cancelled.as_str(),
            ));
        }
        self.status = OrderStatus::Cancelled;
        self.payment_status = PaymentStatus::Failed;
        self.release_reservation_flag(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn order() -> Order {
        Order::new(OrderId::random(), t0(), t0() + Duration::minutes(30))
    }

    #[test]
    fn new_order_is_pending_and_reserved() {
        let order = order();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert!(order.has_inventory_reserved());
    }

    #[test]
    fn payment_expires_exactly_at_deadline() {
        let order = order();
        assert!(!order.is_payment_expired(t0() + Duration::minutes(29)));
        assert!(order.is_payment_expired(t0() + Duration::minutes(30)));
    }

    #[test]
    fn paid_order_never_payment_expired() {
        let mut order = order();
        order.payment_status = PaymentStatus::Paid;
        assert!(!order.is_payment_expired(t0() + Duration::days(1)));
    }

    #[test]
    fn cancel_sets_status_pair_and_clears_flag() {
        let mut order = order();
        let now = t0() + Duration::hours(1);

        order.cancel_for_payment_timeout(now).unwrap();

        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.payment_status, PaymentStatus::Failed);
        assert!(!order.has_inventory_reserved());
        assert_eq!(order.updated_at, now);
    }

    #[test]
    fn cancel_is_refused_on_terminal_order() {
        let mut order = order();
        order.status = OrderStatus::Completed;
        order.payment_status = PaymentStatus::Paid;
        let before = order.clone();

        let err = order.cancel_for_payment_timeout(t0()).unwrap_err();

        assert!(matches!(err, DomainError::InvalidTransition { from: "completed", .. }));
        assert_eq!(order, before);
    }
}
