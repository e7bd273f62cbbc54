//! Test fixture: in-memory stores wired to one FixedClock.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::app::{
    AppBuilder, CartSweep, CleanupConfig, CleanupOrchestrator, OrderExpirySweep,
    PaymentTimeoutSweep, ReservationSweep,
};
use crate::domain::{Cart, CartId, CartIdleExpiry, Order, OrderId, ProductId, ReservationId};
use crate::impls::{InMemoryCartRepository, InMemoryInventory, InMemoryOrderRepository};
use crate::ports::{Clock, FixedClock};

pub(crate) struct World {
    pub clock: Arc<FixedClock>,
    pub inventory: Arc<InMemoryInventory>,
    pub orders: Arc<InMemoryOrderRepository>,
    pub carts: Arc<InMemoryCartRepository>,
    pub product: ProductId,
    pub config: CleanupConfig,
}

impl World {
    pub async fn new() -> Self {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        ));
        let inventory = Arc::new(InMemoryInventory::new(clock.clone()));
        let product = ProductId::random();
        inventory.add_stock(product, 100).await;
        Self {
            clock,
            inventory,
            orders: Arc::new(InMemoryOrderRepository::new()),
            carts: Arc::new(InMemoryCartRepository::new()),
            product,
            config: CleanupConfig::default(),
        }
    }

    /// Instant the world started at.
    pub fn t0(&self) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    /// One unit held for a throwaway order.
    pub async fn hold(&self, expires_at: DateTime<Utc>) -> ReservationId {
        self.inventory
            .reserve(OrderId::random(), self.product, 1, expires_at)
            .await
            .unwrap()
    }

    /// Pending/pending order without any stock held.
    pub async fn order(&self, payment_timeout: DateTime<Utc>) -> OrderId {
        let mut order = Order::new(OrderId::random(), self.clock.now(), payment_timeout);
        order.inventory_reserved = false;
        let id = order.id;
        self.orders.insert(order).await;
        id
    }

    /// Pending/pending order holding two units until `hold_expires_at`.
    pub async fn reserved_order(
        &self,
        payment_timeout: DateTime<Utc>,
        hold_expires_at: DateTime<Utc>,
    ) -> OrderId {
        let order = Order::new(OrderId::random(), self.clock.now(), payment_timeout);
        let id = order.id;
        self.inventory
            .reserve(id, self.product, 2, hold_expires_at)
            .await
            .unwrap();
        self.orders.insert(order).await;
        id
    }

    pub async fn cart(&self, last_activity_at: DateTime<Utc>) -> CartId {
        let mut cart = Cart::new(CartId::random(), self.t0());
        cart.last_activity_at = last_activity_at;
        let id = cart.id;
        self.carts.insert(cart).await;
        id
    }

    pub fn cart_idle_timeout(&self) -> Duration {
        self.config.cart_idle_timeout()
    }

    pub fn reservation_sweep(&self) -> ReservationSweep {
        ReservationSweep::new(
            self.inventory.clone(),
            self.inventory.clone(),
            self.clock.clone(),
        )
    }

    pub fn order_sweep(&self) -> OrderExpirySweep {
        OrderExpirySweep::new(
            self.orders.clone(),
            self.inventory.clone(),
            self.clock.clone(),
            self.config.order_batch_size,
        )
    }

    pub fn cart_sweep(&self) -> CartSweep {
        CartSweep::new(
            self.carts.clone(),
            self.clock.clone(),
            CartIdleExpiry::new(self.cart_idle_timeout()),
        )
    }

    pub fn payment_sweep(&self) -> PaymentTimeoutSweep {
        PaymentTimeoutSweep::new(
            self.orders.clone(),
            self.inventory.clone(),
            self.clock.clone(),
            self.config.payment_batch_size,
        )
    }

    pub fn orchestrator(&self) -> CleanupOrchestrator {
        AppBuilder::new()
            .with_config(self.config.clone())
            .with_clock(self.clock.clone())
            .with_reservations(self.inventory.clone())
            .with_release(self.inventory.clone())
            .with_orders(self.orders.clone())
            .with_carts(self.carts.clone())
            .build()
            .unwrap()
    }
}
