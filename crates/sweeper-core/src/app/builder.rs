//! AppBuilder - 掃除オーケストレータの構築とワイヤリング
//!
//! # 方針
//! - ports を 1 つずつ受け取り、build() でまとめて検証する（Fail-fast）
//! - 不足している port は名前付きで BuildError::MissingPort を返す
//! - 設定は build() 時に validate() する
//! - Clock だけは省略可能（SystemClock が入る）

use std::sync::Arc;

use crate::app::{
    CartSweep, CleanupConfig, CleanupOrchestrator, ConfigError, OrderExpirySweep,
    PaymentTimeoutSweep, ReservationSweep,
};
use crate::domain::CartIdleExpiry;
use crate::ports::{
    CartRepository, Clock, OrderRepository, ReservationRelease, ReservationRepository, SystemClock,
};

/// AppBuilder は CleanupOrchestrator を構築
///
/// # 使用例
/// ```ignore
/// let orchestrator = AppBuilder::new()
///     .with_config(config)
///     .with_reservations(inventory.clone())
///     .with_release(inventory)
///     .with_orders(orders)
///     .with_carts(carts)
///     .build()?;
/// ```
#[derive(Default)]
pub struct AppBuilder {
    config: CleanupConfig,
    clock: Option<Arc<dyn Clock>>,
    reservations: Option<Arc<dyn ReservationRepository>>,
    release: Option<Arc<dyn ReservationRelease>>,
    orders: Option<Arc<dyn OrderRepository>>,
    carts: Option<Arc<dyn CartRepository>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("missing port: {0}")]
    MissingPort(&'static str),

    #[error("invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),
}

impl AppBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: CleanupConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_reservations(mut self, reservations: Arc<dyn ReservationRepository>) -> Self {
        self.reservations = Some(reservations);
        self
    }

    pub fn with_release(mut self, release: Arc<dyn ReservationRelease>) -> Self {
        self.release = Some(release);
        self
    }

    pub fn with_orders(mut self, orders: Arc<dyn OrderRepository>) -> Self {
        self.orders = Some(orders);
        self
    }

    pub fn with_carts(mut self, carts: Arc<dyn CartRepository>) -> Self {
        self.carts = Some(carts);
        self
    }

    /// # 検証
    /// - 全ての port が揃っているか（最初に見つかった不足を返す）
    /// - CleanupConfig::validate()
    pub fn build(self) -> Result<CleanupOrchestrator, BuildError> {
        let reservations = self
            .reservations
            .ok_or(BuildError::MissingPort("reservations"))?;
        let release = self.release.ok_or(BuildError::MissingPort("release"))?;
        let orders = self.orders.ok_or(BuildError::MissingPort("orders"))?;
        let carts = self.carts.ok_or(BuildError::MissingPort("carts"))?;
        self.config.validate()?;

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);
        let config = self.config;

        Ok(CleanupOrchestrator::new(
            ReservationSweep::new(reservations, release.clone(), clock.clone()),
            OrderExpirySweep::new(
                orders.clone(),
                release.clone(),
                clock.clone(),
                config.order_batch_size,
            ),
            CartSweep::new(
                carts,
                clock.clone(),
                CartIdleExpiry::new(config.cart_idle_timeout()),
            ),
            PaymentTimeoutSweep::new(orders, release, clock.clone(), config.payment_batch_size),
            clock,
            config.stats_scan_limit,
        ))
    }
}
