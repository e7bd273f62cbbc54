//! OrderExpirySweep - 支払い期限切れ注文のキャンセル（解放 → キャンセルの順）
//!
//! # フロー
//! 1. status = pending かつ payment = pending の注文をバッチ上限まで取得
//! 2. OrderPaymentExpiry で期限切れを判定
//! 3. 在庫を引き当てている注文は、先に release_by_order で解放
//!    - 解放に失敗したらこの注文はスキップ（キャンセルしない）。次のパスで再試行される
//! 4. 終端遷移（cancelled / failed / 引当フラグ解除）を適用して update
//!    - 保存に失敗したらスキップ
//!
//! # 保証
//! キャンセル済みの注文が「引当あり」のまま残ることはない。
//! キャンセルされるのは、解放に成功したか、もともと引当がなかった注文だけ。

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::app::SweepError;
use crate::app::error::settle;
use crate::domain::{ExpiryPolicy, OrderPaymentExpiry};
use crate::observability::{Stage, StageReport};
use crate::ports::{Clock, OrderFilter, OrderRepository, ReservationRelease};

pub struct OrderExpirySweep {
    orders: Arc<dyn OrderRepository>,
    release: Arc<dyn ReservationRelease>,
    clock: Arc<dyn Clock>,
    policy: OrderPaymentExpiry,
    batch_size: usize,
}

impl OrderExpirySweep {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        release: Arc<dyn ReservationRelease>,
        clock: Arc<dyn Clock>,
        batch_size: usize,
    ) -> Self {
        Self {
            orders,
            release,
            clock,
            policy: OrderPaymentExpiry,
            batch_size,
        }
    }

    pub async fn run(&self) -> Result<StageReport, SweepError> {
        let started = Instant::now();
        let now = self.clock.now();
        let mut report = StageReport::new(Stage::Orders);

        let orders = self
            .orders
            .search(OrderFilter::pending_payment(self.batch_size))
            .await
            .map_err(|source| SweepError::Query {
                stage: Stage::Orders,
                source,
            })?;
        report.scanned = orders.len();

        for mut order in orders {
            if !self.policy.is_expired(&order, now) {
                continue;
            }
            report.expired += 1;

            if order.has_inventory_reserved() {
                match self.release.release_by_order(order.id).await {
                    Ok(released) => {
                        debug!(stage = %Stage::Orders, order_id = %order.id, released, "released order holds");
                    }
                    Err(e) => {
                        warn!(stage = %Stage::Orders, order_id = %order.id, error = %e, "release failed, order left pending");
                        report.failed += 1;
                        continue;
                    }
                }
            }

            if let Err(e) = self.policy.expire(&mut order, now) {
                warn!(stage = %Stage::Orders, order_id = %order.id, error = %e, "order cannot be cancelled");
                report.failed += 1;
                continue;
            }

            if let Err(e) = self.orders.update(&order).await {
                warn!(stage = %Stage::Orders, order_id = %order.id, error = %e, "failed to persist cancellation");
                report.failed += 1;
                continue;
            }

            debug!(stage = %Stage::Orders, order_id = %order.id, "order cancelled for payment timeout");
            report.succeeded += 1;
        }

        let report = report.finish(started);
        info!(
            stage = %Stage::Orders,
            scanned = report.scanned,
            expired = report.expired,
            cancelled = report.succeeded,
            failed = report.failed,
            elapsed_ms = report.elapsed_ms,
            "order expiry sweep finished"
        );
        settle(report)
    }

    /// Read-only count of expired orders among the first `limit` pending ones.
    pub async fn count_expired(&self, limit: usize) -> Result<usize, SweepError> {
        let now = self.clock.now();
        let orders = self
            .orders
            .search(OrderFilter::pending_payment(limit))
            .await
            .map_err(|source| SweepError::Query {
                stage: Stage::Orders,
                source,
            })?;
        Ok(orders
            .iter()
            .filter(|o| self.policy.is_expired(o, now))
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::World;
    use crate::domain::{OrderStatus, PaymentStatus};
    use chrono::Duration;

    #[tokio::test]
    async fn cancels_expired_order_after_releasing_holds() {
        let world = World::new().await;
        let deadline = world.t0() + Duration::minutes(30);
        let id = world.reserved_order(deadline, deadline).await;
        world.clock.advance(Duration::minutes(31));

        let report = world.order_sweep().run().await.unwrap();

        assert_eq!((report.expired, report.succeeded, report.failed), (1, 1, 0));
        let order = world.orders.get(id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.payment_status, PaymentStatus::Failed);
        assert!(!order.has_inventory_reserved());
        assert_eq!(order.updated_at, world.clock.now());
        assert_eq!(world.inventory.active_holds_for(id).await, 0);
        assert_eq!(world.inventory.stock_level(world.product).await.available, 100);
    }

    #[tokio::test]
    async fn order_without_holds_skips_release() {
        let world = World::new().await;
        let id = world.order(world.t0()).await;

        let report = world.order_sweep().run().await.unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(world.inventory.release_calls().await, 0);
        assert_eq!(world.orders.get(id).await.unwrap().status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn release_failure_leaves_order_untouched_and_retries_next_pass() {
        let world = World::new().await;
        let deadline = world.t0() + Duration::minutes(30);
        let id = world.reserved_order(deadline, deadline).await;
        let before = world.orders.get(id).await.unwrap();
        world.clock.advance(Duration::hours(1));
        world.inventory.fail_release_for(id).await;

        let err = world.order_sweep().run().await.unwrap_err();

        let report = err.report().unwrap();
        assert_eq!((report.expired, report.succeeded, report.failed), (1, 0, 1));
        assert_eq!(world.orders.get(id).await.unwrap(), before);

        world.inventory.heal_release_for(id).await;
        let report = world.order_sweep().run().await.unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(world.orders.get(id).await.unwrap().status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_batch() {
        let world = World::new().await;
        let deadline = world.t0();
        let failing = world.reserved_order(deadline, deadline).await;
        let ok = world.reserved_order(deadline, deadline).await;
        world.orders.fail_update_for(failing).await;

        let err = world.order_sweep().run().await.unwrap_err();

        let report = err.report().unwrap();
        assert_eq!((report.expired, report.succeeded, report.failed), (2, 1, 1));
        assert_eq!(world.orders.get(ok).await.unwrap().status, OrderStatus::Cancelled);

        // holds of the failing order were released, but the row still says
        // pending + reserved, so the next pass converges without double release
        let stuck = world.orders.get(failing).await.unwrap();
        assert_eq!(stuck.status, OrderStatus::Pending);
        assert!(stuck.has_inventory_reserved());
        assert_eq!(world.inventory.stock_level(world.product).await.reserved, 0);

        world.orders.heal_update_for(failing).await;
        world.order_sweep().run().await.unwrap();
        assert_eq!(world.orders.get(failing).await.unwrap().status, OrderStatus::Cancelled);
        assert_eq!(world.inventory.stock_level(world.product).await.available, 100);
    }

    #[tokio::test]
    async fn live_orders_are_never_touched() {
        let world = World::new().await;
        let deadline = world.t0() + Duration::hours(1);
        let id = world.reserved_order(deadline, deadline).await;
        let before = world.orders.get(id).await.unwrap();

        let report = world.order_sweep().run().await.unwrap();

        assert_eq!((report.scanned, report.expired), (1, 0));
        assert_eq!(world.orders.get(id).await.unwrap(), before);
        assert_eq!(world.orders.update_count().await, 0);
        assert_eq!(world.inventory.release_calls().await, 0);
    }

    #[tokio::test]
    async fn batch_is_capped() {
        let mut world = World::new().await;
        world.config.order_batch_size = 2;
        for _ in 0..3 {
            world.order(world.t0()).await;
        }

        let report = world.order_sweep().run().await.unwrap();
        assert_eq!(report.scanned, 2);

        let report = world.order_sweep().run().await.unwrap();
        assert_eq!(report.scanned, 1);

        let leftovers = world
            .orders
            .search(OrderFilter::pending_payment(10))
            .await
            .unwrap();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn query_failure_aborts_stage() {
        let world = World::new().await;
        world.orders.set_search_unavailable(true).await;

        let err = world.order_sweep().run().await.unwrap_err();

        assert!(matches!(err, SweepError::Query { stage: Stage::Orders, .. }));
    }
}
