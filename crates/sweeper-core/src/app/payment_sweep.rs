//! PaymentTimeoutSweep - 支払いタイムアウト注文のキャンセル（キャンセル → 解放の順）
//!
//! # フロー
//! 1. payment = pending の注文を（status を問わず）バッチ上限まで取得
//! 2. PaymentTimeoutExpiry で期限切れを判定（終端状態の注文は対象外）
//! 3. 先にキャンセル（cancelled / failed）を保存
//!    - 保存に失敗したらスキップ
//! 4. その後で release_by_order を試行
//!    - 失敗してもキャンセルは巻き戻さない。ログに残して `deferred` に数える
//!
//! # OrderExpirySweep との違い
//! こちらは「キャンセル済みだが引当が残っている」状態を許容します。
//! 残った引当は自分の expires_at を過ぎた時点で ReservationSweep が回収します。
//! 2 つの順序は別々の障害回復方針なので、1 つの関数にまとめないこと。

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::app::SweepError;
use crate::app::error::settle;
use crate::domain::{ExpiryPolicy, PaymentTimeoutExpiry};
use crate::observability::{Stage, StageReport};
use crate::ports::{Clock, OrderFilter, OrderRepository, ReservationRelease};

pub struct PaymentTimeoutSweep {
    orders: Arc<dyn OrderRepository>,
    release: Arc<dyn ReservationRelease>,
    clock: Arc<dyn Clock>,
    policy: PaymentTimeoutExpiry,
    batch_size: usize,
}

impl PaymentTimeoutSweep {
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
            policy: PaymentTimeoutExpiry,
            batch_size,
        }
    }

    pub async fn run(&self) -> Result<StageReport, SweepError> {
        let started = Instant::now();
        let now = self.clock.now();
        let mut report = StageReport::new(Stage::Payments);

        let orders = self
            .orders
            .search(OrderFilter::payment_pending_any_status(self.batch_size))
            .await
            .map_err(|source| SweepError::Query {
                stage: Stage::Payments,
                source,
            })?;
        report.scanned = orders.len();

        for mut order in orders {
            if !self.policy.is_expired(&order, now) {
                continue;
            }
            report.expired += 1;
            let had_holds = order.has_inventory_reserved();

            if let Err(e) = self.policy.expire(&mut order, now) {
                warn!(stage = %Stage::Payments, order_id = %order.id, error = %e, "order cannot be cancelled");
                report.failed += 1;
                continue;
            }
            if let Err(e) = self.orders.update(&order).await {
                warn!(stage = %Stage::Payments, order_id = %order.id, error = %e, "failed to persist payment timeout");
                report.failed += 1;
                continue;
            }
            report.succeeded += 1;

            if !had_holds {
                debug!(stage = %Stage::Payments, order_id = %order.id, "order cancelled, no holds");
                continue;
            }
            match self.release.release_by_order(order.id).await {
                Ok(released) => {
                    debug!(stage = %Stage::Payments, order_id = %order.id, released, "order cancelled and holds released");
                }
                Err(e) => {
                    // reservation sweep picks the holds up once they expire
                    warn!(stage = %Stage::Payments, order_id = %order.id, error = %e, "release failed after cancellation, deferred");
                    report.deferred += 1;
                }
            }
        }

        let report = report.finish(started);
        info!(
            stage = %Stage::Payments,
            scanned = report.scanned,
            expired = report.expired,
            cancelled = report.succeeded,
            failed = report.failed,
            deferred = report.deferred,
            elapsed_ms = report.elapsed_ms,
            "payment timeout sweep finished"
        );
        settle(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderStatus, PaymentStatus};
    use crate::app::testing::World;
    use chrono::Duration;

    #[tokio::test]
    async fn cancels_confirmed_but_unpaid_order() {
        let world = World::new().await;
        let deadline = world.t0() + Duration::minutes(10);
        let id = world.reserved_order(deadline, deadline).await;
        let mut order = world.orders.get(id).await.unwrap();
        order.status = OrderStatus::Confirmed;
        world.orders.update(&order).await.unwrap();
        world.clock.advance(Duration::minutes(10));

        let report = world.payment_sweep().run().await.unwrap();

        assert_eq!((report.expired, report.succeeded, report.deferred), (1, 1, 0));
        let order = world.orders.get(id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.payment_status, PaymentStatus::Failed);
        assert_eq!(world.inventory.active_holds_for(id).await, 0);
    }

    #[tokio::test]
    async fn release_failure_keeps_cancellation_and_defers_hold() {
        let world = World::new().await;
        let deadline = world.t0() + Duration::minutes(10);
        let hold_expiry = world.t0() + Duration::minutes(45);
        let id = world.reserved_order(deadline, hold_expiry).await;
        world.inventory.fail_release_for(id).await;
        world.clock.advance(Duration::minutes(15));

        let report = world.payment_sweep().run().await.unwrap();

        assert_eq!((report.succeeded, report.failed, report.deferred), (1, 0, 1));
        let order = world.orders.get(id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.payment_status, PaymentStatus::Failed);
        assert_eq!(world.inventory.active_holds_for(id).await, 1);

        // later, the hold's own expiry lets the reservation sweep release it
        world.clock.advance(Duration::minutes(30));
        let released = world.reservation_sweep().run().await.unwrap();
        assert_eq!(released.succeeded, 1);
        assert_eq!(world.inventory.active_holds_for(id).await, 0);
        assert_eq!(world.inventory.stock_level(world.product).await.available, 100);
    }

    #[tokio::test]
    async fn persistence_failure_skips_release() {
        let world = World::new().await;
        let id = world.reserved_order(world.t0(), world.t0()).await;
        world.orders.fail_update_for(id).await;

        let err = world.payment_sweep().run().await.unwrap_err();

        let report = err.report().unwrap();
        assert_eq!((report.expired, report.succeeded, report.failed), (1, 0, 1));
        assert_eq!(world.inventory.release_calls().await, 0);
        assert_eq!(world.orders.get(id).await.unwrap().status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn shipped_order_with_pending_payment_is_left_alone() {
        let world = World::new().await;
        let id = world.order(world.t0()).await;
        let mut order = world.orders.get(id).await.unwrap();
        order.status = OrderStatus::Shipped;
        world.orders.update(&order).await.unwrap();

        let report = world.payment_sweep().run().await.unwrap();

        assert_eq!((report.scanned, report.expired), (1, 0));
        assert_eq!(world.orders.get(id).await.unwrap().status, OrderStatus::Shipped);
    }

    #[tokio::test]
    async fn live_payment_is_left_alone() {
        let world = World::new().await;
        let deadline = world.t0() + Duration::minutes(30);
        let id = world.reserved_order(deadline, deadline).await;
        let before = world.orders.get(id).await.unwrap();
        world.clock.advance(Duration::minutes(29));

        let report = world.payment_sweep().run().await.unwrap();

        assert_eq!((report.scanned, report.expired, report.succeeded), (1, 0, 0));
        assert_eq!(world.orders.get(id).await.unwrap(), before);
        assert_eq!(world.orders.update_count().await, 0);
        assert_eq!(world.inventory.release_calls().await, 0);
        assert_eq!(world.inventory.active_holds_for(id).await, 1);
    }

    #[tokio::test]
    async fn payment_batch_is_larger_than_order_batch() {
        let world = World::new().await;
        for _ in 0..(world.config.order_batch_size + 5) {
            world.order(world.t0()).await;
        }

        let report = world.payment_sweep().run().await.unwrap();

        assert_eq!(report.succeeded, world.config.order_batch_size + 5);
    }
}
