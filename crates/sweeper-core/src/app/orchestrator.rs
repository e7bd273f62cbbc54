//! CleanupOrchestrator - 4 つの掃除ステージを固定順で 1 パス実行する
//!
//! # フロー（run_cleanup）
//! 1. reservations → orders → carts → payments の順に実行
//! 2. あるステージが失敗しても、残りのステージは必ず実行する
//! 3. 各ステージの結果を CleanupRun にまとめる
//! 4. 1 つでも失敗があれば `CompletedWithErrors`（レポート付き）を返す
//!
//! 個別のステージも単独で呼べます（`cleanup_expired_*`）。
//! `cleanup_stats` は読み取り専用で、何も変更しません。

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};

use crate::app::{CartSweep, OrderExpirySweep, PaymentTimeoutSweep, ReservationSweep, SweepError};
use crate::observability::{CleanupRun, CleanupStats, Stage, StageOutcome, StageReport};
use crate::ports::Clock;

pub struct CleanupOrchestrator {
    reservations: ReservationSweep,
    orders: OrderExpirySweep,
    carts: CartSweep,
    payments: PaymentTimeoutSweep,
    clock: Arc<dyn Clock>,
    stats_scan_limit: usize,
}

impl CleanupOrchestrator {
    pub fn new(
        reservations: ReservationSweep,
        orders: OrderExpirySweep,
        carts: CartSweep,
        payments: PaymentTimeoutSweep,
        clock: Arc<dyn Clock>,
        stats_scan_limit: usize,
    ) -> Self {
        Self {
            reservations,
            orders,
            carts,
            payments,
            clock,
            stats_scan_limit,
        }
    }

    pub async fn cleanup_expired_reservations(&self) -> Result<StageReport, SweepError> {
        self.reservations.run().await
    }

    pub async fn cleanup_expired_orders(&self) -> Result<StageReport, SweepError> {
        self.orders.run().await
    }

    pub async fn cleanup_expired_carts(&self) -> Result<StageReport, SweepError> {
        self.carts.run().await
    }

    pub async fn cleanup_expired_payments(&self) -> Result<StageReport, SweepError> {
        self.payments.run().await
    }

    async fn run_stage(&self, stage: Stage) -> Result<StageReport, SweepError> {
        match stage {
            Stage::Reservations => self.cleanup_expired_reservations().await,
            Stage::Orders => self.cleanup_expired_orders().await,
            Stage::Carts => self.cleanup_expired_carts().await,
            Stage::Payments => self.cleanup_expired_payments().await,
        }
    }

    /// One full pass over every stage.
    pub async fn run_cleanup(&self) -> Result<CleanupRun, SweepError> {
        let started = Instant::now();
        let started_at = self.clock.now();
        let mut stages = Vec::with_capacity(Stage::ALL.len());

        for stage in Stage::ALL {
            let outcome = match self.run_stage(stage).await {
                Ok(report) => StageOutcome {
                    report,
                    error: None,
                },
                Err(e) => {
                    error!(stage = %stage, error = %e, "cleanup stage failed");
                    StageOutcome {
                        report: e.report().cloned().unwrap_or_else(|| StageReport::new(stage)),
                        error: Some(e.to_string()),
                    }
                }
            };
            stages.push(outcome);
        }

        let run = CleanupRun {
            started_at,
            stages,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        let totals = run.totals();

        if run.has_errors() {
            warn!(
                failed_stages = ?run.failed_stages(),
                succeeded = totals.succeeded,
                failed = totals.failed,
                elapsed_ms = run.elapsed_ms,
                "cleanup pass completed with errors"
            );
            return Err(SweepError::CompletedWithErrors { run: Box::new(run) });
        }

        info!(
            expired = totals.expired,
            succeeded = totals.succeeded,
            deferred = totals.deferred,
            elapsed_ms = run.elapsed_ms,
            "cleanup pass completed"
        );
        Ok(run)
    }

    /// Read-only snapshot of what is currently expired.
    pub async fn cleanup_stats(&self) -> Result<CleanupStats, SweepError> {
        Ok(CleanupStats {
            expired_reservations: self.reservations.count_expired().await?,
            expired_carts: self.carts.count_expired().await?,
            expired_orders: self.orders.count_expired(self.stats_scan_limit).await?,
        })
    }
}
