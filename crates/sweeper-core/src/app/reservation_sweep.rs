//! ReservationSweep - 期限切れ在庫引当の解放
//!
//! # フロー
//! 1. ReservationRepository::list_expired(now) で期限切れを取得
//! 2. 0 件なら副作用なしで終了
//! 3. ReservationRelease::release_expired(now) で一括解放（解放側が冪等性と原子性を持つ）
//! 4. 解放の失敗はそのまま返す（一覧の件数は SweepError::Release のレポートに残す）
//!
//! 一覧と解放は別々のスキャンです。並行して期限切れが増えた場合、
//! `expired`（一覧の件数）と `succeeded`（実際に解放した件数）はずれることがあります。
//! ずれた分は次のパスで必ず回収されます。

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::app::SweepError;
use crate::domain::{ExpiryPolicy, ReservationExpiry};
use crate::observability::{Stage, StageReport};
use crate::ports::{Clock, ReservationRelease, ReservationRepository};

pub struct ReservationSweep {
    reservations: Arc<dyn ReservationRepository>,
    release: Arc<dyn ReservationRelease>,
    clock: Arc<dyn Clock>,
    policy: ReservationExpiry,
}

impl ReservationSweep {
    pub fn new(
        reservations: Arc<dyn ReservationRepository>,
        release: Arc<dyn ReservationRelease>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            reservations,
            release,
            clock,
            policy: ReservationExpiry,
        }
    }

    /// Release every expired stock hold.
    pub async fn run(&self) -> Result<StageReport, SweepError> {
        let started = Instant::now();
        let now = self.clock.now();
        let mut report = StageReport::new(Stage::Reservations);

        let expired = self
            .reservations
            .list_expired(now)
            .await
            .map_err(|source| SweepError::Query {
                stage: Stage::Reservations,
                source,
            })?;
        report.scanned = expired.len();
        report.expired = expired
            .iter()
            .filter(|r| self.policy.is_expired(r, now))
            .count();

        if report.expired == 0 {
            debug!(stage = %Stage::Reservations, "no expired reservations");
            return Ok(report.finish(started));
        }

        let released = match self.release.release_expired(now).await {
            Ok(released) => released,
            Err(source) => {
                // 一括解放は原子的なので、失敗時は 1 件も解放されていない
                report.failed = report.expired;
                return Err(SweepError::Release {
                    stage: Stage::Reservations,
                    source,
                    report: report.finish(started),
                });
            }
        };
        report.succeeded = released;

        let report = report.finish(started);
        info!(
            stage = %Stage::Reservations,
            expired = report.expired,
            released = report.succeeded,
            elapsed_ms = report.elapsed_ms,
            "released expired reservations"
        );
        Ok(report)
    }

    /// Read-only count of holds that are expired right now.
    pub async fn count_expired(&self) -> Result<usize, SweepError> {
        let now = self.clock.now();
        let expired = self
            .reservations
            .list_expired(now)
            .await
            .map_err(|source| SweepError::Query {
                stage: Stage::Reservations,
                source,
            })?;
        Ok(expired
            .iter()
            .filter(|r| self.policy.is_expired(r, now))
            .count())
    }
}
