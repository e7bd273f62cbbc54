//! CartSweep - 放置カートの abandoned 化
//!
//! # フロー
//! 1. CartRepository::list_expired(now - idle_timeout) で放置カートを取得
//! 2. CartIdleExpiry で再判定（ストアの返却を鵜呑みにしない）
//! 3. abandoned に遷移して update。失敗した 1 件はスキップして続行
//!
//! カートは在庫を引き当てないので解放ステップはありません。
//! abandoned になったカートは次回の検索に出てこないため、2 回目は何もしません。

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::app::SweepError;
use crate::app::error::settle;
use crate::domain::{CartIdleExpiry, ExpiryPolicy};
use crate::observability::{Stage, StageReport};
use crate::ports::{CartRepository, Clock};

pub struct CartSweep {
    carts: Arc<dyn CartRepository>,
    clock: Arc<dyn Clock>,
    policy: CartIdleExpiry,
}

impl CartSweep {
    pub fn new(carts: Arc<dyn CartRepository>, clock: Arc<dyn Clock>, policy: CartIdleExpiry) -> Self {
        Self {
            carts,
            clock,
            policy,
        }
    }

    pub async fn run(&self) -> Result<StageReport, SweepError> {
        let started = Instant::now();
        let now = self.clock.now();
        let mut report = StageReport::new(Stage::Carts);

        let carts = self
            .carts
            .list_expired(self.policy.cutoff(now))
            .await
            .map_err(|source| SweepError::Query {
                stage: Stage::Carts,
                source,
            })?;
        report.scanned = carts.len();

        for mut cart in carts {
            if !self.policy.is_expired(&cart, now) {
                continue;
            }
            report.expired += 1;

            if let Err(e) = self.policy.expire(&mut cart, now) {
                warn!(stage = %Stage::Carts, cart_id = %cart.id, error = %e, "cart cannot be abandoned");
                report.failed += 1;
                continue;
            }
            if let Err(e) = self.carts.update(&cart).await {
                warn!(stage = %Stage::Carts, cart_id = %cart.id, error = %e, "failed to persist abandoned cart");
                report.failed += 1;
                continue;
            }

            debug!(stage = %Stage::Carts, cart_id = %cart.id, "cart abandoned");
            report.succeeded += 1;
        }

        let report = report.finish(started);
        info!(
            stage = %Stage::Carts,
            expired = report.expired,
            abandoned = report.succeeded,
            failed = report.failed,
            elapsed_ms = report.elapsed_ms,
            "cart sweep finished"
        );
        settle(report)
    }

    pub async fn count_expired(&self) -> Result<usize, SweepError> {
        let now = self.clock.now();
        let carts = self
            .carts
            .list_expired(self.policy.cutoff(now))
            .await
            .map_err(|source| SweepError::Query {
                stage: Stage::Carts,
                source,
            })?;
        Ok(carts
            .iter()
            .filter(|c| self.policy.is_expired(c, now))
            .count())
    }
}
