//! Observability - 1 回の掃除パスの構造化レポート
//!
//! ログに頼らずに結果を判断できるよう、各ステージの件数を値として返します。
//! - **StageReport**: 1 ステージ分の件数と所要時間
//! - **CleanupRun**: 1 パス分（4 ステージ）の結果。保存はせず、報告後に捨てる
//! - **CleanupStats**: 読み取り専用の「いま期限切れの件数」

use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sweep stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Reservations,
    Orders,
    Carts,
    Payments,
}

impl Stage {
    /// Fixed order of one cleanup pass.
    pub const ALL: [Stage; 4] = [
        Stage::Reservations,
        Stage::Orders,
        Stage::Carts,
        Stage::Payments,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Reservations => "reservations",
            Stage::Orders => "orders",
            Stage::Carts => "carts",
            Stage::Payments => "payments",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: Stage,

    /// Items returned by the stage's query.
    pub scanned: usize,

    /// Items the expiry policy confirmed as expired.
    pub expired: usize,

    /// Items moved to their terminal state (or released holds).
    pub succeeded: usize,

    /// Items skipped because release or persistence failed.
    pub failed: usize,

    /// Payment sweep only: cancelled orders whose hold release failed and is
    /// left to the reservation sweep.
    pub deferred: usize,

    pub elapsed_ms: u64,
}

impl StageReport {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            scanned: 0,
            expired: 0,
            succeeded: 0,
            failed: 0,
            deferred: 0,
            elapsed_ms: 0,
        }
    }

    pub(crate) fn finish(mut self, started: Instant) -> Self {
        self.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self
    }
}

/// Result of one stage inside a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOutcome {
    pub report: StageReport,

    /// Rendered error when the stage failed.
    pub error: Option<String>,
}

impl StageOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Sum of all stage counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTotals {
    pub scanned: usize,
    pub expired: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub deferred: usize,
}

/// One orchestrator pass (ephemeral, never persisted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupRun {
    pub started_at: DateTime<Utc>,
    pub stages: Vec<StageOutcome>,
    pub elapsed_ms: u64,
}

impl CleanupRun {
    pub fn has_errors(&self) -> bool {
        self.stages.iter().any(|s| !s.is_ok())
    }

    pub fn failed_stages(&self) -> Vec<Stage> {
        self.stages
            .iter()
            .filter(|s| !s.is_ok())
            .map(|s| s.report.stage)
            .collect()
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageOutcome> {
        self.stages.iter().find(|s| s.report.stage == stage)
    }

    pub fn totals(&self) -> RunTotals {
        self.stages
            .iter()
            .fold(RunTotals::default(), |mut totals, s| {
                totals.scanned += s.report.scanned;
                totals.expired += s.report.expired;
                totals.succeeded += s.report.succeeded;
                totals.failed += s.report.failed;
                totals.deferred += s.report.deferred;
                totals
            })
    }
}

/// Read-only snapshot of how much is currently expired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupStats {
    pub expired_reservations: usize,
    pub expired_carts: usize,
    pub expired_orders: usize,
}

impl CleanupStats {
    /// Key → count view.
    pub fn as_map(&self) -> BTreeMap<&'static str, usize> {
        BTreeMap::from([
            ("expired_reservations", self.expired_reservations),
            ("expired_carts", self.expired_carts),
            ("expired_orders", self.expired_orders),
        ])
    }
}
