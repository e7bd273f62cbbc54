//! SweepError - 掃除ステージ / パスの失敗
//!
//! # 分類
//! - Query: 読み取り失敗。そのステージだけを中断する
//! - Release: 予約ステージの一括解放失敗（解放側のエラーと、そこまでの件数を保持）
//! - ItemFailures: バッチは最後まで処理したが、1 件以上スキップした
//! - CompletedWithErrors: パス全体で 1 ステージ以上が失敗した（レポート付き）

use thiserror::Error;

use crate::observability::{CleanupRun, Stage, StageReport};
use crate::ports::StoreError;

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("{stage}: query failed: {source}")]
    Query {
        stage: Stage,
        #[source]
        source: StoreError,
    },

    #[error("{stage}: release failed: {source}")]
    Release {
        stage: Stage,
        #[source]
        source: StoreError,
        report: StageReport,
    },

    #[error("{}", describe_item_failures(.report))]
    ItemFailures { report: StageReport },

    #[error("cleanup completed with errors in {:?}", failed_stages(.run))]
    CompletedWithErrors { run: Box<CleanupRun> },
}

impl SweepError {
    /// Stage the error belongs to (`None` for a whole-pass error).
    pub fn stage(&self) -> Option<Stage> {
        match self {
            SweepError::Query { stage, .. } | SweepError::Release { stage, .. } => Some(*stage),
            SweepError::ItemFailures { report } => Some(report.stage),
            SweepError::CompletedWithErrors { .. } => None,
        }
    }

    /// Partial counters carried by the error, if the stage got that far.
    pub fn report(&self) -> Option<&StageReport> {
        match self {
            SweepError::ItemFailures { report } | SweepError::Release { report, .. } => Some(report),
            _ => None,
        }
    }

    /// Full pass report carried by a whole-pass error.
    pub fn run(&self) -> Option<&CleanupRun> {
        match self {
            SweepError::CompletedWithErrors { run } => Some(run),
            _ => None,
        }
    }
}

fn describe_item_failures(report: &StageReport) -> String {
    format!(
        "{}: {} of {} expired items failed",
        report.stage, report.failed, report.expired
    )
}

fn failed_stages(run: &CleanupRun) -> Vec<Stage> {
    run.failed_stages()
}

/// Ok when nothing was skipped, `ItemFailures` otherwise.
pub(crate) fn settle(report: StageReport) -> Result<StageReport, SweepError> {
    if report.failed > 0 {
        Err(SweepError::ItemFailures { report })
    } else {
        Ok(report)
    }
}
