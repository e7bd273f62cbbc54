//! Scheduler - 掃除パスを一定間隔で起動するバックグラウンドタスク
//!
//! # フロー
//! 1. 起動直後に 1 パス実行し、以降は interval ごとに実行
//! 2. 遅れた tick はまとめて消化しない（Delay）
//! 3. パスが失敗してもループは止めない（ログに残して次の tick を待つ）
//! 4. shutdown が来たら新しいパスは始めない。実行中のパスは最後まで走らせる
//!
//! # 使い方
//! - `run_scheduler`: 受信側を渡して await するだけのエントリポイント
//! - `CleanupScheduler::spawn`: tokio タスクとして起動し、SchedulerHandle を返す

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::app::{CleanupOrchestrator, SweepError};
use crate::observability::CleanupRun;

const MIN_INTERVAL: Duration = Duration::from_millis(10);

/// One scheduled unit of work.
#[async_trait]
pub trait CleanupPass: Send + Sync {
    async fn run_pass(&self) -> Result<CleanupRun, SweepError>;
}

#[async_trait]
impl CleanupPass for CleanupOrchestrator {
    async fn run_pass(&self) -> Result<CleanupRun, SweepError> {
        self.run_cleanup().await
    }
}

/// Progress published by the loop after every pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStatus {
    pub passes: u64,
    pub failed_passes: u64,

    /// Report of the most recent pass (also kept for failed passes).
    pub last_run: Option<CleanupRun>,
}

/// Runs passes until `shutdown` flips to true or its sender is dropped.
pub async fn run_scheduler(
    pass: Arc<dyn CleanupPass>,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
) {
    let (status_tx, _status_rx) = watch::channel(SchedulerStatus::default());
    scheduler_loop(pass, interval, shutdown, status_tx).await;
}

async fn scheduler_loop(
    pass: Arc<dyn CleanupPass>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
    status: watch::Sender<SchedulerStatus>,
) {
    let interval = interval.max(MIN_INTERVAL);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(
        interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
        "cleanup scheduler started"
    );

    loop {
        if *shutdown.borrow() {
            break;
        }

        // パスの実行中は select の外にいるので、shutdown で中断されない
        tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            _ = ticker.tick() => {}
        }

        let result = pass.run_pass().await;
        status.send_modify(|s| {
            s.passes += 1;
            match result {
                Ok(run) => {
                    debug!(passes = s.passes, "scheduled cleanup pass succeeded");
                    s.last_run = Some(run);
                }
                Err(e) => {
                    s.failed_passes += 1;
                    error!(passes = s.passes, failed_passes = s.failed_passes, error = %e, "scheduled cleanup pass failed");
                    if let Some(run) = e.run() {
                        s.last_run = Some(run.clone());
                    }
                }
            }
        });
    }

    info!("cleanup scheduler stopped");
}

/// Entry point that spawns the loop as a tokio task.
pub struct CleanupScheduler;

impl CleanupScheduler {
    pub fn spawn(pass: Arc<dyn CleanupPass>, interval: Duration) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (status_tx, status_rx) = watch::channel(SchedulerStatus::default());

        let join = tokio::spawn(scheduler_loop(pass, interval, shutdown_rx, status_tx));

        SchedulerHandle {
            shutdown_tx,
            status_rx,
            join,
        }
    }
}

/// Scheduler handle.
/// - `request_shutdown()` で新しいパスの開始を止める
/// - `shutdown_and_join()` で実行中のパスの完了まで待つ
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    status_rx: watch::Receiver<SchedulerStatus>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn request_shutdown(&self) {
        // ignore send error: the loop may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    pub fn status(&self) -> SchedulerStatus {
        self.status_rx.borrow().clone()
    }

    /// Receiver that is notified after every pass.
    pub fn subscribe(&self) -> watch::Receiver<SchedulerStatus> {
        self.status_rx.clone()
    }

    pub async fn shutdown_and_join(self) -> SchedulerStatus {
        self.request_shutdown();
        let _ = self.join.await;
        self.status_rx.borrow().clone()
    }
}
