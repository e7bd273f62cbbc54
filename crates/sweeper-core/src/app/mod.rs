//! App - アプリケーション層
//!
//! ports を組み合わせて期限切れデータの掃除を実装します。
//!
//! # 主要コンポーネント
//! - **AppBuilder**: ports と設定から CleanupOrchestrator を組み立てる
//! - **ReservationSweep**: 期限切れ在庫引当の一括解放
//! - **OrderExpirySweep**: 支払い期限切れ注文のキャンセル（解放 → キャンセル）
//! - **CartSweep**: 放置カートの abandoned 化
//! - **PaymentTimeoutSweep**: 支払いタイムアウトのキャンセル（キャンセル → 解放）
//! - **CleanupOrchestrator**: 4 ステージを固定順で 1 パス実行
//! - **Scheduler**: パスを一定間隔で起動するバックグラウンドタスク

pub mod builder;
pub mod cart_sweep;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod order_sweep;
pub mod payment_sweep;
pub mod reservation_sweep;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

// 主要な型を再エクスポート
pub use self::builder::{AppBuilder, BuildError};
pub use self::cart_sweep::CartSweep;
pub use self::config::{CleanupConfig, ConfigError};
pub use self::error::SweepError;
pub use self::orchestrator::CleanupOrchestrator;
pub use self::order_sweep::OrderExpirySweep;
pub use self::payment_sweep::PaymentTimeoutSweep;
pub use self::reservation_sweep::ReservationSweep;
pub use self::scheduler::{
    run_scheduler, CleanupPass, CleanupScheduler, SchedulerHandle, SchedulerStatus,
};
