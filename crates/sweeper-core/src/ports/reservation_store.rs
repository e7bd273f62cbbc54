//! Reservation ports - 在庫引当の参照と解放
//!
//! - **ReservationRepository**: 期限切れ引当の検索（expires_at でインデックスされている前提）
//! - **ReservationRelease**: 引当の解放（reserved → available の移動）
//!
//! 解放の内部アルゴリズムはこのクレートの責務外です。
//! 解放は冪等であることを要求します：解放済みの引当は黙ってスキップされ、エラーにはなりません。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{OrderId, StockReservation};
use crate::ports::StoreError;

/// ReservationRepository は期限切れの引当を返す
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Active holds with `expires_at <= now`.
    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<StockReservation>, StoreError>;
}

/// ReservationRelease は引当を解放して在庫を戻す
///
/// 戻り値は「今回の呼び出しで実際に解放した件数」。
/// 二重解放はカウンタを二重に減らしてはならない（0 件として扱う）。
#[async_trait]
pub trait ReservationRelease: Send + Sync {
    /// Release every active hold that expired at or before `as_of`.
    async fn release_expired(&self, as_of: DateTime<Utc>) -> Result<usize, StoreError>;

    /// Release every active hold belonging to `order_id`, expired or not.
    async fn release_by_order(&self, order_id: OrderId) -> Result<usize, StoreError>;
}
