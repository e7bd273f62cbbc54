//! StoreError - 外部ストア（リポジトリ・在庫解放）の失敗
//!
//! どのリポジトリ実装（PostgreSQL、InMemory など）もこの型に変換して返します。

use thiserror::Error;

/// Failure reported by a repository or by the reservation-release capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Backend could not be reached or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Concurrent modification (row lock / version check lost).
    #[error("conflict: {0}")]
    Conflict(String),
}
