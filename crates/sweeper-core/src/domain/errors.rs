//! Errors - ドメインエラー
//!
//! エンティティの状態遷移で発生するエラーのみを扱います。
//! I/O 系は `ports::StoreError`、ループ全体の失敗は `app::SweepError` を参照。

use thiserror::Error;

/// DomainError は不正な状態遷移を表現
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// 終端状態、または遷移元として不正な状態からの遷移要求
    #[error("invalid transition for {entity}: {from} -> {to}")]
    InvalidTransition {
        entity: String,
        from: &'static str,
        to: &'static str,
    },
}

impl DomainError {
    pub(crate) fn invalid_transition(
        entity: impl ToString,
        from: &'static str,
        to: &'static str,
    ) -> Self {
        Self::InvalidTransition {
            entity: entity.to_string(),
            from,
            to,
        }
    }
}
