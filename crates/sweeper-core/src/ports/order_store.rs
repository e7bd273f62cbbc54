//! OrderRepository port - 注文の正本
//!
//! 注文の行は OrderRepository が排他的に所有します。
//! Sweeper はスナップショットを取得し、変更後に `update` で書き戻すだけです。

use async_trait::async_trait;

use crate::domain::{Order, OrderStatus, PaymentStatus};
use crate::ports::StoreError;

/// Query for `OrderRepository::search`.
///
/// `None` means "any value" for that field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub limit: usize,
}

impl OrderFilter {
    /// `status = pending AND payment_status = pending`
    pub fn pending_payment(limit: usize) -> Self {
        Self {
            status: Some(OrderStatus::Pending),
            payment_status: Some(PaymentStatus::Pending),
            limit,
        }
    }

    /// `payment_status = pending` (any order status)
    pub fn payment_pending_any_status(limit: usize) -> Self {
        Self {
            status: None,
            payment_status: Some(PaymentStatus::Pending),
            limit,
        }
    }

    pub fn matches(&self, order: &Order) -> bool {
        self.status.is_none_or(|s| s == order.status)
            && self.payment_status.is_none_or(|p| p == order.payment_status)
    }
}

/// OrderRepository は注文の検索と更新を提供
///
/// # 設計原則
/// - `update` は 1 行単位でアトミック（エンティティ横断のトランザクションはない）
/// - `search` の返却順はストアに任せる（Sweeper はその順に処理する）
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn search(&self, filter: OrderFilter) -> Result<Vec<Order>, StoreError>;

    async fn update(&self, order: &Order) -> Result<(), StoreError>;
}
