//! State - 注文・支払い・カート・在庫引当の状態
//!
//! すべて閉じた enum で表現し、ポリシー判定は exhaustive match で行います。
//! 文字列ステータスの組み合わせミスはコンパイル時に弾かれます。
//!
//! # 状態遷移（期限切れ回収に関係する部分のみ）
//! - Order: pending → cancelled（payment: pending → failed を同時に）
//! - Cart: active → abandoned
//! - StockReservation: active → released
//!
//! いずれも一方向で、終端状態から戻ることはありません。

use serde::{Deserialize, Serialize};

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed, waiting for payment.
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Is this a terminal state (no further transitions by the sweeper)?
    ///
    /// `Shipped` counts as terminal here: goods have left the warehouse, so
    /// cancelling for an unpaid invoice is no longer this engine's call.
    pub fn is_terminal(self) -> bool {
        match self {
            OrderStatus::Pending | OrderStatus::Confirmed | OrderStatus::Processing => false,
            OrderStatus::Shipped | OrderStatus::Completed | OrderStatus::Cancelled => true,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

/// Payment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

/// Cart lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartStatus {
    Active,
    Abandoned,
    CheckedOut,
}

impl CartStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, CartStatus::Active)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CartStatus::Active => "active",
            CartStatus::Abandoned => "abandoned",
            CartStatus::CheckedOut => "checked_out",
        }
    }
}

/// Stock reservation lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// Quantity is held (counted as reserved, not available).
    Active,
    /// Hold returned to available stock.
    Released,
    /// Hold turned into a sale (order paid).
    Consumed,
}

impl ReservationStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ReservationStatus::Active)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReservationStatus::Active => "active",
            ReservationStatus::Released => "released",
            ReservationStatus::Consumed => "consumed",
        }
    }
}
