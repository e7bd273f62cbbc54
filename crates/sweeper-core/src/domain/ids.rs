//! Domain identifiers (strongly-typed IDs).
//!
//! 注文・カート・在庫引当・商品の ID はすべて ULID ベースです。
//! Phantom type パターンで共通実装を 1 つにまとめつつ、
//! `OrderId` と `ReservationId` のような取り違えをコンパイル時に防ぎます。
//!
//! ## ULID の特性
//! - **時刻でソート可能**: 生成順に並ぶ（リポジトリの返却順のデバッグに便利）
//! - **分散生成可能**: 調整なしで複数ノードで生成できる

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"order-", "cart-" など）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
///
/// `T` は PhantomData なので実行時のサイズは Ulid と同じです。
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    /// 現在時刻ベースの新しい ID（テストや簡易用途向け）
    ///
    /// 時刻を制御したい場合は `IdGenerator` を使ってください。
    pub fn random() -> Self {
        Self::from_ulid(Ulid::new())
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// Order のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Order {}

impl IdMarker for Order {
    fn prefix() -> &'static str {
        "order-"
    }
}

/// Cart のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Cart {}

impl IdMarker for Cart {
    fn prefix() -> &'static str {
        "cart-"
    }
}

/// StockReservation のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Reservation {}

impl IdMarker for Reservation {
    fn prefix() -> &'static str {
        "rsv-"
    }
}

/// Product (SKU) のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Product {}

impl IdMarker for Product {
    fn prefix() -> &'static str {
        "sku-"
    }
}

// ========================================
// Type Alias
// ========================================

/// Identifier of an Order.
pub type OrderId = Id<Order>;

/// Identifier of a shopping Cart.
pub type CartId = Id<Cart>;

/// Identifier of a StockReservation (one product/quantity hold).
pub type ReservationId = Id<Reservation>;

/// Identifier of a Product whose stock is being held.
pub type ProductId = Id<Product>;
