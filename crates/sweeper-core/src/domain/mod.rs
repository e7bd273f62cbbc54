//! Domain model (IDs, entities, states, expiry policies).
//!
//! - **ids**: ULID ベースの型付き ID
//! - **state**: 注文・支払い・カート・在庫引当の状態 enum
//! - **order / cart / reservation**: リポジトリから取得するスナップショット
//! - **policy**: 期限切れ判定と終端遷移（純粋関数）
//! - **errors**: 不正な状態遷移

pub mod ids;
pub mod state;
pub mod errors;
pub mod order;
pub mod cart;
pub mod reservation;
pub mod policy;

pub use self::cart::Cart;
pub use self::errors::DomainError;
pub use self::ids::{CartId, Id, IdMarker, OrderId, ProductId, ReservationId};
pub use self::order::Order;
pub use self::policy::{
    CartIdleExpiry, ExpiryPolicy, OrderPaymentExpiry, PaymentTimeoutExpiry, ReservationExpiry,
};
pub use self::reservation::StockReservation;
pub use self::state::{CartStatus, OrderStatus, PaymentStatus, ReservationStatus};
