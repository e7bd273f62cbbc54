//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! Sweeper は注文・カート・在庫引当の正本を持たず、
//! ここで定義する trait 越しにスナップショットを読み書きするだけです。
//!
//! # 設計原則
//! - 各リポジトリの更新は 1 行単位でアトミック
//! - エンティティ横断のトランザクションは存在しない
//! - 在庫解放は冪等

pub mod clock;
pub mod id_generator;
pub mod store_error;
pub mod order_store;
pub mod cart_store;
pub mod reservation_store;

// 主要な trait を再エクスポート
pub use self::cart_store::CartRepository;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::order_store::{OrderFilter, OrderRepository};
pub use self::reservation_store::{ReservationRelease, ReservationRepository};
pub use self::store_error::StoreError;
