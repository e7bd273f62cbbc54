//! Impls - 実装（開発用・テスト用）
//!
//! このモジュールには ports の InMemory 実装を含めます。
//!
//! # 含まれる実装
//! - **InMemoryInventory**: 在庫引当の参照と解放
//! - **InMemoryOrderRepository**: 注文
//! - **InMemoryCartRepository**: カート
//!
//! # 本番用実装
//! 本番用のリポジトリ（PostgreSQL など）はこのクレートの外に置きます。

pub mod inmem_inventory;
pub mod inmem_orders;

// 主要な型を再エクスポート
pub use self::inmem_inventory::{InMemoryInventory, StockLevel};
pub use self::inmem_orders::{InMemoryCartRepository, InMemoryOrderRepository};
