//! sweeper-core
//!
//! Background reconciliation of expired commerce data: stock reservations,
//! unpaid orders, idle carts and payment timeouts.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, state, order, cart, reservation, policy, errors）
//! - **ports**: 抽象化レイヤー（Clock, IdGenerator, OrderRepository, CartRepository, ReservationRelease など）
//! - **app**: アプリケーションロジック（builder, 各 sweep, orchestrator, scheduler, config）
//! - **impls**: 実装（InMemoryInventory など開発・テスト用）
//! - **observability**: パス / ステージの構造化レポート

pub mod app;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;
