//! InMemoryInventory - 開発用の在庫引当ストア
//!
//! `ReservationRepository` と `ReservationRelease` の両方を実装します。
//! 商品ごとに `available` / `reserved` のカウンタを持ち、
//! 引当の解放で `reserved → available` へ数量を 1 回だけ戻します。
//!
//! # 障害注入
//! テストで §7 の失敗パスを再現するためのスイッチを持ちます：
//! - `set_list_unavailable`: 期限切れ検索を失敗させる
//! - `set_release_unavailable`: すべての解放呼び出しを失敗させる
//! - `fail_release_for`: 特定注文の `release_by_order` だけを失敗させる

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::domain::{OrderId, ProductId, ReservationId, ReservationStatus, StockReservation};
use crate::ports::{
    Clock, IdGenerator, ReservationRelease, ReservationRepository, StoreError, UlidGenerator,
};

/// Stock counters of one product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub available: u64,
    pub reserved: u64,
}

#[derive(Default)]
struct InventoryState {
    /// All holds in insertion order (single source of truth).
    reservations: Vec<StockReservation>,
    stock: HashMap<ProductId, StockLevel>,

    list_unavailable: bool,
    release_unavailable: bool,
    failing_orders: HashSet<OrderId>,

    /// Number of release calls that reached the store (ok or not).
    release_calls: usize,
}

impl InventoryState {
    /// Release every active hold matching `pred`, returning how many moved.
    fn release_where(
        &mut self,
        now: DateTime<Utc>,
        pred: impl Fn(&StockReservation) -> bool,
    ) -> usize {
        let mut released = 0;
        for reservation in self.reservations.iter_mut() {
            if reservation.status != ReservationStatus::Active || !pred(reservation) {
                continue;
            }
            if reservation.release(now).is_err() {
                continue;
            }
            let level = self.stock.entry(reservation.product_id).or_default();
            let quantity = u64::from(reservation.quantity);
            level.reserved = level.reserved.saturating_sub(quantity);
            level.available += quantity;
            released += 1;
        }
        released
    }
}

/// In-memory inventory with stock holds.
pub struct InMemoryInventory {
    state: Arc<Mutex<InventoryState>>,
    clock: Arc<dyn Clock>,
    ids: Box<dyn IdGenerator>,
}

impl InMemoryInventory {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(InventoryState::default())),
            ids: Box::new(UlidGenerator::new(Arc::clone(&clock))),
            clock,
        }
    }

    /// Add sellable units of `product`.
    pub async fn add_stock(&self, product_id: ProductId, quantity: u64) {
        let mut state = self.state.lock().await;
        state.stock.entry(product_id).or_default().available += quantity;
    }

    /// Hold `quantity` units of `product_id` for `order_id` until `expires_at`.
    pub async fn reserve(
        &self,
        order_id: OrderId,
        product_id: ProductId,
        quantity: u32,
        expires_at: DateTime<Utc>,
    ) -> Result<ReservationId, StoreError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        let level = state.stock.entry(product_id).or_default();
        let wanted = u64::from(quantity);
        if level.available < wanted {
            return Err(StoreError::Conflict(format!(
                "{product_id}: only {} available, {wanted} requested",
                level.available
            )));
        }
        level.available -= wanted;
        level.reserved += wanted;

        let id = self.ids.generate_reservation_id();
        state.reservations.push(StockReservation::new(
            id, order_id, product_id, quantity, now, expires_at,
        ));
        Ok(id)
    }

    pub async fn reservation(&self, id: ReservationId) -> Option<StockReservation> {
        let state = self.state.lock().await;
        state.reservations.iter().find(|r| r.id == id).cloned()
    }

    pub async fn stock_level(&self, product_id: ProductId) -> StockLevel {
        let state = self.state.lock().await;
        state.stock.get(&product_id).copied().unwrap_or_default()
    }

    /// Number of holds of `order_id` still active.
    pub async fn active_holds_for(&self, order_id: OrderId) -> usize {
        let state = self.state.lock().await;
        state
            .reservations
            .iter()
            .filter(|r| r.order_id == order_id && r.status == ReservationStatus::Active)
            .count()
    }

    pub async fn release_calls(&self) -> usize {
        self.state.lock().await.release_calls
    }

    pub async fn set_list_unavailable(&self, unavailable: bool) {
        self.state.lock().await.list_unavailable = unavailable;
    }

    pub async fn set_release_unavailable(&self, unavailable: bool) {
        self.state.lock().await.release_unavailable = unavailable;
    }

    pub async fn fail_release_for(&self, order_id: OrderId) {
        self.state.lock().await.failing_orders.insert(order_id);
    }

    pub async fn heal_release_for(&self, order_id: OrderId) {
        self.state.lock().await.failing_orders.remove(&order_id);
    }
}

#[async_trait]
impl ReservationRepository for InMemoryInventory {
    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<StockReservation>, StoreError> {
        let state = self.state.lock().await;
        if state.list_unavailable {
            return Err(StoreError::Unavailable("reservation index offline".to_string()));
        }
        Ok(state
            .reservations
            .iter()
            .filter(|r| r.is_expired(now))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ReservationRelease for InMemoryInventory {
    async fn release_expired(&self, as_of: DateTime<Utc>) -> Result<usize, StoreError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        state.release_calls += 1;
        if state.release_unavailable {
            return Err(StoreError::Unavailable("release service offline".to_string()));
        }
        Ok(state.release_where(now, |r| r.expires_at <= as_of))
    }

    async fn release_by_order(&self, order_id: OrderId) -> Result<usize, StoreError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        state.release_calls += 1;
        if state.release_unavailable || state.failing_orders.contains(&order_id) {
            return Err(StoreError::Unavailable(format!(
                "release for {order_id} rejected"
            )));
        }
        Ok(state.release_where(now, |r| r.order_id == order_id))
    }
}
