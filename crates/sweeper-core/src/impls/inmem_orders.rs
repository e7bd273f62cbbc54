//! InMemoryOrderRepository / InMemoryCartRepository - 開発用のリポジトリ
//!
//! # 実装詳細
//! - 挿入順の Vec を正本として保持（`search` / `list_expired` はその順で返す）
//! - tokio の Mutex で排他制御（ロックを跨いだ await はしない）
//! - 障害注入: 検索の失敗、エンティティ単位の update 失敗

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::{Cart, CartId, CartStatus, Order, OrderId};
use crate::ports::{CartRepository, OrderFilter, OrderRepository, StoreError};

#[derive(Default)]
struct OrderTable {
    rows: Vec<Order>,
    search_unavailable: bool,
    failing_updates: HashSet<OrderId>,
    updates: usize,
}

/// In-memory order repository.
#[derive(Default, Clone)]
pub struct InMemoryOrderRepository {
    table: Arc<Mutex<OrderTable>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, order: Order) {
        self.table.lock().await.rows.push(order);
    }

    pub async fn get(&self, id: OrderId) -> Option<Order> {
        let table = self.table.lock().await;
        table.rows.iter().find(|o| o.id == id).cloned()
    }

    /// Number of successful `update` calls.
    pub async fn update_count(&self) -> usize {
        self.table.lock().await.updates
    }

    pub async fn set_search_unavailable(&self, unavailable: bool) {
        self.table.lock().await.search_unavailable = unavailable;
    }

    pub async fn fail_update_for(&self, id: OrderId) {
        self.table.lock().await.failing_updates.insert(id);
    }

    pub async fn heal_update_for(&self, id: OrderId) {
        self.table.lock().await.failing_updates.remove(&id);
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn search(&self, filter: OrderFilter) -> Result<Vec<Order>, StoreError> {
        let table = self.table.lock().await;
        if table.search_unavailable {
            return Err(StoreError::Unavailable("orders table offline".to_string()));
        }
        Ok(table
            .rows
            .iter()
            .filter(|o| filter.matches(o))
            .take(filter.limit)
            .cloned()
            .collect())
    }

    async fn update(&self, order: &Order) -> Result<(), StoreError> {
        let mut table = self.table.lock().await;
        if table.failing_updates.contains(&order.id) {
            return Err(StoreError::Unavailable(format!("update of {} rejected", order.id)));
        }
        let Some(row) = table.rows.iter_mut().find(|o| o.id == order.id) else {
            return Err(StoreError::NotFound(order.id.to_string()));
        };
        *row = order.clone();
        table.updates += 1;
        Ok(())
    }
}

#[derive(Default)]
struct CartTable {
    rows: Vec<Cart>,
    list_unavailable: bool,
    failing_updates: HashSet<CartId>,
    updates: usize,
}

/// In-memory cart repository.
#[derive(Default, Clone)]
pub struct InMemoryCartRepository {
    table: Arc<Mutex<CartTable>>,
}

impl InMemoryCartRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, cart: Cart) {
        self.table.lock().await.rows.push(cart);
    }

    pub async fn get(&self, id: CartId) -> Option<Cart> {
        let table = self.table.lock().await;
        table.rows.iter().find(|c| c.id == id).cloned()
    }

    pub async fn update_count(&self) -> usize {
        self.table.lock().await.updates
    }

    pub async fn set_list_unavailable(&self, unavailable: bool) {
        self.table.lock().await.list_unavailable = unavailable;
    }

    pub async fn fail_update_for(&self, id: CartId) {
        self.table.lock().await.failing_updates.insert(id);
    }
}

#[async_trait]
impl CartRepository for InMemoryCartRepository {
    async fn list_expired(&self, cutoff: DateTime<Utc>) -> Result<Vec<Cart>, StoreError> {
        let table = self.table.lock().await;
        if table.list_unavailable {
            return Err(StoreError::Unavailable("carts table offline".to_string()));
        }
        Ok(table
            .rows
            .iter()
            .filter(|c| c.status == CartStatus::Active && c.last_activity_at <= cutoff)
            .cloned()
            .collect())
    }

    async fn update(&self, cart: &Cart) -> Result<(), StoreError> {
        let mut table = self.table.lock().await;
        if table.failing_updates.contains(&cart.id) {
            return Err(StoreError::Unavailable(format!("update of {} rejected", cart.id)));
        }
        let Some(row) = table.rows.iter_mut().find(|c| c.id == cart.id) else {
            return Err(StoreError::NotFound(cart.id.to_string()));
        };
        *row = cart.clone();
        table.updates += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderStatus, PaymentStatus};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn search_filters_and_caps_in_insertion_order() {
        let repo = InMemoryOrderRepository::new();
        let mut ids = Vec::new();
        for _ in 0..5 {
            let order = Order::new(OrderId::random(), t0(), t0());
            ids.push(order.id);
            repo.insert(order).await;
        }
        let mut paid = Order::new(OrderId::random(), t0(), t0());
        paid.payment_status = PaymentStatus::Paid;
        repo.insert(paid).await;

        let found = repo.search(OrderFilter::pending_payment(3)).await.unwrap();

        assert_eq!(found.iter().map(|o| o.id).collect::<Vec<_>>(), ids[..3].to_vec());
    }

    #[tokio::test]
    async fn search_any_status_matches_confirmed_orders() {
        let repo = InMemoryOrderRepository::new();
        let mut confirmed = Order::new(OrderId::random(), t0(), t0());
        confirmed.status = OrderStatus::Confirmed;
        repo.insert(confirmed.clone()).await;

        assert!(repo.search(OrderFilter::pending_payment(10)).await.unwrap().is_empty());
        assert_eq!(
            repo.search(OrderFilter::payment_pending_any_status(10))
                .await
                .unwrap(),
            vec![confirmed]
        );
    }

    #[tokio::test]
    async fn update_replaces_row_or_reports_missing() {
        let repo = InMemoryOrderRepository::new();
        let mut order = Order::new(OrderId::random(), t0(), t0());
        repo.insert(order.clone()).await;

        order.cancel_for_payment_timeout(t0()).unwrap();
        repo.update(&order).await.unwrap();
        assert_eq!(repo.get(order.id).await, Some(order));

        let stranger = Order::new(OrderId::random(), t0(), t0());
        assert!(matches!(
            repo.update(&stranger).await,
            Err(StoreError::NotFound(_))
        ));
        assert_eq!(repo.update_count().await, 1);
    }

    #[tokio::test]
    async fn cart_listing_skips_recent_and_finished_carts() {
        let repo = InMemoryCartRepository::new();
        let stale = Cart::new(CartId::random(), t0());
        let fresh = Cart::new(CartId::random(), t0() + Duration::hours(10));
        let mut checked_out = Cart::new(CartId::random(), t0());
        checked_out.status = CartStatus::CheckedOut;
        repo.insert(stale.clone()).await;
        repo.insert(fresh).await;
        repo.insert(checked_out).await;

        let found = repo.list_expired(t0() + Duration::hours(1)).await.unwrap();

        assert_eq!(found, vec![stale]);
    }
}
