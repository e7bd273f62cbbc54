//! CartRepository port - カートの正本

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::Cart;
use crate::ports::StoreError;

/// CartRepository はカートの検索と更新を提供
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Active carts whose last activity is at or before `cutoff`.
    ///
    /// Abandoned and checked-out carts never match, which is what makes a
    /// second cart sweep a no-op.
    async fn list_expired(&self, cutoff: DateTime<Utc>) -> Result<Vec<Cart>, StoreError>;

    async fn update(&self, cart: &Cart) -> Result<(), StoreError>;
}
