//! IdGenerator port - ID 生成の抽象化
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（本番用）

use crate::domain::ids::{CartId, OrderId, ProductId, ReservationId};
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator は分散システムで使える ID を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数タスクから使える）
pub trait IdGenerator: Send + Sync {
    fn generate_order_id(&self) -> OrderId;

    fn generate_cart_id(&self) -> CartId;

    fn generate_reservation_id(&self) -> ReservationId;

    fn generate_product_id(&self) -> ProductId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// Clock を使って timestamp 部分を決めるので、FixedClock と組み合わせると
/// timestamp が固定された ID を生成できます。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_order_id(&self) -> OrderId {
        OrderId::from(self.next_ulid())
    }

    fn generate_cart_id(&self) -> CartId {
        CartId::from(self.next_ulid())
    }

    fn generate_reservation_id(&self) -> ReservationId {
        ReservationId::from(self.next_ulid())
    }

    fn generate_product_id(&self) -> ProductId {
        ProductId::from(self.next_ulid())
    }
}
