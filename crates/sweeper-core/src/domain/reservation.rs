//! StockReservation record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::ids::{OrderId, ProductId, ReservationId};
use super::state::ReservationStatus;

/// A product/quantity hold tied to an order.
///
/// Invariant: once released it can never be released again, so the
/// quantity is returned to available stock exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReservation {
    pub id: ReservationId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub status: ReservationStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub released_at: Option<DateTime<Utc>>,
}

impl StockReservation {
    pub fn new(
        id: ReservationId,
        order_id: OrderId,
        product_id: ProductId,
        quantity: u32,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            order_id,
            product_id,
            quantity,
            status: ReservationStatus::Active,
            expires_at,
            created_at,
            released_at: None,
        }
    }

    /// Still held and `expires_at <= now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == ReservationStatus::Active && self.expires_at <= now
    }

    /// active → released.
    pub fn release(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status != ReservationStatus::Active {
            return Err(DomainError::invalid_transition(
                self.id,
                self.status.as_str(),
                ReservationStatus::Released.as_str(),
            ));
        }
        self.status = ReservationStatus::Released;
        self.released_at = Some(now);
        Ok(())
    }
}
