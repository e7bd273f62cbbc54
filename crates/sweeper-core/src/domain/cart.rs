//! Cart record.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::ids::CartId;
use super::state::CartStatus;

/// Snapshot of a shopping cart.
///
/// Carts hold no inventory in this engine's scope; abandoning one is a pure
/// status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub status: CartStatus,

    /// Last time the customer touched the cart.
    pub last_activity_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(id: CartId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            status: CartStatus::Active,
            last_activity_at: created_at,
            created_at,
            updated_at: created_at,
        }
    }

    /// How long the cart has been idle at `now` (zero if activity is in the future).
    pub fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        (now - self.last_activity_at).max(Duration::zero())
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity_at = now;
        self.updated_at = now;
    }

    /// active → abandoned (one-way).
    pub fn mark_abandoned(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status != CartStatus::Active {
            return Err(DomainError::invalid_transition(
                self.id,
                self.status.as_str(),
                CartStatus::Abandoned.as_str(),
            ));
        }
        self.status = CartStatus::Abandoned;
        self.updated_at = now;
        Ok(())
    }
}
