//! Cart domain type.

use bazaar_core::{CartId, CartItems, UserId};
use chrono::{DateTime, Utc};

/// A user's shopping cart. Exactly one per user, created lazily.
#[derive(Debug, Clone)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    /// Validated product → quantity mapping.
    pub items: CartItems,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
