//! Cart repository.
//!
//! The item mapping lives in a JSONB column and crosses this boundary only
//! as the validated [`CartItems`] type.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use bazaar_core::{CartId, CartItems, UserId};

use super::RepositoryError;
use crate::models::cart::Cart;

#[derive(sqlx::FromRow)]
struct CartRow {
    id: i32,
    user_id: i32,
    items: Json<CartItems>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CartRow> for Cart {
    fn from(row: CartRow) -> Self {
        Self {
            id: CartId::new(row.id),
            user_id: UserId::new(row.user_id),
            items: row.items.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the user's cart, creating an empty one on first access.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        // No-op upsert so RETURNING yields the existing row when present
        let row = sqlx::query_as::<_, CartRow>(
            "INSERT INTO carts (user_id) VALUES ($1) \
             ON CONFLICT (user_id) DO UPDATE SET user_id = carts.user_id \
             RETURNING id, user_id, items, created_at, updated_at",
        )
        .bind(user_id.as_i32())
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Replace the whole item mapping (not a merge).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn replace_items(
        &self,
        user_id: UserId,
        items: &CartItems,
    ) -> Result<Cart, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            "INSERT INTO carts (user_id, items) VALUES ($1, $2) \
             ON CONFLICT (user_id) DO UPDATE SET items = EXCLUDED.items, updated_at = now() \
             RETURNING id, user_id, items, created_at, updated_at",
        )
        .bind(user_id.as_i32())
        .bind(Json(items))
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }
}
