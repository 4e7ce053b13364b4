//! Order repository and the checkout transaction.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;
use thiserror::Error;

use bazaar_core::{CartItems, OrderId, OrderItemId, ProductId, UserId};

use super::RepositoryError;
use crate::models::order::{Order, OrderItem, ShippingDetails};

/// Errors that can occur while turning a cart into an order.
///
/// Any of these aborts the transaction; nothing is persisted.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The user has no cart row.
    #[error("cart not found")]
    CartNotFound,

    /// A cart line references a product that no longer exists.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    first_name: String,
    last_name: String,
    email: String,
    address: String,
    postal_code: String,
    city: String,
    paid: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            address: row.address,
            postal_code: row.postal_code,
            city: row.city,
            paid: row.paid,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    product_name: String,
    price: Decimal,
    quantity: i32,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            price: row.price,
            quantity: u32::try_from(row.quantity).unwrap_or(0),
        }
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Snapshot the user's cart into an order and clear the cart.
    ///
    /// Runs in a single transaction: the cart row is locked `FOR UPDATE` so
    /// two concurrent checkouts of the same cart serialize, the order and
    /// its items are inserted with the product's current name and price, and
    /// the cart is emptied. If any cart line references a missing product
    /// the transaction rolls back and no order row survives.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::CartNotFound` if the user has no cart,
    /// `CheckoutError::ProductNotFound` if a cart line references a missing
    /// product, and `CheckoutError::Database` for database failures.
    pub async fn create_from_cart(
        &self,
        user_id: UserId,
        shipping: &ShippingDetails,
    ) -> Result<(Order, Vec<OrderItem>), CheckoutError> {
        let mut tx = self.pool.begin().await?;

        let cart: Option<(i32, Json<CartItems>)> =
            sqlx::query_as("SELECT id, items FROM carts WHERE user_id = $1 FOR UPDATE")
                .bind(user_id.as_i32())
                .fetch_optional(&mut *tx)
                .await?;
        let Some((cart_id, Json(items))) = cart else {
            return Err(CheckoutError::CartNotFound);
        };

        let order_row = sqlx::query_as::<_, OrderRow>(
            "INSERT INTO orders (user_id, first_name, last_name, email, address, postal_code, city) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, user_id, first_name, last_name, email, address, postal_code, city, \
                       paid, created_at, updated_at",
        )
        .bind(user_id.as_i32())
        .bind(&shipping.first_name)
        .bind(&shipping.last_name)
        .bind(&shipping.email)
        .bind(&shipping.address)
        .bind(&shipping.postal_code)
        .bind(&shipping.city)
        .fetch_one(&mut *tx)
        .await?;

        let mut order_items = Vec::with_capacity(items.len());
        for (product_id, quantity) in items.iter() {
            let product: Option<(String, Decimal)> =
                sqlx::query_as("SELECT name, price FROM products WHERE id = $1")
                    .bind(product_id.as_i32())
                    .fetch_optional(&mut *tx)
                    .await?;
            // Dropping the open transaction here rolls everything back
            let Some((product_name, price)) = product else {
                return Err(CheckoutError::ProductNotFound(product_id));
            };

            let item_row = sqlx::query_as::<_, OrderItemRow>(
                "INSERT INTO order_items (order_id, product_id, product_name, price, quantity) \
                 VALUES ($1, $2, $3, $4, $5) \
                 RETURNING id, order_id, product_id, product_name, price, quantity",
            )
            .bind(order_row.id)
            .bind(product_id.as_i32())
            .bind(&product_name)
            .bind(price)
            .bind(i32::try_from(quantity).unwrap_or(i32::MAX))
            .fetch_one(&mut *tx)
            .await?;

            order_items.push(item_row.into());
        }

        sqlx::query("UPDATE carts SET items = '{}'::jsonb, updated_at = now() WHERE id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok((order_row.into(), order_items))
    }

    /// All orders owned by a user, newest first, with their line items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<(Order, Vec<OrderItem>)>, RepositoryError> {
        let order_rows = sqlx::query_as::<_, OrderRow>(
            "SELECT id, user_id, first_name, last_name, email, address, postal_code, city, \
                    paid, created_at, updated_at \
             FROM orders WHERE user_id = $1 \
             ORDER BY created_at DESC",
        )
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        if order_rows.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<i32> = order_rows.iter().map(|r| r.id).collect();
        let item_rows = sqlx::query_as::<_, OrderItemRow>(
            "SELECT id, order_id, product_id, product_name, price, quantity \
             FROM order_items WHERE order_id = ANY($1) \
             ORDER BY id",
        )
        .bind(&order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_order: HashMap<i32, Vec<OrderItem>> = HashMap::new();
        for row in item_rows {
            by_order.entry(row.order_id).or_default().push(row.into());
        }

        Ok(order_rows
            .into_iter()
            .map(|row| {
                let items = by_order.remove(&row.id).unwrap_or_default();
                (row.into(), items)
            })
            .collect())
    }
}
