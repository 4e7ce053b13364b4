//! Cart routes.
//!
//! One cart per user, created on first access. The item mapping is replaced
//! wholesale on PUT; totals are computed against live product prices.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bazaar_core::{CartItems, ProductId};

use crate::db::{CartRepository, CatalogRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::cart::Cart;
use crate::models::user::User;
use crate::state::AppState;

use super::parse_body;

#[derive(Debug, Deserialize)]
pub struct ReplaceCartRequest {
    pub items: CartItems,
}

/// Cart with totals. `total_price` uses the catalog's current prices.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub user: String,
    pub items: CartItems,
    pub total_items: u64,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartResponse {
    fn new(user: &User, cart: Cart, total_price: Decimal) -> Self {
        Self {
            user: user.username.to_string(),
            total_items: cart.items.total_items(),
            total_price,
            items: cart.items,
            created_at: cart.created_at,
            updated_at: cart.updated_at,
        }
    }
}

/// Result of pricing a mapping against the live catalog.
enum CartTotal {
    Priced(Decimal),
    Missing(ProductId),
}

/// Sum of current price times quantity, or the first product that no
/// longer exists in the catalog.
async fn total_price(repo: &CatalogRepository<'_>, items: &CartItems) -> Result<CartTotal> {
    let mut total = Decimal::ZERO;
    for (product_id, quantity) in items.iter() {
        let Some(price) = repo.get_price(product_id).await? else {
            return Ok(CartTotal::Missing(product_id));
        };
        total += price * Decimal::from(quantity);
    }
    Ok(CartTotal::Priced(total))
}

/// The user's cart, created empty on first access.
///
/// GET /cart
///
/// # Errors
///
/// Returns 401 without a valid token and 404 if an item references a
/// product that no longer exists.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartResponse>> {
    let cart = CartRepository::new(state.pool()).get_or_create(user.id).await?;

    let total = match total_price(&CatalogRepository::new(state.pool()), &cart.items).await? {
        CartTotal::Priced(total) => total,
        CartTotal::Missing(id) => {
            return Err(AppError::NotFound(format!(
                "product {id} in the cart no longer exists"
            )));
        }
    };

    Ok(Json(CartResponse::new(&user, cart, total)))
}

/// Replace the whole item mapping.
///
/// PUT /cart
///
/// # Errors
///
/// Returns 400 unless the body is a flat map of product-id string to
/// non-negative integer (zero entries are dropped) and every key names an
/// existing product. An error response means the stored cart is unchanged:
/// the mapping is priced before anything is written.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<CartResponse>> {
    let req: ReplaceCartRequest = parse_body(body)?;

    // Price first; the write below only happens once every product resolved
    let total = match total_price(&CatalogRepository::new(state.pool()), &req.items).await? {
        CartTotal::Priced(total) => total,
        CartTotal::Missing(id) => {
            return Err(AppError::BadRequest(format!("product {id} does not exist")));
        }
    };

    let cart = CartRepository::new(state.pool())
        .replace_items(user.id, &req.items)
        .await?;

    Ok(Json(CartResponse::new(&user, cart, total)))
}
