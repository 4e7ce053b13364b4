//! Order routes: checkout and order history.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use bazaar_core::{OrderId, ProductId};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::order::{Order, OrderItem, ShippingDetails, total_cost};
use crate::state::AppState;

use super::parse_body;

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Decimal,
    pub quantity: u32,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            product_id: item.product_id,
            product_name: item.product_name,
            price: item.price,
            quantity: item.quantity,
        }
    }
}

/// Order with its snapshot lines and the derived total.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
    pub postal_code: String,
    pub city: String,
    pub paid: bool,
    pub total_cost: Decimal,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderResponse {
    fn new(order: Order, items: Vec<OrderItem>) -> Self {
        Self {
            id: order.id,
            first_name: order.first_name,
            last_name: order.last_name,
            email: order.email,
            address: order.address,
            postal_code: order.postal_code,
            city: order.city,
            paid: order.paid,
            total_cost: total_cost(&items),
            items: items.into_iter().map(Into::into).collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// Checkout: snapshot the cart into an order and clear it.
///
/// POST /orders
///
/// # Errors
///
/// Returns 400 on malformed shipping fields, 401 without a valid token, and
/// 404 if the user has no cart or a cart line references a missing product.
/// Failure rolls the whole transaction back.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<OrderResponse>)> {
    let shipping: ShippingDetails = parse_body(body)?;
    shipping
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let (order, items) = OrderRepository::new(state.pool())
        .create_from_cart(user.id, &shipping)
        .await?;

    Ok((StatusCode::CREATED, Json(OrderResponse::new(order, items))))
}

/// Order history, newest first.
///
/// GET /orders
///
/// # Errors
///
/// Returns 401 without a valid token.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<OrderResponse>>> {
    let orders = OrderRepository::new(state.pool()).list_for_user(user.id).await?;

    Ok(Json(
        orders
            .into_iter()
            .map(|(order, items)| OrderResponse::new(order, items))
            .collect(),
    ))
}
