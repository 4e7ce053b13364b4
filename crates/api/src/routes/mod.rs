//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                  - Liveness check
//! GET    /health/ready            - Readiness check (probes the pool)
//!
//! # Accounts
//! POST   /accounts/register       - Create an account + profile
//! POST   /accounts/token          - Log in, returns the token key
//! GET    /accounts/username       - Username lookup ("guest" without a token)
//! GET    /accounts/me             - Current account + profile
//! PUT    /accounts/me             - Partial account/profile update
//! PUT    /accounts/password       - Change password, rotates the token
//! DELETE /accounts/token          - Log out
//! DELETE /accounts/me             - Delete the account
//!
//! # Catalog
//! GET    /products/categories     - All categories
//! GET    /products                - Available products (?category=<slug>)
//! GET    /products/{id}/{slug}    - Product detail
//! POST   /products                - Create a product (owner = requester)
//! PUT    /products/{id}/{slug}    - Partial update (owner only)
//! DELETE /products/{id}/{slug}    - Delete (owner only)
//!
//! # Cart
//! GET    /cart                    - Get-or-create the cart, with totals
//! PUT    /cart                    - Replace the whole item mapping
//!
//! # Orders
//! POST   /orders                  - Checkout: snapshot the cart into an order
//! GET    /orders                  - Order history, newest first
//! ```

pub mod accounts;
pub mod cart;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, post, put},
};
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::state::AppState;

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(accounts::register))
        .route("/token", post(accounts::login).delete(accounts::logout))
        .route("/username", get(accounts::username))
        .route(
            "/me",
            get(accounts::me)
                .put(accounts::update_me)
                .delete(accounts::delete_me),
        )
        .route("/password", put(accounts::change_password))
}

/// Create the catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/categories", get(products::categories))
        .route(
            "/{id}/{slug}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new().route("/", get(cart::show).put(cart::update))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new().route("/", post(orders::create).get(orders::index))
}

/// All application routes, nested per path group.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/accounts", account_routes())
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
}

/// Deserialize a request body that has already been parsed as JSON.
///
/// Going through `serde_json::Value` keeps malformed bodies a 400 rather
/// than the extractor's default 422.
pub(crate) fn parse_body<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, AppError> {
    serde_json::from_value(value).map_err(|e| AppError::BadRequest(format!("invalid body: {e}")))
}
