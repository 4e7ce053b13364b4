//! Route-level tests for `PUT /cart`.
//!
//! A rejected replace must leave the stored cart untouched, so a client
//! that gets an error back can retry against the same state and a
//! follow-up `GET /cart` still succeeds.
//!
//! All tests skip unless `BAZAAR_TEST_DATABASE_URL` is set.

#![allow(clippy::unwrap_used)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use rust_decimal::Decimal;
use secrecy::SecretString;
use sqlx::PgPool;
use tower::ServiceExt;

use bazaar_api::config::ApiConfig;
use bazaar_api::db::catalog::NewProduct;
use bazaar_api::db::{CartRepository, CatalogRepository, UserRepository};
use bazaar_api::models::user::User;
use bazaar_api::routes;
use bazaar_api::services::account::generate_token_key;
use bazaar_api::state::AppState;
use bazaar_core::{CartItems, Email, ProductId, Username};
use bazaar_integration_tests::{test_pool, unique};

fn app(pool: PgPool) -> Router {
    let config = ApiConfig {
        database_url: SecretString::from("unused"),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        sentry_dsn: None,
        sentry_environment: None,
    };
    routes::routes().with_state(AppState::new(config, pool))
}

async fn create_user_with_token(pool: &PgPool) -> (User, String) {
    let name = unique("cartuser");
    let username = Username::parse(&name).unwrap();
    let email = Email::parse(&format!("{name}@example.com")).unwrap();
    let (user, _profile) = UserRepository::new(pool)
        .create(&username, &email, "unused-hash", None)
        .await
        .unwrap();
    let key = UserRepository::new(pool)
        .get_or_create_token(user.id, &generate_token_key())
        .await
        .unwrap();
    (user, key)
}

async fn create_product(pool: &PgPool, owner: &User) -> ProductId {
    let catalog = CatalogRepository::new(pool);
    let slug = unique("cat");
    let category = catalog.create_category(&slug, &slug).await.unwrap();

    let product_slug = unique("gadget");
    catalog
        .create(
            owner.id,
            &NewProduct {
                name: "Gadget".to_owned(),
                slug: product_slug,
                description: String::new(),
                price: Decimal::new(1500, 2),
                available: true,
                category: category.id,
            },
        )
        .await
        .unwrap()
        .id
}

fn put_cart(token: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri("/cart")
        .header(header::AUTHORIZATION, format!("token {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_cart(token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri("/cart")
        .header(header::AUTHORIZATION, format!("token {token}"))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn rejected_replace_leaves_the_stored_cart_unchanged() {
    let Some(pool) = test_pool().await else { return };

    let (user, token) = create_user_with_token(&pool).await;
    let product_id = create_product(&pool, &user).await;

    let mut original = CartItems::new();
    original.add(product_id, 1);
    CartRepository::new(&pool)
        .replace_items(user.id, &original)
        .await
        .unwrap();

    // Replace with a mapping naming a product that doesn't exist
    let body = serde_json::json!({ "items": { "2000000000": 1 } });
    let response = app(pool.clone())
        .oneshot(put_cart(&token, &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let cart = CartRepository::new(&pool)
        .get_or_create(user.id)
        .await
        .unwrap();
    assert_eq!(cart.items, original);

    // The cart still reads back fine afterwards
    let response = app(pool).oneshot(get_cart(&token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn replace_with_existing_products_succeeds() {
    let Some(pool) = test_pool().await else { return };

    let (user, token) = create_user_with_token(&pool).await;
    let product_id = create_product(&pool, &user).await;

    let body = serde_json::json!({ "items": { product_id.to_string(): 2 } });
    let response = app(pool.clone())
        .oneshot(put_cart(&token, &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cart = CartRepository::new(&pool)
        .get_or_create(user.id)
        .await
        .unwrap();
    assert_eq!(cart.items.get(product_id), Some(2));
}
