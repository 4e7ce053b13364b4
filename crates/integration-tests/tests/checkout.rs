//! Integration tests for the checkout transaction.
//!
//! These exercise `OrderRepository::create_from_cart` against a real
//! database: the all-or-nothing rollback when a cart line references a
//! missing product, the name/price snapshot, and serialization of
//! concurrent checkouts of one cart.
//!
//! All tests skip unless `BAZAAR_TEST_DATABASE_URL` is set.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use sqlx::PgPool;

use bazaar_api::db::catalog::NewProduct;
use bazaar_api::db::orders::CheckoutError;
use bazaar_api::db::{CartRepository, CatalogRepository, OrderRepository, UserRepository};
use bazaar_api::models::catalog::Product;
use bazaar_api::models::order::ShippingDetails;
use bazaar_api::models::user::User;
use bazaar_core::{CartItems, Email, ProductId, Username};
use bazaar_integration_tests::{test_pool, unique};

/// A product id far above anything the tests insert.
const MISSING_PRODUCT: ProductId = ProductId::new(2_000_000_000);

async fn create_user(pool: &PgPool) -> User {
    let name = unique("checkout");
    let username = Username::parse(&name).unwrap();
    let email = Email::parse(&format!("{name}@example.com")).unwrap();
    let (user, _profile) = UserRepository::new(pool)
        .create(&username, &email, "unused-hash", None)
        .await
        .unwrap();
    user
}

async fn create_product(pool: &PgPool, owner: &User, price: Decimal) -> Product {
    let catalog = CatalogRepository::new(pool);
    let slug = unique("cat");
    let category = catalog.create_category(&slug, &slug).await.unwrap();

    let product_slug = unique("widget");
    catalog
        .create(
            owner.id,
            &NewProduct {
                name: "Widget".to_owned(),
                slug: product_slug,
                description: String::new(),
                price,
                available: true,
                category: category.id,
            },
        )
        .await
        .unwrap()
}

fn shipping() -> ShippingDetails {
    ShippingDetails {
        first_name: "Ada".to_owned(),
        last_name: "Lovelace".to_owned(),
        email: "ada@example.com".to_owned(),
        address: "1 Analytical Way".to_owned(),
        postal_code: "12345".to_owned(),
        city: "London".to_owned(),
    }
}

// =============================================================================
// Rollback
// =============================================================================

#[tokio::test]
async fn checkout_with_missing_product_persists_no_order() {
    let Some(pool) = test_pool().await else { return };

    let user = create_user(&pool).await;
    let product = create_product(&pool, &user, Decimal::new(1000, 2)).await;

    // One valid line, one line pointing at a product that doesn't exist
    let mut items = CartItems::new();
    items.add(product.id, 2);
    items.add(MISSING_PRODUCT, 1);
    CartRepository::new(&pool)
        .replace_items(user.id, &items)
        .await
        .unwrap();

    let err = OrderRepository::new(&pool)
        .create_from_cart(user.id, &shipping())
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::ProductNotFound(id) if id == MISSING_PRODUCT));

    // No order row survives, even for the valid line
    let orders = OrderRepository::new(&pool)
        .list_for_user(user.id)
        .await
        .unwrap();
    assert!(orders.is_empty());

    let order_count: i64 =
        sqlx::query_scalar("SELECT count(*) FROM orders WHERE user_id = $1")
            .bind(user.id.as_i32())
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(order_count, 0);

    // And the cart is exactly as it was
    let cart = CartRepository::new(&pool)
        .get_or_create(user.id)
        .await
        .unwrap();
    assert_eq!(cart.items, items);
}

#[tokio::test]
async fn checkout_without_a_cart_is_rejected() {
    let Some(pool) = test_pool().await else { return };

    let user = create_user(&pool).await;

    let err = OrderRepository::new(&pool)
        .create_from_cart(user.id, &shipping())
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::CartNotFound));
}

// =============================================================================
// Snapshot semantics
// =============================================================================

#[tokio::test]
async fn checkout_snapshots_the_cart_and_clears_it() {
    let Some(pool) = test_pool().await else { return };

    let user = create_user(&pool).await;
    let product = create_product(&pool, &user, Decimal::new(1000, 2)).await;

    let mut items = CartItems::new();
    items.add(product.id, 2);
    CartRepository::new(&pool)
        .replace_items(user.id, &items)
        .await
        .unwrap();

    let (order, order_items) = OrderRepository::new(&pool)
        .create_from_cart(user.id, &shipping())
        .await
        .unwrap();
    assert!(!order.paid);
    assert_eq!(order_items.len(), 1);
    assert_eq!(order_items[0].product_id, product.id);
    assert_eq!(order_items[0].quantity, 2);
    assert_eq!(order_items[0].price, Decimal::new(1000, 2));

    // The cart is emptied inside the same transaction
    let cart = CartRepository::new(&pool)
        .get_or_create(user.id)
        .await
        .unwrap();
    assert!(cart.items.is_empty());

    // Deleting the product later leaves the order's snapshot intact
    CatalogRepository::new(&pool).delete(product.id).await.unwrap();

    let orders = OrderRepository::new(&pool)
        .list_for_user(user.id)
        .await
        .unwrap();
    assert_eq!(orders.len(), 1);
    let (_, listed_items) = &orders[0];
    assert_eq!(listed_items[0].product_name, "Widget");
    assert_eq!(listed_items[0].price, Decimal::new(1000, 2));
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn concurrent_checkouts_never_duplicate_cart_lines() {
    let Some(pool) = test_pool().await else { return };

    let user = create_user(&pool).await;
    let product = create_product(&pool, &user, Decimal::new(500, 2)).await;

    let mut items = CartItems::new();
    items.add(product.id, 3);
    CartRepository::new(&pool)
        .replace_items(user.id, &items)
        .await
        .unwrap();

    // The cart row lock serializes these; whichever runs second sees an
    // already-emptied cart
    let repo = OrderRepository::new(&pool);
    let (addr_a, addr_b) = (shipping(), shipping());
    let (first, second) = tokio::join!(
        repo.create_from_cart(user.id, &addr_a),
        repo.create_from_cart(user.id, &addr_b),
    );
    assert!(first.is_ok());
    assert!(second.is_ok());

    let orders = OrderRepository::new(&pool)
        .list_for_user(user.id)
        .await
        .unwrap();
    let total_quantity: u32 = orders
        .iter()
        .flat_map(|(_, order_items)| order_items)
        .map(|item| item.quantity)
        .sum();
    assert_eq!(total_quantity, 3);
}
