//! Seed the database with demo data for local development.
//!
//! Inserts a handful of categories, a demo account (username `demo`,
//! password `password123`) and a few products owned by it. Safe to run more
//! than once; existing rows are kept.

use rust_decimal::Decimal;
use tracing::info;

use bazaar_core::{Email, Username};

use bazaar_api::db::{self, CatalogRepository, RepositoryError, UserRepository};
use bazaar_api::db::catalog::NewProduct;
use bazaar_api::models::user::User;
use bazaar_api::services::account::hash_password;

use super::{CliError, database_url};

const DEMO_USERNAME: &str = "demo";
const DEMO_EMAIL: &str = "demo@example.com";
const DEMO_PASSWORD: &str = "password123";

/// Seed demo categories, a demo user and demo products.
///
/// # Errors
///
/// Returns `CliError` if the database URL is missing or a query fails.
pub async fn run() -> Result<(), CliError> {
    let database_url = database_url()?;

    info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    let catalog = CatalogRepository::new(&pool);
    let users = UserRepository::new(&pool);

    for (name, slug) in [
        ("Clothing", "clothing"),
        ("Electronics", "electronics"),
        ("Books", "books"),
    ] {
        match catalog.create_category(name, slug).await {
            Ok(category) => info!(slug, "Created category {}", category.name),
            Err(RepositoryError::Conflict(_)) => info!(slug, "Category already exists"),
            Err(e) => return Err(e.into()),
        }
    }

    let user = demo_user(&users).await?;
    info!(username = %user.username, "Demo user ready");

    let clothing = catalog
        .get_category_by_slug("clothing")
        .await?
        .ok_or_else(|| CliError::Seed("clothing category missing after seed".to_owned()))?;
    let electronics = catalog
        .get_category_by_slug("electronics")
        .await?
        .ok_or_else(|| CliError::Seed("electronics category missing after seed".to_owned()))?;

    let products = [
        NewProduct {
            name: "Plain T-Shirt".to_owned(),
            slug: "plain-t-shirt".to_owned(),
            description: "A plain cotton t-shirt.".to_owned(),
            price: Decimal::new(1999, 2),
            available: true,
            category: clothing.id,
        },
        NewProduct {
            name: "Wool Socks".to_owned(),
            slug: "wool-socks".to_owned(),
            description: "Warm socks for cold days.".to_owned(),
            price: Decimal::new(899, 2),
            available: true,
            category: clothing.id,
        },
        NewProduct {
            name: "USB-C Cable".to_owned(),
            slug: "usb-c-cable".to_owned(),
            description: "One metre, braided.".to_owned(),
            price: Decimal::new(1250, 2),
            available: true,
            category: electronics.id,
        },
    ];

    for product in &products {
        let existing = sqlx::query_scalar::<_, i32>(
            "SELECT id FROM products WHERE slug = $1 AND user_id = $2",
        )
        .bind(&product.slug)
        .bind(user.id.as_i32())
        .fetch_optional(&pool)
        .await?;

        if existing.is_some() {
            info!(slug = %product.slug, "Product already exists");
            continue;
        }

        let created = catalog.create(user.id, product).await?;
        info!(slug = %created.slug, "Created product {}", created.name);
    }

    info!("Seed complete");
    Ok(())
}

/// Get or create the demo account.
async fn demo_user(users: &UserRepository<'_>) -> Result<User, CliError> {
    let username = Username::parse(DEMO_USERNAME)
        .map_err(|e| CliError::Seed(format!("invalid demo username: {e}")))?;

    if let Some((user, _)) = users.get_with_password_hash(&username).await? {
        return Ok(user);
    }

    let email = Email::parse(DEMO_EMAIL)
        .map_err(|e| CliError::Seed(format!("invalid demo email: {e}")))?;
    let password_hash = hash_password(DEMO_PASSWORD)
        .map_err(|e| CliError::Seed(format!("failed to hash demo password: {e}")))?;

    let (user, _profile) = users.create(&username, &email, &password_hash, None).await?;
    Ok(user)
}
