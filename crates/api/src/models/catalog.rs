//! Catalog domain types.

use bazaar_core::{CategoryId, ProductId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// A product category.
#[derive(Debug, Clone)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    /// URL-friendly unique identifier.
    pub slug: String,
}

/// A catalog product.
///
/// The owner is set at creation and never changes. The repository joins the
/// owner's username and the category name so listings can show them without
/// extra lookups.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: String,
    /// Non-negative unit price.
    pub price: Decimal,
    /// Hidden from listings and detail lookups when false.
    pub available: bool,
    /// Owning user; only the owner may update or delete.
    pub owner: UserId,
    pub owner_username: String,
    pub category: CategoryId,
    pub category_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
