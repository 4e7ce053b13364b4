//! Catalog routes: categories, product listing and owner-gated mutations.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bazaar_core::{CategoryId, ProductId};

use crate::db::CatalogRepository;
use crate::db::catalog::{NewProduct, ProductChanges};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, ensure_owner};
use crate::models::catalog::{Category, Product};
use crate::state::AppState;

use super::parse_body;

// ============================================================================
// Request / response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default = "default_available")]
    pub available: bool,
    pub category: CategoryId,
}

const fn default_available() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub available: Option<bool>,
    pub category: Option<CategoryId>,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            slug: category.slug,
        }
    }
}

/// Product as returned by the catalog endpoints. The owner and category
/// appear by name.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Decimal,
    pub available: bool,
    pub user: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            slug: product.slug,
            description: product.description,
            price: product.price,
            available: product.available,
            user: product.owner_username,
            category: product.category_name,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

fn validate_new_product(req: &CreateProductRequest) -> Result<()> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("product name must not be empty".to_owned()));
    }
    if req.slug.trim().is_empty() {
        return Err(AppError::BadRequest("product slug must not be empty".to_owned()));
    }
    if req.price < Decimal::ZERO {
        return Err(AppError::BadRequest("price must not be negative".to_owned()));
    }
    Ok(())
}

async fn ensure_category_exists(repo: &CatalogRepository<'_>, id: CategoryId) -> Result<()> {
    if repo.category_exists(id).await? {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("category {id} does not exist")))
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// All categories.
///
/// GET /products/categories
///
/// # Errors
///
/// Returns 500 if the query fails.
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<CategoryResponse>>> {
    let categories = CatalogRepository::new(state.pool()).list_categories().await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

/// Available products, optionally filtered by category slug.
///
/// GET /products?category=<slug>
///
/// # Errors
///
/// Returns 404 if an explicit slug names no category.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Vec<ProductResponse>>> {
    let repo = CatalogRepository::new(state.pool());

    let category = match query.category {
        Some(slug) => {
            let category = repo
                .get_category_by_slug(&slug)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("category {slug:?} not found")))?;
            Some(category.id)
        }
        None => None,
    };

    let products = repo.list_available(category).await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// Product detail. The id/slug pair must match an available product.
///
/// GET /products/{id}/{slug}
///
/// # Errors
///
/// Returns 404 if no available product matches.
pub async fn show(
    State(state): State<AppState>,
    Path((id, slug)): Path<(ProductId, String)>,
) -> Result<Json<ProductResponse>> {
    let product = CatalogRepository::new(state.pool())
        .get_available(id, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id} not found")))?;

    Ok(Json(product.into()))
}

/// Create a product owned by the requester.
///
/// POST /products
///
/// # Errors
///
/// Returns 400 on validation failure and 401 without a valid token.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<ProductResponse>)> {
    let req: CreateProductRequest = parse_body(body)?;
    validate_new_product(&req)?;

    let repo = CatalogRepository::new(state.pool());
    ensure_category_exists(&repo, req.category).await?;

    let product = repo
        .create(
            user.id,
            &NewProduct {
                name: req.name,
                slug: req.slug,
                description: req.description,
                price: req.price,
                available: req.available,
                category: req.category,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(product.into())))
}

/// Partial update of a product. The owner never changes.
///
/// PUT /products/{id}/{slug}
///
/// # Errors
///
/// Returns 403 unless the requester owns the product, 404 if it doesn't
/// exist, and 400 on validation failure.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path((id, slug)): Path<(ProductId, String)>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<ProductResponse>> {
    let req: UpdateProductRequest = parse_body(body)?;

    if let Some(price) = req.price
        && price < Decimal::ZERO
    {
        return Err(AppError::BadRequest("price must not be negative".to_owned()));
    }

    let repo = CatalogRepository::new(state.pool());

    let product = repo
        .get(id, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id} not found")))?;
    ensure_owner(&user, product.owner, "product")?;

    if let Some(category) = req.category {
        ensure_category_exists(&repo, category).await?;
    }

    let updated = repo
        .update(
            id,
            &ProductChanges {
                name: req.name,
                slug: req.slug,
                description: req.description,
                price: req.price,
                available: req.available,
                category: req.category,
            },
        )
        .await?;

    Ok(Json(updated.into()))
}

/// Delete a product.
///
/// DELETE /products/{id}/{slug}
///
/// # Errors
///
/// Returns 403 unless the requester owns the product and 404 if it doesn't
/// exist.
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path((id, slug)): Path<(ProductId, String)>,
) -> Result<StatusCode> {
    let repo = CatalogRepository::new(state.pool());

    let product = repo
        .get(id, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id} not found")))?;
    ensure_owner(&user, product.owner, "product")?;

    repo.delete(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
