use super::{not_found, parse_id};
use crate::db::{Database, queries};
use crate::error::AppError;
use crate::fallback::FallbackData;
use crate::server::{RequestContext, router::AppState};
use axum::{
    Json, Router,
    extract::{Path, Query},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/{id}", get(get_product))
}

/// GET /api/products
pub async fn list_products(
    ctx: RequestContext,
    Query(query): Query<ProductQuery>,
) -> Result<Response, AppError> {
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let products = match &ctx.db {
        Database::Available(pool) => queries::list_products(pool, category).await?,
        Database::Unavailable => FallbackData::get().products_in(category),
    };
    Ok(Json(products).into_response())
}

/// GET /api/products/{id}
pub async fn get_product(
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let Some(id) = parse_id(&id) else {
        return Ok(not_found("Product not found"));
    };

    let product = match &ctx.db {
        Database::Available(pool) => queries::get_product(pool, id).await?,
        Database::Unavailable => FallbackData::get().product(id).cloned(),
    };
    Ok(match product {
        Some(product) => Json(product).into_response(),
        None => not_found("Product not found"),
    })
}
