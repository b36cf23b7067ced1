use super::{bad_request, not_found, parse_id};
use crate::db::{Database, queries};
use crate::error::AppError;
use crate::fallback::FallbackData;
use crate::server::{RequestContext, extract::Payload, router::AppState};
use axum::{
    Json, Router,
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use serde::Deserialize;
use shopfront_schema::{NewOrder, NewOrderItem, Order, OrderItem};
use std::collections::BTreeMap;
use tracing::info;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/{id}", get(get_order))
}

/// GET /api/orders
pub async fn list_orders(ctx: RequestContext) -> Result<Response, AppError> {
    let orders = match &ctx.db {
        Database::Available(pool) => queries::list_orders(pool).await?,
        Database::Unavailable => FallbackData::get().orders().to_vec(),
    };
    Ok(Json(orders).into_response())
}

/// GET /api/orders/{id}
pub async fn get_order(ctx: RequestContext, Path(id): Path<String>) -> Result<Response, AppError> {
    let Some(id) = parse_id(&id) else {
        return Ok(not_found("Order not found"));
    };

    let order = match &ctx.db {
        Database::Available(pool) => queries::get_order(pool, id).await?,
        Database::Unavailable => FallbackData::get().order(id).cloned(),
    };
    Ok(match order {
        Some(order) => Json(order).into_response(),
        None => not_found("Order not found"),
    })
}

/// Order body as sent by clients.
///
/// JSON bodies carry `items`. Form bodies repeat `product_id` and `quantity` keys instead,
/// paired by position: `user_id=2&product_id=5&quantity=1&product_id=3&quantity=2`.
#[derive(Debug, Deserialize)]
pub struct OrderRequest {
    pub user_id: i64,
    #[serde(default)]
    pub items: Vec<NewOrderItem>,
    #[serde(default)]
    pub product_id: Vec<i64>,
    #[serde(default)]
    pub quantity: Vec<i64>,
}

impl OrderRequest {
    fn into_new_order(self) -> Result<NewOrder, &'static str> {
        if self.product_id.len() != self.quantity.len() {
            return Err("Each product_id needs a matching quantity");
        }
        let mut items = self.items;
        items.extend(
            self.product_id
                .into_iter()
                .zip(self.quantity)
                .map(|(product_id, quantity)| NewOrderItem {
                    product_id,
                    quantity,
                }),
        );
        Ok(NewOrder {
            user_id: self.user_id,
            items,
        })
    }
}

const ORDER_TOO_LARGE: &str = "Order total is too large";

/// Collapses repeated product lines into one quantity per product.
fn merge_lines(items: &[NewOrderItem]) -> Result<BTreeMap<i64, i64>, &'static str> {
    if items.is_empty() {
        return Err("Order must contain at least one item");
    }
    let mut lines = BTreeMap::new();
    for item in items {
        if item.quantity <= 0 {
            return Err("Item quantities must be positive");
        }
        let quantity = lines.entry(item.product_id).or_insert(0i64);
        *quantity = quantity.checked_add(item.quantity).ok_or(ORDER_TOO_LARGE)?;
    }
    Ok(lines)
}

/// POST /api/orders
///
/// Prices come from the catalogue, never from the client. Without a database the order is
/// priced against fallback data and returned with `persisted: false`.
pub async fn create_order(
    ctx: RequestContext,
    Payload(body): Payload<OrderRequest>,
) -> Result<Response, AppError> {
    let new_order = match body.into_new_order() {
        Ok(new_order) => new_order,
        Err(reason) => return Ok(bad_request(reason)),
    };
    let lines = match merge_lines(&new_order.items) {
        Ok(lines) => lines,
        Err(reason) => return Ok(bad_request(reason)),
    };

    let order = match &ctx.db {
        Database::Available(pool) => {
            if queries::get_user(pool, new_order.user_id).await?.is_none() {
                return Ok(bad_request("Unknown user"));
            }
            let mut items = Vec::with_capacity(lines.len());
            for (product_id, quantity) in lines {
                let Some(product) = queries::get_product(pool, product_id).await? else {
                    return Ok(bad_request(format!("Unknown product {product_id}")));
                };
                items.push(OrderItem {
                    product_id,
                    quantity,
                    unit_price_cents: product.price_cents,
                });
            }
            let Some(total_cents) = Order::checked_total(&items) else {
                return Ok(bad_request(ORDER_TOO_LARGE));
            };
            queries::create_order(pool, new_order.user_id, items, total_cents).await?
        }
        Database::Unavailable => {
            let data = FallbackData::get();
            if data.user(new_order.user_id).is_none() {
                return Ok(bad_request("Unknown user"));
            }
            let mut items = Vec::with_capacity(lines.len());
            for (product_id, quantity) in lines {
                let Some(product) = data.product(product_id) else {
                    return Ok(bad_request(format!("Unknown product {product_id}")));
                };
                items.push(OrderItem {
                    product_id,
                    quantity,
                    unit_price_cents: product.price_cents,
                });
            }
            let Some(total_cents) = Order::checked_total(&items) else {
                return Ok(bad_request(ORDER_TOO_LARGE));
            };
            Order {
                id: 0,
                user_id: new_order.user_id,
                status: "pending".to_string(),
                total_cents,
                items,
                created_at: Utc::now(),
                persisted: false,
            }
        }
    };

    info!(
        order_id = order.id,
        user_id = order.user_id,
        total_cents = order.total_cents,
        persisted = order.persisted,
        "Order accepted"
    );
    Ok((StatusCode::CREATED, Json(order)).into_response())
}
