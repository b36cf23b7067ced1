//! Read/write helpers used by the routers when the database is available.

use super::models::{DbOrder, DbOrderItem, DbProduct, DbUser};
use chrono::Utc;
use shopfront_schema::{Order, OrderItem, Product, PublicUser, StoreStats};
use sqlx::SqlitePool;
use std::collections::HashMap;

pub async fn list_products(
    pool: &SqlitePool,
    category: Option<&str>,
) -> Result<Vec<Product>, sqlx::Error> {
    let rows: Vec<DbProduct> = match category {
        Some(category) => {
            sqlx::query_as(
                "SELECT id, name, description, category, price_cents, stock, image_url \
                 FROM products WHERE category = ? COLLATE NOCASE ORDER BY id",
            )
            .bind(category)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as(
                "SELECT id, name, description, category, price_cents, stock, image_url \
                 FROM products ORDER BY id",
            )
            .fetch_all(pool)
            .await?
        }
    };
    Ok(rows.into_iter().map(Product::from).collect())
}

pub async fn get_product(pool: &SqlitePool, id: i64) -> Result<Option<Product>, sqlx::Error> {
    let row: Option<DbProduct> = sqlx::query_as(
        "SELECT id, name, description, category, price_cents, stock, image_url \
         FROM products WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Product::from))
}

pub async fn list_users(pool: &SqlitePool) -> Result<Vec<PublicUser>, sqlx::Error> {
    let rows: Vec<DbUser> =
        sqlx::query_as("SELECT id, name, email, is_admin, created_at FROM users ORDER BY id")
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().map(PublicUser::from).collect())
}

pub async fn get_user(pool: &SqlitePool, id: i64) -> Result<Option<PublicUser>, sqlx::Error> {
    let row: Option<DbUser> =
        sqlx::query_as("SELECT id, name, email, is_admin, created_at FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(PublicUser::from))
}

pub async fn find_user_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<PublicUser>, sqlx::Error> {
    let row: Option<DbUser> = sqlx::query_as(
        "SELECT id, name, email, is_admin, created_at FROM users WHERE email = ? COLLATE NOCASE",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(PublicUser::from))
}

pub async fn list_orders(pool: &SqlitePool) -> Result<Vec<Order>, sqlx::Error> {
    let orders: Vec<DbOrder> = sqlx::query_as(
        "SELECT id, user_id, status, total_cents, created_at FROM orders ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    let items: Vec<DbOrderItem> = sqlx::query_as(
        "SELECT order_id, product_id, quantity, unit_price_cents FROM order_items \
         ORDER BY order_id, product_id",
    )
    .fetch_all(pool)
    .await?;

    let mut by_order: HashMap<i64, Vec<DbOrderItem>> = HashMap::new();
    for item in items {
        by_order.entry(item.order_id).or_default().push(item);
    }

    Ok(orders
        .into_iter()
        .map(|order| {
            let items = by_order.remove(&order.id).unwrap_or_default();
            order.with_items(items)
        })
        .collect())
}

pub async fn get_order(pool: &SqlitePool, id: i64) -> Result<Option<Order>, sqlx::Error> {
    let Some(order): Option<DbOrder> = sqlx::query_as(
        "SELECT id, user_id, status, total_cents, created_at FROM orders WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    else {
        return Ok(None);
    };

    let items: Vec<DbOrderItem> = sqlx::query_as(
        "SELECT order_id, product_id, quantity, unit_price_cents FROM order_items \
         WHERE order_id = ? ORDER BY product_id",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(Some(order.with_items(items)))
}

/// Stores a priced order and its items in one transaction.
pub async fn create_order(
    pool: &SqlitePool,
    user_id: i64,
    items: Vec<OrderItem>,
    total_cents: i64,
) -> Result<Order, sqlx::Error> {
    let created_at = Utc::now();

    let mut tx = pool.begin().await?;
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO orders (user_id, status, total_cents, created_at) \
         VALUES (?, 'pending', ?, ?) RETURNING id",
    )
    .bind(user_id)
    .bind(total_cents)
    .bind(created_at)
    .fetch_one(&mut *tx)
    .await?;

    for item in &items {
        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, quantity, unit_price_cents) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    Ok(Order {
        id,
        user_id,
        status: "pending".to_string(),
        total_cents,
        items,
        created_at,
        persisted: true,
    })
}

pub async fn stats(pool: &SqlitePool) -> Result<StoreStats, sqlx::Error> {
    let (users, products, orders): (i64, i64, i64) = sqlx::query_as(
        "SELECT (SELECT COUNT(*) FROM users), (SELECT COUNT(*) FROM products), \
         (SELECT COUNT(*) FROM orders)",
    )
    .fetch_one(pool)
    .await?;
    Ok(StoreStats {
        users,
        products,
        orders,
        connected: true,
    })
}
