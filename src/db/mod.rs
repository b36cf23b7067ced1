//! Database module: connectivity state, models and queries.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `queries.rs`: reads/writes used by the routers
//! - `schema.rs`: SQL DDL for provisioning the database (SQLite-first)

pub mod models;
pub mod queries;
pub mod schema;

pub use schema::SQLITE_INIT;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::{str::FromStr, time::Duration};
use tracing::{info, warn};

/// Table that must be readable before the database is trusted.
const PROBE_QUERY: &str = "SELECT 1 FROM products LIMIT 1";

/// Process-wide connectivity state.
///
/// The connected flag is derived from the variant, so a handle can never exist without the
/// flag and vice versa.
#[derive(Debug, Clone, Default)]
pub enum Database {
    #[default]
    Unavailable,
    Available(SqlitePool),
}

impl Database {
    pub fn is_connected(&self) -> bool {
        matches!(self, Database::Available(_))
    }

    pub fn pool(&self) -> Option<&SqlitePool> {
        match self {
            Database::Available(pool) => Some(pool),
            Database::Unavailable => None,
        }
    }

    /// Closes the pool if one is open. Safe to call on `Unavailable`.
    pub async fn close(&self) {
        if let Database::Available(pool) = self {
            pool.close().await;
            info!("Database connection closed");
        }
    }
}

/// Connects to `database_url` and probes the schema.
///
/// Every failure degrades to [`Database::Unavailable`]; nothing is returned as an error.
pub async fn initialize(database_url: Option<&str>) -> Database {
    let Some(url) = database_url else {
        info!("No database configured, serving fallback data");
        return Database::Unavailable;
    };

    let pool = match connect(url, false).await {
        Ok(pool) => pool,
        Err(e) => {
            warn!(error = %e, "Database connection failed, serving fallback data");
            return Database::Unavailable;
        }
    };

    match sqlx::query(PROBE_QUERY).fetch_optional(&pool).await {
        Ok(_) => {
            info!("Database connected");
            Database::Available(pool)
        }
        Err(e) => {
            warn!(error = %e, "Database schema check failed, serving fallback data");
            pool.close().await;
            Database::Unavailable
        }
    }
}

/// Opens a pool, optionally creating the SQLite file.
pub async fn connect(
    database_url: &str,
    create_if_missing: bool,
) -> Result<SqlitePool, sqlx::Error> {
    let connect_opts = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(create_if_missing)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(connect_opts)
        .await
}

pub async fn apply_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SQLITE_INIT).execute(pool).await?;
    Ok(())
}

/// Creates the database at `database_url`, applies the schema and loads the demo catalogue
/// into empty tables.
pub async fn provision(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let pool = connect(database_url, true).await?;
    apply_schema(&pool).await?;
    seed_demo_data(&pool).await?;
    Ok(pool)
}

async fn seed_demo_data(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        return Ok(());
    }

    let data = crate::fallback::FallbackData::get();
    let mut tx = pool.begin().await?;
    for user in data.users() {
        sqlx::query(
            "INSERT INTO users (id, name, email, is_admin, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.is_admin)
        .bind(user.created_at)
        .execute(&mut *tx)
        .await?;
    }
    for product in data.products() {
        sqlx::query(
            "INSERT INTO products (id, name, description, category, price_cents, stock, image_url) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(&product.image_url)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    info!(
        users = data.users().len(),
        products = data.products().len(),
        "Seeded demo catalogue"
    );
    Ok(())
}
