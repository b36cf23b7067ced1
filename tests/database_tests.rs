use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use serde_json::Value;
use shopfront::{
    AppState, Database,
    config::Config,
    db,
    runtime::RuntimeMode,
    shopfront_router,
};
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tower::ServiceExt;

fn unique_sqlite_path(prefix: &str) -> std::path::PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();

    let mut temp_path = std::env::temp_dir();
    temp_path.push(format!(
        "shopfront-{}-{}-{}.sqlite",
        prefix,
        std::process::id(),
        nanos
    ));
    temp_path
}

async fn provisioned_url(prefix: &str) -> String {
    let database_url = format!("sqlite:{}", unique_sqlite_path(prefix).display());
    let pool = db::provision(&database_url)
        .await
        .expect("failed to provision database");
    pool.close().await;
    database_url
}

async fn body_json(resp: Response) -> Value {
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&body).expect("response body was not JSON")
}

#[tokio::test]
async fn missing_url_yields_unavailable_without_connecting() {
    let db = db::initialize(None).await;
    assert!(!db.is_connected());
    assert!(db.pool().is_none());
}

#[tokio::test]
async fn unreachable_database_degrades_to_unavailable() {
    let path = unique_sqlite_path("absent");
    let db = db::initialize(Some(&format!("sqlite:{}", path.display()))).await;
    assert!(matches!(db, Database::Unavailable));

    let db = db::initialize(Some("not-a-database-url")).await;
    assert!(matches!(db, Database::Unavailable));
}

#[tokio::test]
async fn schema_probe_failure_releases_the_connection() {
    let database_url = format!("sqlite:{}", unique_sqlite_path("empty").display());
    let pool = db::connect(&database_url, true)
        .await
        .expect("failed to create empty database");
    pool.close().await;

    let db = db::initialize(Some(&database_url)).await;
    assert!(!db.is_connected());
    assert!(db.pool().is_none());
}

#[tokio::test]
async fn provisioned_database_connects() {
    let database_url = provisioned_url("connect").await;
    let db = db::initialize(Some(&database_url)).await;
    assert!(db.is_connected());
    assert!(db.pool().is_some());
    db.close().await;
}

#[tokio::test]
async fn hosted_mode_never_connects_even_with_a_valid_url() {
    let database_url = provisioned_url("hosted").await;
    let cfg = Config {
        database_url: Some(database_url),
        vercel: Some("1".to_string()),
        ..Config::default()
    };
    let mode = RuntimeMode::detect(&cfg);
    assert_eq!(mode, RuntimeMode::Hosted);
    assert!(!mode.connect(&cfg).await.is_connected());

    let standalone = Config {
        vercel: None,
        ..cfg
    };
    let mode = RuntimeMode::detect(&standalone);
    assert_eq!(mode, RuntimeMode::Standalone);
    let db = mode.connect(&standalone).await;
    assert!(db.is_connected());
    db.close().await;
}

async fn live_app(prefix: &str) -> (Router, Database) {
    let database_url = provisioned_url(prefix).await;
    let db = db::initialize(Some(&database_url)).await;
    assert!(db.is_connected());
    let cfg = Config {
        admin_key: Some("admin-secret".to_string()),
        ..Config::default()
    };
    let app = shopfront_router(AppState::new(Arc::new(cfg), db.clone()));
    (app, db)
}

#[tokio::test]
async fn routes_read_from_the_live_database() {
    let (app, db) = live_app("routes").await;

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/products?category=clothing")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let products = body_json(resp).await;
    let names: Vec<&str> = products
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|p| p["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Cotton T-Shirt", "Running Shoes"]);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/users/42")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    db.close().await;
}

#[tokio::test]
async fn orders_are_persisted_when_connected() {
    let (app, db) = live_app("orders").await;

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/orders")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"user_id":3,"items":[{"product_id":1,"quantity":1},{"product_id":2,"quantity":2}]}"#,
                ))
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = body_json(resp).await;
    assert_eq!(created["persisted"], true);
    assert_eq!(created["total_cents"], 12_999 + 2 * 8_950);
    let id = created["id"].as_i64().expect("order id");

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/orders/{id}"))
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched = body_json(resp).await;
    assert_eq!(fetched["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(fetched["user_id"], 3);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/orders")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"user_id":3,"items":[{"product_id":999,"quantity":1}]}"#,
                ))
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Totals that overflow are rejected before anything is written.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/orders")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("user_id=3&product_id=1&quantity=4611686018427387904"))
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/admin/stats")
                .header("x-admin-key", "admin-secret")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let stats = body_json(resp).await;
    assert_eq!(stats["orders"], 1);
    assert_eq!(stats["products"], 6);
    assert_eq!(stats["connected"], true);

    db.close().await;
}
