use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, Bytes, to_bytes},
    http::{Request, Response, StatusCode},
    routing,
};
use futures::stream;
use serde_json::{Value, json};
use shopfront::{
    AdapterError,
    config::Config,
    serverless::{Adapter, Export, ModuleLoader, RequestHandler},
};
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::time::Instant;

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("failed to build request")
}

async fn body_json(resp: Response<Body>) -> Value {
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&body).expect("response body was not JSON")
}

/// Handler that counts invocations and answers with a fixed body.
#[derive(Default)]
struct CountingHandler {
    calls: AtomicUsize,
}

#[async_trait]
impl RequestHandler for CountingHandler {
    async fn handle(&self, _req: Request<Body>) -> Response<Body> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Response::new(Body::from("handled"))
    }
}

/// Loader whose export is produced by a closure; counts how often it runs.
struct FnLoader<F> {
    make: F,
    loads: AtomicUsize,
}

impl<F> FnLoader<F> {
    fn new(make: F) -> Arc<Self> {
        Arc::new(Self {
            make,
            loads: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl<F> ModuleLoader for FnLoader<F>
where
    F: Fn(usize) -> Result<Export, AdapterError> + Send + Sync,
{
    async fn load(&self, _config: &Config) -> Result<Export, AdapterError> {
        let n = self.loads.fetch_add(1, Ordering::SeqCst);
        (self.make)(n)
    }
}

#[tokio::test]
async fn default_application_serves_requests_in_hosted_mode() {
    let adapter = Adapter::new(&Config::default());
    assert!(adapter.config().is_hosted());
    assert!(adapter.config().is_production());

    let resp = adapter
        .handle(get("/api/health"), None)
        .await
        .expect("invocation succeeds");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["status"], "OK");

    let resp = adapter
        .handle(get("/api/products/1"), None)
        .await
        .expect("invocation succeeds");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["id"], 1);

    let resp = adapter
        .handle(get("/nowhere"), None)
        .await
        .expect("invocation succeeds");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await, json!({ "error": "Route not found" }));
}

#[tokio::test]
async fn non_invocable_exports_answer_with_a_configuration_error() {
    let handler = Arc::new(CountingHandler::default());

    let cases: Vec<(Box<dyn Fn() -> Export + Send + Sync>, &str)> = vec![
        (Box::new(|| Export::Null), "application export is null"),
        (
            Box::new(|| Export::Scalar("string".to_string())),
            "application export is a string, expected a request handler",
        ),
        (
            Box::new(|| Export::Default(Box::new(Export::Object(None)))),
            "application export is an object without a request handler",
        ),
        (
            {
                let handler = handler.clone();
                Box::new(move || {
                    let member: Arc<dyn RequestHandler> = handler.clone();
                    Export::Default(Box::new(Export::Default(Box::new(Export::Object(Some(
                        member,
                    ))))))
                })
            },
            "application export nests more than one default wrapper",
        ),
    ];

    for (make, message) in cases {
        let adapter = Adapter::with_loader(&Config::default(), FnLoader::new(move |_| Ok(make())));
        let resp = adapter
            .handle(get("/api/health"), None)
            .await
            .expect("configuration errors are not propagated");
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(resp).await,
            json!({ "error": "Server configuration error", "message": message })
        );
    }
    assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn member_handlers_are_invoked_and_cached() {
    let handler = Arc::new(CountingHandler::default());
    let member = handler.clone();
    let loader = FnLoader::new(move |_| {
        let member: Arc<dyn RequestHandler> = member.clone();
        Ok(Export::Default(Box::new(Export::Object(Some(member)))))
    });
    let adapter = Adapter::with_loader(&Config::default(), loader.clone());

    for _ in 0..3 {
        let resp = adapter
            .handle(get("/anything"), None)
            .await
            .expect("invocation succeeds");
        let body = to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("failed to read response body");
        assert_eq!(body, Bytes::from_static(b"handled"));
    }
    assert_eq!(handler.calls.load(Ordering::SeqCst), 3);
    assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn load_failures_become_generic_errors_and_are_retried() {
    let loader = FnLoader::new(|n| {
        if n == 0 {
            Err(AdapterError::Load("module not found".to_string()))
        } else {
            Ok(Export::Callable(
                Router::new().route("/ping", routing::get(|| async { "pong" })),
            ))
        }
    });
    let adapter = Adapter::with_loader(&Config::default(), loader.clone());

    let resp = adapter
        .handle(get("/ping"), None)
        .await
        .expect("load errors are not propagated");
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(resp).await,
        json!({ "error": "Internal server error", "message": "An unexpected error occurred" })
    );

    let resp = adapter
        .handle(get("/ping"), None)
        .await
        .expect("second invocation succeeds");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn panics_inside_the_application_become_generic_errors() {
    struct Panicking;

    #[async_trait]
    impl RequestHandler for Panicking {
        async fn handle(&self, _req: Request<Body>) -> Response<Body> {
            panic!("handler exploded");
        }
    }

    let loader = FnLoader::new(|_| {
        let member: Arc<dyn RequestHandler> = Arc::new(Panicking);
        Ok(Export::Object(Some(member)))
    });
    let adapter = Adapter::with_loader(&Config::default(), loader);
    let resp = adapter
        .handle(get("/"), None)
        .await
        .expect("panics are not propagated");
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(resp).await["error"], "Internal server error");
}

#[tokio::test]
async fn response_stream_errors_reject_the_invocation() {
    let loader = FnLoader::new(|_| {
        let app = Router::new().route(
            "/broken",
            routing::get(|| async {
                let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
                    Ok(Bytes::from_static(b"partial")),
                    Err(std::io::Error::other("connection reset")),
                ];
                Body::from_stream(stream::iter(chunks))
            }),
        );
        Ok(Export::Callable(app))
    });
    let adapter = Adapter::with_loader(&Config::default(), loader);
    let outcome = adapter.handle(get("/broken"), None).await;
    assert!(matches!(outcome, Err(AdapterError::Transport(_))));
}

#[tokio::test]
async fn deadline_closes_a_stalled_response() {
    let loader = FnLoader::new(|_| {
        let app = Router::new().route(
            "/slow",
            routing::get(|| async {
                let head = stream::iter(vec![Ok::<_, std::io::Error>(Bytes::from_static(
                    b"head",
                ))]);
                let stalled = stream::pending::<Result<Bytes, std::io::Error>>();
                Body::from_stream(futures::StreamExt::chain(head, stalled))
            }),
        );
        Ok(Export::Callable(app))
    });
    let adapter = Adapter::with_loader(&Config::default(), loader);

    let deadline = Instant::now() + Duration::from_millis(100);
    let resp = adapter
        .handle(get("/slow"), Some(deadline))
        .await
        .expect("close resolves the invocation");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    assert_eq!(body, Bytes::from_static(b"head"));
}
