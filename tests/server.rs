//! HTTP surface: authentication, bad input and health.

mod helpers;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use helpers::{base_url, prober_with, spawn_server, test_config, FakeLookup};
use region_probe::{build_router, Config};

fn app() -> Router {
    let config = Config {
        api_key: Some("s3cret".to_string()),
        ..test_config()
    };
    build_router(Arc::new(prober_with(config, FakeLookup::localhost())))
}

fn post_check(body: impl Into<Body>, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/check")
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(body.into()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_check_requires_bearer_token() {
    let app = app();

    let missing = app
        .clone()
        .oneshot(post_check(r#"{"url":"http://localhost:1/"}"#, None))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong = app
        .oneshot(post_check(r#"{"url":"http://localhost:1/"}"#, Some("nope")))
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(wrong).await["error"], "Unauthorized");
}

#[tokio::test]
async fn test_malformed_input_is_bad_request() {
    let app = app();

    let no_target = app
        .clone()
        .oneshot(post_check("{}", Some("s3cret")))
        .await
        .unwrap();
    assert_eq!(no_target.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(no_target).await["error"]
        .as_str()
        .unwrap()
        .contains("Malformed input"));

    let not_json = app
        .clone()
        .oneshot(post_check("url=http://x", Some("s3cret")))
        .await
        .unwrap();
    assert_eq!(not_json.status(), StatusCode::BAD_REQUEST);

    let bad_url = app
        .oneshot(post_check(r#"{"url":"ftp://example.com/"}"#, Some("s3cret")))
        .await
        .unwrap();
    assert_eq!(bad_url.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_check_returns_result_and_health_counts_it() {
    let target = spawn_server(Router::new().route("/", get(|| async { "ok" }))).await;
    let app = app();

    let body = serde_json::json!({ "url": format!("{}/", base_url(target)), "monitorId": "m-1" });
    let response = app
        .clone()
        .oneshot(post_check(body.to_string(), Some("s3cret")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let result = json_body(response).await;
    assert_eq!(result["status"], "up");
    assert_eq!(result["statusCode"], 200);
    assert_eq!(result["monitorId"], "m-1");
    assert_eq!(result["region"], "test-region");
    assert!(result["timing"]["totalMs"].is_u64());

    let health = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    let health = json_body(health).await;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["region"], "test-region");
    assert_eq!(health["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(health["checks"]["up"], 1);
    assert_eq!(health["checks"]["total"], 1);
}
