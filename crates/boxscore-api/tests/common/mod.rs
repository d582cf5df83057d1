//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use boxscore_test_support::MemoryCache;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use boxscore_api::routes;
use boxscore_api::state::AppState;

/// Build the full app router against real Postgres repositories and
/// an in-memory identity cache. Uses the same route structure as
/// `main.rs`.
pub fn build_test_app(pool: PgPool) -> Router {
    let cache = Arc::new(MemoryCache::new());
    let app_state = AppState::new(pool, cache);

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/games", routes::games::router())
        .nest("/api/v1/players", routes::players::router())
        .nest("/api/v1/teams", routes::teams::router())
        .with_state(app_state)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
