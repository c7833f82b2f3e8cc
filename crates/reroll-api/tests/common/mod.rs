//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use reroll_core::clock::Clock;
use reroll_core::rng::DeterministicRng;
use reroll_event_store::MemoryEventRepository;
use reroll_generation::TurnGenerator;
use reroll_test_support::{FixedClock, SequenceRng};
use tower::ServiceExt;

use reroll_api::routes;
use reroll_api::state::AppState;

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock + Send + Sync> {
    Arc::new(FixedClock(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 1, 15, 10, 0, 0).unwrap(),
    ))
}

/// Build the full app router with an in-memory event store and a
/// deterministic clock. Uses the same route structure as `main.rs`.
pub fn build_test_app(generator: Arc<dyn TurnGenerator>) -> Router {
    build_test_app_with_rng(generator, SequenceRng::new(vec![]))
}

/// Build the full app router with a custom `SequenceRng` for tests that
/// need deterministic action-point recovery rolls.
pub fn build_test_app_with_rng(generator: Arc<dyn TurnGenerator>, rng: SequenceRng) -> Router {
    let clock = fixed_clock();
    let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(rng));
    let event_repository = Arc::new(MemoryEventRepository::new());
    let app_state = AppState::new(clock, rng, event_repository, generator);

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/sessions", routes::sessions::router())
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

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Send a DELETE request and return the response.
pub async fn delete_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value =
        serde_json::from_slice(&body_bytes).unwrap_or(serde_json::Value::Null);

    (status, json)
}
