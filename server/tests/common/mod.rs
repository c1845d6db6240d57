//! Common Test Utilities for Integration Tests
//!
//! Shared helpers used across integration test modules.

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use serde::de::DeserializeOwned;
use tower::util::ServiceExt;
use trafficjam_server::overlay::{CongestionLevel, GeoPoint, Overlay};
use trafficjam_server::{AppState, app_router};

/// Create a test application router around an existing state
pub fn create_test_app_from_state(app_state: AppState) -> Router {
    app_router(app_state)
}

/// Create a test application router with state
pub fn create_test_app_with_state() -> (Router, AppState) {
    let app_state = AppState::new();
    let app = app_router(app_state.clone());
    (app, app_state)
}

/// Create a test application router
pub fn create_test_app() -> Router {
    create_test_app_with_state().0
}

pub fn point(lat: f64, lon: f64) -> GeoPoint {
    GeoPoint { lat, lon }
}

pub fn test_route() -> Overlay {
    Overlay::route(vec![point(51.5136, 7.4653), point(51.4556, 7.0116)])
}

pub fn test_location() -> Overlay {
    Overlay::location(point(51.5136, 7.4653))
}

pub fn test_congestion() -> Overlay {
    Overlay::congestion(
        vec![point(51.51, 7.46), point(51.52, 7.48)],
        CongestionLevel::Standstill,
    )
}

pub fn test_marker(label: &str) -> Overlay {
    Overlay::marker(point(51.50, 7.45), label)
}

/// Send a request with an optional JSON body and return the status and raw body
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

/// Parse a JSON response body
pub fn parse<T: DeserializeOwned>(body: &[u8]) -> T {
    serde_json::from_slice(body).expect("Failed to parse response body")
}
