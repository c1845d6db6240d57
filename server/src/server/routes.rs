//! HTTP route handlers for the overlay API

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::Serialize;

use crate::config::StoreConfig;
use crate::overlay::{Overlay, OverlayCategory, OverlayError, OverlayStore};
use crate::protocol::{
    AddOverlayParams, ClearParams, ClearScope, CongestionState, OverlaysResponse, RemoteUpdate,
};

/// Default request body limit for overlay payloads
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: OverlayStore,
    pub max_body_size: usize,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            store: OverlayStore::new(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    pub fn with_store(mut self, store: OverlayStore) -> Self {
        self.store = store;
        self
    }

    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }
}

/// Build the application state for `store`, seeding it from the store
/// configuration (body limit and optional startup location marker)
pub async fn build_state(store: OverlayStore, config: &StoreConfig) -> AppState {
    if let Some(position) = config.seed_location {
        tracing::info!("Seeding location marker at {}, {}", position.lat, position.lon);
        store
            .add_overlay_with(Overlay::location(position), true)
            .await;
    }

    AppState::new()
        .with_store(store)
        .with_max_body_size(config.max_update_size)
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Error response for the overlay API
#[derive(Debug, Serialize)]
pub struct OverlayErrorResponse {
    pub error: String,
    pub code: String,
}

impl From<OverlayError> for OverlayErrorResponse {
    fn from(e: OverlayError) -> Self {
        let code = match &e {
            OverlayError::InvalidArgument(_) => "invalid_argument",
            OverlayError::NotFound(_) => "not_found",
        };
        Self {
            error: e.to_string(),
            code: code.to_string(),
        }
    }
}

impl IntoResponse for OverlayErrorResponse {
    fn into_response(self) -> Response {
        let status = match self.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "invalid_argument" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub overlays: usize,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        overlays: state.store.len().await,
    })
}

/// GET /api/overlays - Current draw list
pub async fn list_overlays(State(state): State<AppState>) -> Json<OverlaysResponse> {
    Json(state.store.snapshot().await)
}

/// POST /api/overlays?system=bool - Add a single overlay
pub async fn add_overlay(
    State(state): State<AppState>,
    Query(params): Query<AddOverlayParams>,
    Json(overlay): Json<Overlay>,
) -> Result<(StatusCode, Json<Overlay>), OverlayErrorResponse> {
    overlay.validate().map_err(|e| {
        tracing::warn!("Rejected overlay {}: {}", overlay.id(), e);
        OverlayErrorResponse::from(e)
    })?;

    if !params.system && overlay.category() == OverlayCategory::Location {
        tracing::warn!("Rejected location overlay {} as data overlay", overlay.id());
        return Err(OverlayError::InvalidArgument(
            "location overlays must be added as system overlays".to_string(),
        )
        .into());
    }

    state
        .store
        .try_add_overlay_with(overlay.clone(), params.system)
        .await
        .map_err(|e| {
            tracing::warn!("Rejected overlay {}: {}", overlay.id(), e);
            OverlayErrorResponse::from(e)
        })?;

    Ok((StatusCode::CREATED, Json(overlay)))
}

/// DELETE /api/overlays?scope=data|all - Clear overlays
pub async fn clear_overlays(
    State(state): State<AppState>,
    Query(params): Query<ClearParams>,
) -> StatusCode {
    match params.scope {
        ClearScope::Data => state.store.clear_overlays().await,
        ClearScope::All => state.store.clear_all_overlays().await,
    }
    StatusCode::NO_CONTENT
}

/// GET /api/overlays/location - The current position marker
pub async fn get_location(State(state): State<AppState>) -> Response {
    match state.store.location_overlay().await {
        Some(location) => (StatusCode::OK, Json(Overlay::Location(location))).into_response(),
        None => OverlayErrorResponse::from(OverlayError::NotFound(
            "no location overlay".to_string(),
        ))
        .into_response(),
    }
}

/// PUT /api/route - Set the active route
pub async fn put_route(
    State(state): State<AppState>,
    Json(overlay): Json<Overlay>,
) -> Result<Json<Overlay>, OverlayErrorResponse> {
    if !overlay.is_route() {
        return Err(OverlayError::InvalidArgument(format!(
            "expected a route overlay, got {}",
            overlay.category().as_str()
        ))
        .into());
    }
    overlay.validate().map_err(|e| {
        tracing::warn!("Rejected route {}: {}", overlay.id(), e);
        OverlayErrorResponse::from(e)
    })?;

    state
        .store
        .try_add_overlay_with(overlay.clone(), true)
        .await
        .map_err(|e| {
            tracing::warn!("Rejected route {}: {}", overlay.id(), e);
            OverlayErrorResponse::from(e)
        })?;
    Ok(Json(overlay))
}

/// DELETE /api/route - Drop the active route (no-op without one)
pub async fn delete_route(State(state): State<AppState>) -> StatusCode {
    state.store.delete_route_overlay().await;
    StatusCode::NO_CONTENT
}

/// GET /api/congestion
pub async fn get_congestion(State(state): State<AppState>) -> Json<CongestionState> {
    Json(CongestionState {
        has_congestions: state.store.has_congestions().await,
    })
}

/// PUT /api/congestion
pub async fn put_congestion(
    State(state): State<AppState>,
    Json(body): Json<CongestionState>,
) -> Json<CongestionState> {
    state.store.set_has_congestions(body.has_congestions).await;
    Json(body)
}

/// POST /api/update - Ingest one server payload
pub async fn apply_update(
    State(state): State<AppState>,
    Json(update): Json<RemoteUpdate>,
) -> Result<Json<OverlaysResponse>, OverlayErrorResponse> {
    update.validate().map_err(|e| {
        tracing::warn!("Rejected remote update: {}", e);
        OverlayErrorResponse::from(e)
    })?;

    state
        .store
        .try_apply_remote_update(update)
        .await
        .map_err(|e| {
            tracing::warn!("Rejected remote update: {}", e);
            OverlayErrorResponse::from(e)
        })?;
    Ok(Json(state.store.snapshot().await))
}

/// Build the overlay API routes
pub fn overlay_routes(max_body_size: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/overlays",
            get(list_overlays).post(add_overlay).delete(clear_overlays),
        )
        .route("/overlays/location", get(get_location))
        .route("/route", put(put_route).delete(delete_route))
        .route("/congestion", get(get_congestion).put(put_congestion))
        .route("/update", post(apply_update))
        .layer(DefaultBodyLimit::max(max_body_size))
}

/// Full application router without the transport layers
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", overlay_routes(state.max_body_size))
        .with_state(state)
}
