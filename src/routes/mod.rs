use axum::{
    http::{HeaderMap, StatusCode},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};
use crate::models::ListKind;

pub mod catalog;
pub mod lists;
pub mod recommendations;
pub mod share;
pub mod state;
pub mod votes;

pub use state::AppState;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .route("/search", get(catalog::search))
        .route("/genres", get(catalog::genres))
        .route("/movies/:id/providers", get(catalog::providers))
        .route("/movies/:id/credits", get(catalog::credits))
        .route("/movies/:id/trailers", get(catalog::trailers))
        .route("/movies/:id/similar", get(catalog::similar))
        // Votes
        .route("/movies/:id/vote", put(votes::cast_vote).get(votes::get_own_vote))
        .route("/movies/:id/votes", get(votes::get_votes))
        // Lists
        .route("/lists/:kind", get(lists::get_list))
        .route("/lists/:kind/:movie_id", put(lists::add_entry))
        .route("/lists/:kind/:movie_id", delete(lists::remove_entry))
        // Sharing
        .route("/shares", post(share::create_share))
        .route("/shares/:slug", get(share::resolve_share))
        // Recommendations
        .route("/recommendations", post(recommendations::recommend))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Identifies the calling user from the `x-user-id` header
pub(crate) fn require_user_id(headers: &HeaderMap) -> AppResult<Uuid> {
    headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok())
        .ok_or_else(|| {
            AppError::InvalidInput("missing or invalid x-user-id header".to_string())
        })
}

/// Parses a list kind from a path segment
pub(crate) fn parse_list_kind(kind: &str) -> AppResult<ListKind> {
    kind.parse::<ListKind>().map_err(AppError::InvalidInput)
}
