use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::models::{ListKind, SharedList};
use crate::routes::{require_user_id, AppState};
use crate::services::share;

#[derive(Debug, Deserialize)]
pub struct ShareRequest {
    pub kind: ListKind,
}

#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub slug: String,
}

/// Handler for sharing one of the caller's lists
///
/// Sharing the same list again returns the same slug.
pub async fn create_share(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ShareRequest>,
) -> AppResult<(StatusCode, Json<ShareResponse>)> {
    let user_id = require_user_id(&headers)?;

    let slug = share::create_share(state.shares.as_ref(), user_id, request.kind).await?;
    Ok((StatusCode::CREATED, Json(ShareResponse { slug })))
}

/// Handler for resolving a share link, no authentication required
pub async fn resolve_share(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<SharedList>> {
    let shared =
        share::resolve_share(state.shares.as_ref(), state.lists.as_ref(), &slug).await?;
    Ok(Json(shared))
}
