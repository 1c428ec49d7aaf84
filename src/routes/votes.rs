use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::models::{VoteAggregate, VoteValue};
use crate::routes::{require_user_id, AppState};
use crate::services::votes;

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub value: VoteValue,
}

/// Handler for casting, changing, or clearing a vote
///
/// The caller's previous vote becomes the event's before-state; the aggregate
/// returned reflects this write.
pub async fn cast_vote(
    State(state): State<AppState>,
    Path(movie_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<VoteRequest>,
) -> AppResult<Json<VoteAggregate>> {
    let user_id = require_user_id(&headers)?;

    let aggregate = votes::record_vote(
        &state.votes,
        &state.aggregator,
        user_id,
        &movie_id,
        request.value,
    )
    .await?;

    Ok(Json(aggregate))
}

#[derive(Debug, Serialize)]
pub struct VoteStatusResponse {
    pub value: VoteValue,
}

/// Handler for the caller's own vote on a movie
///
/// Lets the UI highlight the active vote button; absent votes read as "none".
pub async fn get_own_vote(
    State(state): State<AppState>,
    Path(movie_id): Path<String>,
    headers: HeaderMap,
) -> AppResult<Json<VoteStatusResponse>> {
    let user_id = require_user_id(&headers)?;

    let value = votes::get_user_vote(&state.votes, user_id, &movie_id)
        .await?
        .map(|vote| vote.value)
        .unwrap_or(VoteValue::None);

    Ok(Json(VoteStatusResponse { value }))
}

/// Handler for the public vote counters of a movie
pub async fn get_votes(
    State(state): State<AppState>,
    Path(movie_id): Path<String>,
) -> AppResult<Json<VoteAggregate>> {
    let aggregate = votes::get_aggregate(&state.votes, &movie_id).await?;
    Ok(Json(aggregate))
}
