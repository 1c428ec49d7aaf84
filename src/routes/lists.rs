use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::models::ListEntry;
use crate::routes::{parse_list_kind, require_user_id, AppState};
use crate::services::lists::{self, NewListEntry};

#[derive(Debug, Deserialize)]
pub struct AddEntryRequest {
    pub title: String,
    pub poster_path: Option<String>,
    pub release_year: Option<i32>,
}

/// Handler for reading one of the caller's lists
pub async fn get_list(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    headers: HeaderMap,
) -> AppResult<Json<Vec<ListEntry>>> {
    let user_id = require_user_id(&headers)?;
    let kind = parse_list_kind(&kind)?;

    let entries = state.lists.list_entries(user_id, kind).await?;
    Ok(Json(entries))
}

/// Handler for adding a movie to a list
pub async fn add_entry(
    State(state): State<AppState>,
    Path((kind, movie_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(request): Json<AddEntryRequest>,
) -> AppResult<(StatusCode, Json<ListEntry>)> {
    let user_id = require_user_id(&headers)?;
    let kind = parse_list_kind(&kind)?;

    let entry = lists::add_to_list(
        state.lists.as_ref(),
        user_id,
        kind,
        NewListEntry {
            movie_id,
            title: request.title,
            poster_path: request.poster_path,
            release_year: request.release_year,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

/// Handler for removing a movie from a list
pub async fn remove_entry(
    State(state): State<AppState>,
    Path((kind, movie_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> AppResult<StatusCode> {
    let user_id = require_user_id(&headers)?;
    let kind = parse_list_kind(&kind)?;

    lists::remove_from_list(state.lists.as_ref(), user_id, kind, &movie_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
