use axum::{extract::State, Json};
use serde::Deserialize;

use crate::error::AppResult;
use crate::routes::AppState;
use crate::services::recommendations;

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default)]
    pub liked: Vec<String>,
    #[serde(default)]
    pub watched: Vec<String>,
}

/// Handler for recommendations endpoint
pub async fn recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<Vec<String>>> {
    let suggestions = recommendations::get_recommendations(
        state.completions.as_ref(),
        request.liked,
        request.watched,
    )
    .await?;

    Ok(Json(suggestions))
}
