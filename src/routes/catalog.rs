use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::models::{CastMember, Genre, Movie, ProviderAvailability, Trailer};
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    q: String,
}

/// Handler for movie title search
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<Movie>>> {
    let movies = state.catalog.search_movies(&params.q).await?;
    Ok(Json(movies))
}

/// Handler for the genre list
pub async fn genres(State(state): State<AppState>) -> AppResult<Json<Vec<Genre>>> {
    let genres = state.catalog.list_genres().await?;
    Ok(Json(genres))
}

/// Handler for a movie's streaming providers
pub async fn providers(
    State(state): State<AppState>,
    Path(movie_id): Path<String>,
) -> AppResult<Json<Vec<ProviderAvailability>>> {
    let providers = state.catalog.watch_providers(&movie_id).await?;
    Ok(Json(providers))
}

/// Handler for a movie's top-billed cast
pub async fn credits(
    State(state): State<AppState>,
    Path(movie_id): Path<String>,
) -> AppResult<Json<Vec<CastMember>>> {
    let cast = state.catalog.cast(&movie_id).await?;
    Ok(Json(cast))
}

/// Handler for a movie's trailers
pub async fn trailers(
    State(state): State<AppState>,
    Path(movie_id): Path<String>,
) -> AppResult<Json<Vec<Trailer>>> {
    let trailers = state.catalog.trailers(&movie_id).await?;
    Ok(Json(trailers))
}

/// Handler for movies similar to the given one
pub async fn similar(
    State(state): State<AppState>,
    Path(movie_id): Path<String>,
) -> AppResult<Json<Vec<Movie>>> {
    let movies = state.catalog.similar(&movie_id).await?;
    Ok(Json(movies))
}
