use crate::{
    error::AppResult,
    models::{CastMember, Genre, Movie, ProviderAvailability, Trailer},
};

pub mod tmdb;

pub use tmdb::TmdbCatalog;

/// Movie catalog provider abstraction
///
/// Everything the discovery UI reads about movies comes through this trait:
/// title search, the genre list, and the per-movie detail lookups. Keeping it
/// behind a trait lets tests substitute a canned catalog and keeps the TMDB
/// wire format out of the handlers.
#[async_trait::async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Search movies by title
    async fn search_movies(&self, query: &str) -> AppResult<Vec<Movie>>;

    /// The catalog's full genre list
    async fn list_genres(&self) -> AppResult<Vec<Genre>>;

    /// Streaming services carrying the movie in the configured region
    async fn watch_providers(&self, movie_id: &str) -> AppResult<Vec<ProviderAvailability>>;

    /// Top-billed cast for the movie
    async fn cast(&self, movie_id: &str) -> AppResult<Vec<CastMember>>;

    /// Trailers for the movie
    async fn trailers(&self, movie_id: &str) -> AppResult<Vec<Trailer>>;

    /// Movies similar to the given one
    async fn similar(&self, movie_id: &str) -> AppResult<Vec<Movie>>;
}
