/// TMDB catalog provider
///
/// Backs every catalog read with themoviedb.org's v3 API:
/// search (/search/movie), genres (/genre/movie/list), and the per-movie
/// lookups (/movie/{id}/watch/providers, /credits, /videos, /similar).
/// Responses are cached in Redis; per-movie details change rarely, so they
/// keep a much longer TTL than searches.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{
        AvailabilityType, CastMember, Genre, Movie, ProviderAvailability, TmdbCountryProviders,
        TmdbCredits, TmdbGenreList, TmdbMovie, TmdbPage, TmdbVideo, TmdbWatchProviders, Trailer,
    },
    services::catalog::MovieCatalog,
};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;

const SEARCH_CACHE_TTL: u64 = 3600; // 1 hour
const DETAIL_CACHE_TTL: u64 = 604800; // 1 week

/// Region used for watch-provider lookups
const WATCH_REGION: &str = "US";

/// How many cast members a credits lookup returns
const CAST_LIMIT: usize = 12;

#[derive(Clone)]
pub struct TmdbCatalog {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Cache,
}

impl TmdbCatalog {
    pub fn new(cache: Cache, api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            cache,
        }
    }

    /// Fetches and deserializes one TMDB endpoint
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let parsed = response.json::<T>().await?;
        Ok(parsed)
    }

    /// Flattens one country's provider buckets into availability entries
    fn collect_providers(country: TmdbCountryProviders) -> Vec<ProviderAvailability> {
        let buckets = [
            (country.flatrate, AvailabilityType::Subscription),
            (country.free, AvailabilityType::Free),
            (country.rent, AvailabilityType::Rent),
            (country.buy, AvailabilityType::Buy),
        ];

        let mut providers = Vec::new();
        for (bucket, availability_type) in buckets {
            for provider in bucket.unwrap_or_default() {
                providers.push(ProviderAvailability {
                    service_name: provider.provider_name,
                    logo_path: provider.logo_path,
                    availability_type: availability_type.clone(),
                });
            }
        }
        providers
    }

    /// Keeps only YouTube-hosted trailers out of a movie's video list
    fn filter_trailers(videos: Vec<TmdbVideo>) -> Vec<Trailer> {
        videos
            .into_iter()
            .filter(|v| v.site == "YouTube" && v.video_type == "Trailer")
            .map(|v| Trailer {
                name: v.name,
                site: v.site,
                key: v.key,
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl MovieCatalog for TmdbCatalog {
    async fn search_movies(&self, query: &str) -> AppResult<Vec<Movie>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::MovieSearch(query.to_string()),
            SEARCH_CACHE_TTL,
            async move {
                let page: TmdbPage<TmdbMovie> = self
                    .get_json("/search/movie", &[("query", query), ("include_adult", "false")])
                    .await?;

                let movies: Vec<Movie> = page.results.into_iter().map(Movie::from).collect();

                tracing::info!(
                    query = %query,
                    results = movies.len(),
                    provider = "tmdb",
                    "Movie search completed"
                );

                Ok::<_, AppError>(movies)
            }
        )
    }

    async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        cached!(self.cache, CacheKey::Genres, DETAIL_CACHE_TTL, async move {
            let list: TmdbGenreList = self.get_json("/genre/movie/list", &[]).await?;
            Ok::<_, AppError>(list.genres)
        })
    }

    async fn watch_providers(&self, movie_id: &str) -> AppResult<Vec<ProviderAvailability>> {
        cached!(
            self.cache,
            CacheKey::Providers(movie_id.to_string()),
            DETAIL_CACHE_TTL,
            async move {
                let path = format!("/movie/{}/watch/providers", movie_id);
                let mut response: TmdbWatchProviders = self.get_json(&path, &[]).await?;

                let providers = response
                    .results
                    .remove(WATCH_REGION)
                    .map(Self::collect_providers)
                    .unwrap_or_default();

                tracing::info!(
                    movie_id = %movie_id,
                    region = WATCH_REGION,
                    services = providers.len(),
                    provider = "tmdb",
                    "Watch providers fetched"
                );

                Ok::<_, AppError>(providers)
            }
        )
    }

    async fn cast(&self, movie_id: &str) -> AppResult<Vec<CastMember>> {
        cached!(
            self.cache,
            CacheKey::Credits(movie_id.to_string()),
            DETAIL_CACHE_TTL,
            async move {
                let path = format!("/movie/{}/credits", movie_id);
                let credits: TmdbCredits = self.get_json(&path, &[]).await?;

                let cast: Vec<CastMember> = credits
                    .cast
                    .into_iter()
                    .take(CAST_LIMIT)
                    .map(CastMember::from)
                    .collect();

                Ok::<_, AppError>(cast)
            }
        )
    }

    async fn trailers(&self, movie_id: &str) -> AppResult<Vec<Trailer>> {
        cached!(
            self.cache,
            CacheKey::Trailers(movie_id.to_string()),
            DETAIL_CACHE_TTL,
            async move {
                let path = format!("/movie/{}/videos", movie_id);
                let page: TmdbPage<TmdbVideo> = self.get_json(&path, &[]).await?;
                Ok::<_, AppError>(Self::filter_trailers(page.results))
            }
        )
    }

    async fn similar(&self, movie_id: &str) -> AppResult<Vec<Movie>> {
        cached!(
            self.cache,
            CacheKey::Similar(movie_id.to_string()),
            DETAIL_CACHE_TTL,
            async move {
                let path = format!("/movie/{}/similar", movie_id);
                let page: TmdbPage<TmdbMovie> = self.get_json(&path, &[]).await?;
                Ok::<_, AppError>(page.results.into_iter().map(Movie::from).collect())
            }
        )
    }
}
