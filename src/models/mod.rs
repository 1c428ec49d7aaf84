use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt::Display, str::FromStr};
use uuid::Uuid;

// ============================================================================
// Votes
// ============================================================================

/// A user's current vote on a movie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteValue {
    Like,
    Dislike,
    /// No vote. A vote record at this value is deleted rather than stored.
    None,
}

impl VoteValue {
    /// Signed representation used by the delta math and the database
    pub fn as_int(self) -> i16 {
        match self {
            VoteValue::Like => 1,
            VoteValue::Dislike => -1,
            VoteValue::None => 0,
        }
    }

    pub fn from_int(value: i16) -> Self {
        match value {
            1 => VoteValue::Like,
            -1 => VoteValue::Dislike,
            _ => VoteValue::None,
        }
    }
}

/// One user's vote record for one subject. Only the latest value is retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub user_id: Uuid,
    pub subject_id: String,
    pub value: VoteValue,
    pub updated_at: DateTime<Utc>,
}

/// Write event handed to the aggregator: the before/after snapshot of a
/// single vote record. Absent records (create/delete) are `VoteValue::None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteEvent {
    pub subject_id: String,
    pub before: VoteValue,
    pub after: VoteValue,
}

/// Public per-subject counters, maintained only by the aggregator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteAggregate {
    pub subject_id: String,
    pub likes: i64,
    pub dislikes: i64,
    /// Always `likes + dislikes`
    pub total: i64,
    pub updated_at: DateTime<Utc>,
}

impl VoteAggregate {
    /// The aggregate shown for a subject nobody has voted on yet
    pub fn zeroed(subject_id: &str) -> Self {
        Self {
            subject_id: subject_id.to_string(),
            likes: 0,
            dislikes: 0,
            total: 0,
            updated_at: Utc::now(),
        }
    }
}

// ============================================================================
// Lists
// ============================================================================

/// The three lists every user has
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Watchlist,
    Liked,
    Watched,
}

impl ListKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ListKind::Watchlist => "watchlist",
            ListKind::Liked => "liked",
            ListKind::Watched => "watched",
        }
    }
}

impl Display for ListKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "watchlist" => Ok(ListKind::Watchlist),
            "liked" => Ok(ListKind::Liked),
            "watched" => Ok(ListKind::Watched),
            other => Err(format!("unknown list kind '{}'", other)),
        }
    }
}

/// One movie on a user's list, with a display snapshot taken at add time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEntry {
    pub movie_id: String,
    pub title: String,
    pub poster_path: Option<String>,
    pub release_year: Option<i32>,
    pub added_at: DateTime<Utc>,
}

/// A read-only view of a shared list, resolved from a slug
#[derive(Debug, Clone, Serialize)]
pub struct SharedList {
    pub slug: String,
    pub kind: ListKind,
    pub entries: Vec<ListEntry>,
}

// ============================================================================
// Catalog
// ============================================================================

/// A movie as returned to clients from catalog search / similar lookups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: String,
    pub title: String,
    pub overview: Option<String>,
    pub release_year: Option<i32>,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityType {
    Subscription,
    Rent,
    Buy,
    Free,
}

/// One streaming service carrying the movie, with how it carries it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderAvailability {
    pub service_name: String,
    pub logo_path: Option<String>,
    pub availability_type: AvailabilityType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    pub name: String,
    pub character: Option<String>,
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trailer {
    pub name: String,
    pub site: String,
    /// Site-specific video key (a YouTube id for site "YouTube")
    pub key: String,
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Raw movie object from TMDB search / similar endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
}

impl From<TmdbMovie> for Movie {
    fn from(movie: TmdbMovie) -> Self {
        // "2010-07-16" -> 2010; empty or malformed dates yield no year
        let release_year = movie
            .release_date
            .as_deref()
            .and_then(|d| d.get(..4))
            .and_then(|y| y.parse::<i32>().ok());

        Movie {
            id: movie.id.to_string(),
            title: movie.title,
            overview: movie.overview.filter(|o| !o.is_empty()),
            release_year,
            poster_path: movie.poster_path,
            vote_average: movie.vote_average,
        }
    }
}

/// Paged TMDB result envelope
#[derive(Debug, Deserialize)]
pub struct TmdbPage<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct TmdbGenreList {
    pub genres: Vec<Genre>,
}

/// TMDB watch/providers response, keyed by country code
#[derive(Debug, Deserialize)]
pub struct TmdbWatchProviders {
    #[serde(default)]
    pub results: HashMap<String, TmdbCountryProviders>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TmdbCountryProviders {
    #[serde(default)]
    pub flatrate: Option<Vec<TmdbProvider>>,
    #[serde(default)]
    pub rent: Option<Vec<TmdbProvider>>,
    #[serde(default)]
    pub buy: Option<Vec<TmdbProvider>>,
    #[serde(default)]
    pub free: Option<Vec<TmdbProvider>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbProvider {
    pub provider_name: String,
    #[serde(default)]
    pub logo_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TmdbCredits {
    #[serde(default)]
    pub cast: Vec<TmdbCastMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCastMember {
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub profile_path: Option<String>,
}

impl From<TmdbCastMember> for CastMember {
    fn from(member: TmdbCastMember) -> Self {
        CastMember {
            name: member.name,
            character: member.character.filter(|c| !c.is_empty()),
            profile_path: member.profile_path,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbVideo {
    pub name: String,
    pub site: String,
    pub key: String,
    #[serde(rename = "type")]
    pub video_type: String,
}
