use std::sync::Arc;

use crate::services::catalog::MovieCatalog;
use crate::services::lists::ListStore;
use crate::services::recommendations::CompletionClient;
use crate::services::share::ShareStore;
use crate::services::votes::{VoteAggregator, VoteStore};

/// Shared application state
///
/// Every collaborator sits behind a trait object, so the same router serves
/// Postgres/Redis/TMDB in production and in-memory fakes in tests.
#[derive(Clone)]
pub struct AppState {
    pub votes: Arc<dyn VoteStore>,
    pub aggregator: Arc<VoteAggregator>,
    pub lists: Arc<dyn ListStore>,
    pub shares: Arc<dyn ShareStore>,
    pub catalog: Arc<dyn MovieCatalog>,
    pub completions: Arc<dyn CompletionClient>,
}
