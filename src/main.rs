use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use watchsy::config::Config;
use watchsy::db::{self, Cache};
use watchsy::routes::{create_router, AppState};
use watchsy::services::catalog::TmdbCatalog;
use watchsy::services::lists::PgListStore;
use watchsy::services::recommendations::HttpCompletionClient;
use watchsy::services::share::PgShareStore;
use watchsy::services::votes::{PgVoteStore, VoteAggregator, VoteStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let redis_client = db::create_redis_client(&config.redis_url)?;
    let (cache, cache_writer) = Cache::new(redis_client).await;

    let vote_store: Arc<dyn VoteStore> = Arc::new(PgVoteStore::new(pool.clone()));
    let state = AppState {
        aggregator: Arc::new(VoteAggregator::new(vote_store.clone())),
        votes: vote_store,
        lists: Arc::new(PgListStore::new(pool.clone())),
        shares: Arc::new(PgShareStore::new(pool)),
        catalog: Arc::new(TmdbCatalog::new(
            cache,
            config.tmdb_api_key.clone(),
            config.tmdb_api_url.clone(),
        )),
        completions: Arc::new(HttpCompletionClient::new(
            config.completion_api_key.clone(),
            config.completion_api_url.clone(),
            config.completion_model.clone(),
        )),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Watchsy server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Flush pending cache writes before exiting
    cache_writer.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
