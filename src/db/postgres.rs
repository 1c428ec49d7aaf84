use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};

/// Creates the PostgreSQL connection pool
///
/// Vote writes hold short row locks, so the pool stays small and acquisition
/// fails fast rather than queueing callers behind a stuck connection.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;

    Ok(pool)
}
