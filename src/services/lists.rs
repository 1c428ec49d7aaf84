use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{ListEntry, ListKind};

/// Snapshot of the movie taken when it is added to a list, so list pages
/// render without a catalog round trip
#[derive(Debug, Clone)]
pub struct NewListEntry {
    pub movie_id: String,
    pub title: String,
    pub poster_path: Option<String>,
    pub release_year: Option<i32>,
}

/// Storage seam for the per-user watchlist / liked / watched lists
#[async_trait::async_trait]
pub trait ListStore: Send + Sync {
    /// Adds the movie to the list, overwriting the snapshot if already present
    async fn upsert_entry(
        &self,
        user_id: Uuid,
        kind: ListKind,
        entry: NewListEntry,
    ) -> AppResult<ListEntry>;

    /// Removes the movie from the list; `false` when it was not on it
    async fn remove_entry(&self, user_id: Uuid, kind: ListKind, movie_id: &str)
        -> AppResult<bool>;

    /// All entries on the list, newest first
    async fn list_entries(&self, user_id: Uuid, kind: ListKind) -> AppResult<Vec<ListEntry>>;
}

/// Adds a movie to one of the caller's lists
pub async fn add_to_list(
    store: &dyn ListStore,
    user_id: Uuid,
    kind: ListKind,
    entry: NewListEntry,
) -> AppResult<ListEntry> {
    if entry.movie_id.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "movie id cannot be empty".to_string(),
        ));
    }
    if entry.title.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "movie title cannot be empty".to_string(),
        ));
    }

    let entry = store.upsert_entry(user_id, kind, entry).await?;
    tracing::info!(
        user_id = %user_id,
        kind = %kind,
        movie_id = %entry.movie_id,
        "List entry added"
    );
    Ok(entry)
}

/// Removes a movie from one of the caller's lists
pub async fn remove_from_list(
    store: &dyn ListStore,
    user_id: Uuid,
    kind: ListKind,
    movie_id: &str,
) -> AppResult<()> {
    let removed = store.remove_entry(user_id, kind, movie_id).await?;
    if !removed {
        return Err(AppError::NotFound(format!(
            "movie '{}' is not on the {} list",
            movie_id, kind
        )));
    }
    Ok(())
}

/// PostgreSQL-backed list storage
#[derive(Clone)]
pub struct PgListStore {
    pool: PgPool,
}

impl PgListStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ListStore for PgListStore {
    async fn upsert_entry(
        &self,
        user_id: Uuid,
        kind: ListKind,
        entry: NewListEntry,
    ) -> AppResult<ListEntry> {
        let added_at = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO list_entries (user_id, kind, movie_id, title, poster_path, release_year, added_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, kind, movie_id)
            DO UPDATE SET title = $4, poster_path = $5, release_year = $6
            "#,
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(&entry.movie_id)
        .bind(&entry.title)
        .bind(&entry.poster_path)
        .bind(entry.release_year)
        .bind(added_at)
        .execute(&self.pool)
        .await?;

        Ok(ListEntry {
            movie_id: entry.movie_id,
            title: entry.title,
            poster_path: entry.poster_path,
            release_year: entry.release_year,
            added_at,
        })
    }

    async fn remove_entry(
        &self,
        user_id: Uuid,
        kind: ListKind,
        movie_id: &str,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM list_entries WHERE user_id = $1 AND kind = $2 AND movie_id = $3",
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(movie_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_entries(&self, user_id: Uuid, kind: ListKind) -> AppResult<Vec<ListEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT movie_id, title, poster_path, release_year, added_at
            FROM list_entries
            WHERE user_id = $1 AND kind = $2
            ORDER BY added_at DESC
            "#,
        )
        .bind(user_id)
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| ListEntry {
                movie_id: r.get("movie_id"),
                title: r.get("title"),
                poster_path: r.get("poster_path"),
                release_year: r.get("release_year"),
                added_at: r.get("added_at"),
            })
            .collect())
    }
}

/// In-memory list storage for tests
#[derive(Default)]
pub struct MemoryListStore {
    entries: std::sync::Mutex<Vec<(Uuid, ListKind, ListEntry)>>,
}

impl MemoryListStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ListStore for MemoryListStore {
    async fn upsert_entry(
        &self,
        user_id: Uuid,
        kind: ListKind,
        entry: NewListEntry,
    ) -> AppResult<ListEntry> {
        let mut entries = self.entries.lock().expect("list store poisoned");
        entries.retain(|(u, k, e)| !(*u == user_id && *k == kind && e.movie_id == entry.movie_id));

        let entry = ListEntry {
            movie_id: entry.movie_id,
            title: entry.title,
            poster_path: entry.poster_path,
            release_year: entry.release_year,
            added_at: Utc::now(),
        };
        entries.push((user_id, kind, entry.clone()));
        Ok(entry)
    }

    async fn remove_entry(
        &self,
        user_id: Uuid,
        kind: ListKind,
        movie_id: &str,
    ) -> AppResult<bool> {
        let mut entries = self.entries.lock().expect("list store poisoned");
        let before = entries.len();
        entries.retain(|(u, k, e)| !(*u == user_id && *k == kind && e.movie_id == movie_id));
        Ok(entries.len() < before)
    }

    async fn list_entries(&self, user_id: Uuid, kind: ListKind) -> AppResult<Vec<ListEntry>> {
        let entries = self.entries.lock().expect("list store poisoned");
        let mut result: Vec<ListEntry> = entries
            .iter()
            .filter(|(u, k, _)| *u == user_id && *k == kind)
            .map(|(_, _, e)| e.clone())
            .collect();
        result.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(movie_id: &str, title: &str) -> NewListEntry {
        NewListEntry {
            movie_id: movie_id.to_string(),
            title: title.to_string(),
            poster_path: None,
            release_year: Some(1999),
        }
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let store = MemoryListStore::new();
        let user = Uuid::new_v4();

        add_to_list(&store, user, ListKind::Watchlist, entry("603", "The Matrix"))
            .await
            .unwrap();

        let entries = store.list_entries(user, ListKind::Watchlist).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "The Matrix");

        // Other lists and other users are untouched
        assert!(store
            .list_entries(user, ListKind::Liked)
            .await
            .unwrap()
            .is_empty());
        assert!(store
            .list_entries(Uuid::new_v4(), ListKind::Watchlist)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_re_add_overwrites_snapshot() {
        let store = MemoryListStore::new();
        let user = Uuid::new_v4();

        add_to_list(&store, user, ListKind::Liked, entry("603", "Matrix"))
            .await
            .unwrap();
        add_to_list(&store, user, ListKind::Liked, entry("603", "The Matrix"))
            .await
            .unwrap();

        let entries = store.list_entries(user, ListKind::Liked).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "The Matrix");
    }

    #[tokio::test]
    async fn test_remove_missing_entry_is_not_found() {
        let store = MemoryListStore::new();
        let user = Uuid::new_v4();

        let result = remove_from_list(&store, user, ListKind::Watched, "603").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_empty_movie_id_rejected() {
        let store = MemoryListStore::new();
        let user = Uuid::new_v4();

        let result = add_to_list(&store, user, ListKind::Watchlist, entry(" ", "x")).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
