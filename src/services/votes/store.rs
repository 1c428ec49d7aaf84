use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Vote, VoteAggregate, VoteValue};
use crate::services::votes::delta::VoteDelta;

/// Error surface of one aggregate transaction attempt
///
/// `Conflict` covers the transient cases the aggregator retries (serialization
/// failures and the insert race on a brand-new aggregate row). Everything else
/// is terminal and propagates.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("aggregate write conflict")]
    Conflict,

    #[error(transparent)]
    Backend(AppError),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            // 40001 = serialization_failure, 23505 = unique_violation
            if matches!(db_err.code().as_deref(), Some("40001") | Some("23505")) {
                return StoreError::Conflict;
            }
        }
        StoreError::Backend(AppError::Database(e))
    }
}

/// Result of one applied aggregate transaction
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaOutcome {
    pub aggregate: VoteAggregate,
    /// True when a counter had to be floored at zero
    pub clamped: bool,
}

/// Storage seam for votes and their per-subject aggregates
#[async_trait::async_trait]
pub trait VoteStore: Send + Sync {
    /// Writes the user's vote record (delete when `value` is `None`) and
    /// returns the value it replaced, `None` when no record existed.
    async fn write_vote(
        &self,
        user_id: Uuid,
        subject_id: &str,
        value: VoteValue,
    ) -> AppResult<VoteValue>;

    /// The user's current vote record, `None` when they have not voted
    async fn get_vote(&self, user_id: Uuid, subject_id: &str) -> AppResult<Option<Vote>>;

    /// One transactional read-modify-write attempt on the subject's aggregate.
    /// Concurrent attempts on the same subject are serialized, not merged.
    async fn apply_delta(
        &self,
        subject_id: &str,
        delta: VoteDelta,
    ) -> Result<DeltaOutcome, StoreError>;

    /// Reads the public aggregate; `None` when nobody has voted yet
    async fn get_aggregate(&self, subject_id: &str) -> AppResult<Option<VoteAggregate>>;
}

/// PostgreSQL-backed vote storage
#[derive(Clone)]
pub struct PgVoteStore {
    pool: PgPool,
}

impl PgVoteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl VoteStore for PgVoteStore {
    async fn write_vote(
        &self,
        user_id: Uuid,
        subject_id: &str,
        value: VoteValue,
    ) -> AppResult<VoteValue> {
        let mut tx = self.pool.begin().await?;

        // Lock the vote row so concurrent writes by the same user observe a
        // consistent before-value.
        let before = sqlx::query(
            "SELECT value FROM votes WHERE user_id = $1 AND subject_id = $2 FOR UPDATE",
        )
        .bind(user_id)
        .bind(subject_id)
        .fetch_optional(&mut *tx)
        .await?
        .map(|row| VoteValue::from_int(row.get::<i16, _>("value")))
        .unwrap_or(VoteValue::None);

        match value {
            VoteValue::None => {
                sqlx::query("DELETE FROM votes WHERE user_id = $1 AND subject_id = $2")
                    .bind(user_id)
                    .bind(subject_id)
                    .execute(&mut *tx)
                    .await?;
            }
            _ => {
                sqlx::query(
                    r#"
                    INSERT INTO votes (user_id, subject_id, value, updated_at)
                    VALUES ($1, $2, $3, $4)
                    ON CONFLICT (user_id, subject_id)
                    DO UPDATE SET value = $3, updated_at = $4
                    "#,
                )
                .bind(user_id)
                .bind(subject_id)
                .bind(value.as_int())
                .bind(Utc::now())
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(before)
    }

    async fn get_vote(&self, user_id: Uuid, subject_id: &str) -> AppResult<Option<Vote>> {
        let row = sqlx::query(
            "SELECT value, updated_at FROM votes WHERE user_id = $1 AND subject_id = $2",
        )
        .bind(user_id)
        .bind(subject_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Vote {
            user_id,
            subject_id: subject_id.to_string(),
            value: VoteValue::from_int(r.get::<i16, _>("value")),
            updated_at: r.get("updated_at"),
        }))
    }

    async fn apply_delta(
        &self,
        subject_id: &str,
        delta: VoteDelta,
    ) -> Result<DeltaOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT likes, dislikes FROM vote_aggregates WHERE subject_id = $1 FOR UPDATE",
        )
        .bind(subject_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (likes, dislikes) = match &row {
            Some(r) => (r.get::<i64, _>("likes"), r.get::<i64, _>("dislikes")),
            None => (0, 0),
        };

        let new_likes = (likes + delta.likes).max(0);
        let new_dislikes = (dislikes + delta.dislikes).max(0);
        let clamped = likes + delta.likes < 0 || dislikes + delta.dislikes < 0;
        let total = new_likes + new_dislikes;
        let updated_at = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO vote_aggregates (subject_id, likes, dislikes, total, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (subject_id)
            DO UPDATE SET likes = $2, dislikes = $3, total = $4, updated_at = $5
            "#,
        )
        .bind(subject_id)
        .bind(new_likes)
        .bind(new_dislikes)
        .bind(total)
        .bind(updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(DeltaOutcome {
            aggregate: VoteAggregate {
                subject_id: subject_id.to_string(),
                likes: new_likes,
                dislikes: new_dislikes,
                total,
                updated_at,
            },
            clamped,
        })
    }

    async fn get_aggregate(&self, subject_id: &str) -> AppResult<Option<VoteAggregate>> {
        let row = sqlx::query(
            r#"
            SELECT likes, dislikes, total, updated_at
            FROM vote_aggregates
            WHERE subject_id = $1
            "#,
        )
        .bind(subject_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| VoteAggregate {
            subject_id: subject_id.to_string(),
            likes: r.get("likes"),
            dislikes: r.get("dislikes"),
            total: r.get("total"),
            updated_at: r.get("updated_at"),
        }))
    }
}

/// In-memory vote storage for tests
///
/// Tracks how many aggregate transactions actually committed so tests can
/// assert that a no-op event produced no write at all.
#[derive(Default)]
pub struct MemoryVoteStore {
    votes: std::sync::Mutex<std::collections::HashMap<(Uuid, String), Vote>>,
    aggregates: std::sync::Mutex<std::collections::HashMap<String, VoteAggregate>>,
    aggregate_writes: std::sync::atomic::AtomicUsize,
}

impl MemoryVoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed aggregate transactions
    pub fn aggregate_write_count(&self) -> usize {
        self.aggregate_writes
            .load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl VoteStore for MemoryVoteStore {
    async fn write_vote(
        &self,
        user_id: Uuid,
        subject_id: &str,
        value: VoteValue,
    ) -> AppResult<VoteValue> {
        let mut votes = self.votes.lock().expect("vote map poisoned");
        let key = (user_id, subject_id.to_string());
        let before = match value {
            VoteValue::None => votes.remove(&key),
            _ => votes.insert(
                key,
                Vote {
                    user_id,
                    subject_id: subject_id.to_string(),
                    value,
                    updated_at: Utc::now(),
                },
            ),
        };
        Ok(before.map(|v| v.value).unwrap_or(VoteValue::None))
    }

    async fn get_vote(&self, user_id: Uuid, subject_id: &str) -> AppResult<Option<Vote>> {
        let votes = self.votes.lock().expect("vote map poisoned");
        Ok(votes.get(&(user_id, subject_id.to_string())).cloned())
    }

    async fn apply_delta(
        &self,
        subject_id: &str,
        delta: VoteDelta,
    ) -> Result<DeltaOutcome, StoreError> {
        let mut aggregates = self.aggregates.lock().expect("aggregate map poisoned");
        let (likes, dislikes) = aggregates
            .get(subject_id)
            .map(|a| (a.likes, a.dislikes))
            .unwrap_or((0, 0));

        let new_likes = (likes + delta.likes).max(0);
        let new_dislikes = (dislikes + delta.dislikes).max(0);
        let clamped = likes + delta.likes < 0 || dislikes + delta.dislikes < 0;

        let aggregate = VoteAggregate {
            subject_id: subject_id.to_string(),
            likes: new_likes,
            dislikes: new_dislikes,
            total: new_likes + new_dislikes,
            updated_at: Utc::now(),
        };
        aggregates.insert(subject_id.to_string(), aggregate.clone());
        self.aggregate_writes
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        Ok(DeltaOutcome { aggregate, clamped })
    }

    async fn get_aggregate(&self, subject_id: &str) -> AppResult<Option<VoteAggregate>> {
        let aggregates = self.aggregates.lock().expect("aggregate map poisoned");
        Ok(aggregates.get(subject_id).cloned())
    }
}
