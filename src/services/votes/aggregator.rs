use std::sync::Arc;
use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::models::{VoteAggregate, VoteEvent};
use crate::services::votes::delta::VoteDelta;
use crate::services::votes::store::{StoreError, VoteStore};

/// Maximum transaction attempts before a contention error surfaces
const MAX_ATTEMPTS: u32 = 5;
/// Backoff before the second attempt; doubles per retry
const BASE_BACKOFF_MS: u64 = 10;

/// Keeps per-subject aggregates consistent with individual vote records
/// without recounting, by applying the signed delta of each vote write inside
/// a retried transaction.
///
/// Delivery of events is at-least-once and unordered across subjects; the
/// store transaction serializes concurrent deltas for the same subject, and
/// redelivery of an unchanged before/after pair short-circuits before any
/// write is issued.
pub struct VoteAggregator {
    store: Arc<dyn VoteStore>,
}

impl VoteAggregator {
    pub fn new(store: Arc<dyn VoteStore>) -> Self {
        Self { store }
    }

    /// Applies one vote write event to the subject's aggregate.
    ///
    /// Returns `None` when the event carried no effective change (no write is
    /// issued), the updated aggregate otherwise. Events without a subject id
    /// are terminal: retrying a structurally invalid event can never succeed.
    pub async fn apply(&self, event: &VoteEvent) -> AppResult<Option<VoteAggregate>> {
        if event.subject_id.trim().is_empty() {
            tracing::error!(
                before = ?event.before,
                after = ?event.after,
                "Dropping vote event without a subject id"
            );
            return Err(AppError::InvalidInput(
                "vote event is missing a subject id".to_string(),
            ));
        }

        let delta = VoteDelta::from_transition(event.before, event.after);
        if delta.is_noop() {
            tracing::debug!(
                subject_id = %event.subject_id,
                "Vote event carries no counter change, skipping"
            );
            return Ok(None);
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.store.apply_delta(&event.subject_id, delta).await {
                Ok(outcome) => {
                    if outcome.clamped {
                        tracing::warn!(
                            subject_id = %event.subject_id,
                            like_delta = delta.likes,
                            dislike_delta = delta.dislikes,
                            likes = outcome.aggregate.likes,
                            dislikes = outcome.aggregate.dislikes,
                            "Aggregate counter clamped at zero, delta drift suspected"
                        );
                    }
                    tracing::info!(
                        subject_id = %event.subject_id,
                        likes = outcome.aggregate.likes,
                        dislikes = outcome.aggregate.dislikes,
                        total = outcome.aggregate.total,
                        attempts = attempt,
                        "Vote aggregate updated"
                    );
                    return Ok(Some(outcome.aggregate));
                }
                Err(StoreError::Conflict) if attempt < MAX_ATTEMPTS => {
                    let backoff = BASE_BACKOFF_MS << (attempt - 1);
                    tracing::debug!(
                        subject_id = %event.subject_id,
                        attempt = attempt,
                        backoff_ms = backoff,
                        "Aggregate write conflict, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                Err(StoreError::Conflict) => {
                    return Err(AppError::Contention(format!(
                        "aggregate for subject '{}' still contended after {} attempts",
                        event.subject_id, MAX_ATTEMPTS
                    )));
                }
                Err(StoreError::Backend(e)) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VoteValue::{Dislike, Like, None as NoVote};
    use crate::services::votes::store::MemoryVoteStore;

    fn event(subject: &str, before: crate::models::VoteValue, after: crate::models::VoteValue) -> VoteEvent {
        VoteEvent {
            subject_id: subject.to_string(),
            before,
            after,
        }
    }

    fn aggregator() -> (VoteAggregator, Arc<MemoryVoteStore>) {
        let store = Arc::new(MemoryVoteStore::new());
        (VoteAggregator::new(store.clone()), store)
    }

    async fn counts(store: &MemoryVoteStore, subject: &str) -> (i64, i64, i64) {
        let aggregate = store.get_aggregate(subject).await.unwrap().unwrap();
        (aggregate.likes, aggregate.dislikes, aggregate.total)
    }

    #[tokio::test]
    async fn test_first_like_creates_aggregate() {
        let (aggregator, store) = aggregator();

        // Scenario 1: user A likes M1 with no existing aggregate
        let result = aggregator.apply(&event("M1", NoVote, Like)).await.unwrap();
        assert!(result.is_some());
        assert_eq!(counts(&store, "M1").await, (1, 0, 1));
    }

    #[tokio::test]
    async fn test_vote_flip_moves_count_between_counters() {
        let (aggregator, store) = aggregator();
        aggregator.apply(&event("M1", NoVote, Like)).await.unwrap();

        // Scenario 2: A flips like -> dislike
        aggregator.apply(&event("M1", Like, Dislike)).await.unwrap();
        assert_eq!(counts(&store, "M1").await, (0, 1, 1));
    }

    #[tokio::test]
    async fn test_second_user_vote_accumulates() {
        let (aggregator, store) = aggregator();
        aggregator.apply(&event("M1", NoVote, Like)).await.unwrap();
        aggregator.apply(&event("M1", Like, Dislike)).await.unwrap();

        // Scenario 3: user B likes M1 on top of A's dislike
        aggregator.apply(&event("M1", NoVote, Like)).await.unwrap();
        assert_eq!(counts(&store, "M1").await, (1, 1, 2));
    }

    #[tokio::test]
    async fn test_vote_removal_decrements() {
        let (aggregator, store) = aggregator();
        aggregator.apply(&event("M1", NoVote, Like)).await.unwrap();
        aggregator.apply(&event("M1", Like, Dislike)).await.unwrap();
        aggregator.apply(&event("M1", NoVote, Like)).await.unwrap();

        // Scenario 4: A deletes their dislike
        aggregator.apply(&event("M1", Dislike, NoVote)).await.unwrap();
        assert_eq!(counts(&store, "M1").await, (1, 0, 1));
    }

    #[tokio::test]
    async fn test_unchanged_event_issues_no_write() {
        let (aggregator, store) = aggregator();
        aggregator.apply(&event("M1", NoVote, Like)).await.unwrap();
        let writes_before = store.aggregate_write_count();

        // Scenario 5: before == after must not touch the store
        let result = aggregator.apply(&event("M1", Like, Like)).await.unwrap();
        assert!(result.is_none());
        assert_eq!(store.aggregate_write_count(), writes_before);
        assert_eq!(counts(&store, "M1").await, (1, 0, 1));
    }

    #[tokio::test]
    async fn test_sequential_convergence() {
        let (aggregator, store) = aggregator();

        // Three users: A likes then clears, B dislikes, C likes then flips.
        // Final per-user values: A none, B dislike, C dislike.
        aggregator.apply(&event("M2", NoVote, Like)).await.unwrap();
        aggregator.apply(&event("M2", NoVote, Dislike)).await.unwrap();
        aggregator.apply(&event("M2", NoVote, Like)).await.unwrap();
        aggregator.apply(&event("M2", Like, NoVote)).await.unwrap();
        aggregator.apply(&event("M2", Like, Dislike)).await.unwrap();

        assert_eq!(counts(&store, "M2").await, (0, 2, 2));
    }

    #[tokio::test]
    async fn test_total_matches_parts_after_every_transaction() {
        let (aggregator, store) = aggregator();
        let transitions = [
            (NoVote, Like),
            (NoVote, Dislike),
            (Like, Dislike),
            (Dislike, NoVote),
            (NoVote, Like),
        ];

        for (before, after) in transitions {
            aggregator.apply(&event("M3", before, after)).await.unwrap();
            let (likes, dislikes, total) = counts(&store, "M3").await;
            assert_eq!(total, likes + dislikes);
            assert!(likes >= 0 && dislikes >= 0);
        }
    }

    #[tokio::test]
    async fn test_stale_decrement_clamps_at_zero() {
        let (aggregator, store) = aggregator();

        // A decrement against an empty aggregate (stale before-state) must
        // floor at zero rather than go negative.
        aggregator.apply(&event("M4", Like, NoVote)).await.unwrap();
        assert_eq!(counts(&store, "M4").await, (0, 0, 0));
    }

    #[tokio::test]
    async fn test_missing_subject_id_is_terminal() {
        let (aggregator, store) = aggregator();

        let result = aggregator.apply(&event("  ", NoVote, Like)).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert_eq!(store.aggregate_write_count(), 0);
    }
}
