pub mod aggregator;
pub mod delta;
pub mod store;

use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Vote, VoteAggregate, VoteEvent, VoteValue};

pub use aggregator::VoteAggregator;
pub use store::{MemoryVoteStore, PgVoteStore, VoteStore};

/// Records a user's vote and synchronously feeds the resulting write event to
/// the aggregator, mirroring the trigger the database would otherwise fire.
///
/// Returns the aggregate as of this write. When the write changed nothing
/// (same value voted twice) the stored aggregate is returned untouched.
pub async fn record_vote(
    store: &Arc<dyn VoteStore>,
    aggregator: &VoteAggregator,
    user_id: Uuid,
    subject_id: &str,
    value: VoteValue,
) -> AppResult<VoteAggregate> {
    let before = store.write_vote(user_id, subject_id, value).await?;

    let event = VoteEvent {
        subject_id: subject_id.to_string(),
        before,
        after: value,
    };

    match aggregator.apply(&event).await? {
        Some(aggregate) => Ok(aggregate),
        None => get_aggregate(store, subject_id).await,
    }
}

/// The caller's own vote on a subject, `None` when they have not voted
pub async fn get_user_vote(
    store: &Arc<dyn VoteStore>,
    user_id: Uuid,
    subject_id: &str,
) -> AppResult<Option<Vote>> {
    store.get_vote(user_id, subject_id).await
}

/// Public read model: the subject's counters, zeroed when nobody voted yet
pub async fn get_aggregate(
    store: &Arc<dyn VoteStore>,
    subject_id: &str,
) -> AppResult<VoteAggregate> {
    Ok(store
        .get_aggregate(subject_id)
        .await?
        .unwrap_or_else(|| VoteAggregate::zeroed(subject_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VoteValue::{Dislike, Like, None as NoVote};

    fn setup() -> (Arc<dyn VoteStore>, VoteAggregator) {
        let store: Arc<MemoryVoteStore> = Arc::new(MemoryVoteStore::new());
        let aggregator = VoteAggregator::new(store.clone());
        (store, aggregator)
    }

    #[tokio::test]
    async fn test_record_vote_updates_aggregate() {
        let (store, aggregator) = setup();
        let user = Uuid::new_v4();

        let aggregate = record_vote(&store, &aggregator, user, "603", Like)
            .await
            .unwrap();
        assert_eq!((aggregate.likes, aggregate.dislikes), (1, 0));

        let aggregate = record_vote(&store, &aggregator, user, "603", Dislike)
            .await
            .unwrap();
        assert_eq!((aggregate.likes, aggregate.dislikes), (0, 1));
    }

    #[tokio::test]
    async fn test_repeated_vote_is_stable() {
        let (store, aggregator) = setup();
        let user = Uuid::new_v4();

        record_vote(&store, &aggregator, user, "603", Like)
            .await
            .unwrap();
        let aggregate = record_vote(&store, &aggregator, user, "603", Like)
            .await
            .unwrap();

        assert_eq!((aggregate.likes, aggregate.dislikes, aggregate.total), (1, 0, 1));
    }

    #[tokio::test]
    async fn test_clearing_vote_removes_record_and_count() {
        let (store, aggregator) = setup();
        let user = Uuid::new_v4();

        record_vote(&store, &aggregator, user, "603", Like)
            .await
            .unwrap();
        let aggregate = record_vote(&store, &aggregator, user, "603", NoVote)
            .await
            .unwrap();

        assert_eq!((aggregate.likes, aggregate.total), (0, 0));
    }

    #[tokio::test]
    async fn test_get_user_vote_reflects_latest_write() {
        let (store, aggregator) = setup();
        let user = Uuid::new_v4();

        assert!(get_user_vote(&store, user, "603").await.unwrap().is_none());

        record_vote(&store, &aggregator, user, "603", Dislike)
            .await
            .unwrap();
        let vote = get_user_vote(&store, user, "603").await.unwrap().unwrap();
        assert_eq!(vote.value, Dislike);

        record_vote(&store, &aggregator, user, "603", NoVote)
            .await
            .unwrap();
        assert!(get_user_vote(&store, user, "603").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unvoted_subject_reads_zeroed() {
        let (store, _) = setup();
        let aggregate = get_aggregate(&store, "never-voted").await.unwrap();
        assert_eq!((aggregate.likes, aggregate.dislikes, aggregate.total), (0, 0, 0));
    }
}
