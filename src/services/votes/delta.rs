use crate::models::VoteValue;

/// Signed change to a subject's counters caused by one vote transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteDelta {
    pub likes: i64,
    pub dislikes: i64,
}

impl VoteDelta {
    /// Computes the counter delta for a single vote write.
    ///
    /// Each side of the transition contributes to at most one counter, so a
    /// flip from like to dislike yields `{likes: -1, dislikes: +1}` and an
    /// unchanged value yields the zero delta.
    pub fn from_transition(before: VoteValue, after: VoteValue) -> Self {
        let contributes = |value: VoteValue, target: VoteValue| -> i64 {
            if value == target {
                1
            } else {
                0
            }
        };

        Self {
            likes: contributes(after, VoteValue::Like) - contributes(before, VoteValue::Like),
            dislikes: contributes(after, VoteValue::Dislike)
                - contributes(before, VoteValue::Dislike),
        }
    }

    /// True when applying this delta would not change any counter
    pub fn is_noop(&self) -> bool {
        self.likes == 0 && self.dislikes == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VoteValue::{Dislike, Like, None as NoVote};

    #[test]
    fn test_first_like() {
        let delta = VoteDelta::from_transition(NoVote, Like);
        assert_eq!(delta, VoteDelta { likes: 1, dislikes: 0 });
    }

    #[test]
    fn test_first_dislike() {
        let delta = VoteDelta::from_transition(NoVote, Dislike);
        assert_eq!(delta, VoteDelta { likes: 0, dislikes: 1 });
    }

    #[test]
    fn test_flip_like_to_dislike() {
        let delta = VoteDelta::from_transition(Like, Dislike);
        assert_eq!(
            delta,
            VoteDelta {
                likes: -1,
                dislikes: 1
            }
        );
    }

    #[test]
    fn test_flip_dislike_to_like() {
        let delta = VoteDelta::from_transition(Dislike, Like);
        assert_eq!(
            delta,
            VoteDelta {
                likes: 1,
                dislikes: -1
            }
        );
    }

    #[test]
    fn test_clear_like() {
        let delta = VoteDelta::from_transition(Like, NoVote);
        assert_eq!(
            delta,
            VoteDelta {
                likes: -1,
                dislikes: 0
            }
        );
    }

    #[test]
    fn test_clear_dislike() {
        let delta = VoteDelta::from_transition(Dislike, NoVote);
        assert_eq!(
            delta,
            VoteDelta {
                likes: 0,
                dislikes: -1
            }
        );
    }

    #[test]
    fn test_unchanged_values_are_noops() {
        for value in [Like, Dislike, NoVote] {
            let delta = VoteDelta::from_transition(value, value);
            assert!(delta.is_noop(), "{:?} -> {:?} must be a no-op", value, value);
        }
    }
}
