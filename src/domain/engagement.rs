use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// One reaction per (post, user) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
}

/// Distinct-actor counts, so ten reactions from one account count once.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngagementCounts {
    pub reactors: i64,
    pub commenters: i64,
}

impl EngagementCounts {
    pub fn score(&self) -> i64 {
        self.reactors + self.commenters
    }
}
