use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// At most one edge exists per ordered (follower, followee) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowEdge {
    pub follower_id: Uuid,
    pub followee_id: Uuid,
    pub state: FollowState,
    /// Set by the followee on an active edge. Not consulted by visibility
    /// rules yet; reserved for a close-friends audience.
    pub close_friend: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FollowState {
    Pending,
    Active,
}

impl FollowState {
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "active" => Some(Self::Active),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub blocker_id: Uuid,
    pub blocked_id: Uuid,
    pub created_at: OffsetDateTime,
}

/// Weaker than a block: muted accounts stay reachable directly but are
/// dropped from the muter's ranked feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mute {
    pub muter_id: Uuid,
    pub muted_id: Uuid,
    pub created_at: OffsetDateTime,
}
