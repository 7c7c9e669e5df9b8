use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityMembership {
    pub community_id: Uuid,
    pub user_id: Uuid,
    pub role: CommunityRole,
    pub joined_at: OffsetDateTime,
}

/// Membership roles gate moderation actions, not feed visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommunityRole {
    Member,
    Moderator,
    Admin,
}

impl CommunityRole {
    pub fn can_moderate(&self) -> bool {
        matches!(self, Self::Moderator | Self::Admin)
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "member" => Some(Self::Member),
            "moderator" => Some(Self::Moderator),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }
}

/// Excludes a user from community actions. Global visibility is untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityBan {
    pub community_id: Uuid,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
}
