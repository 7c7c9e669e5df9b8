use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub payload: Value,
    pub read_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    NewPost,
    Comment,
    Reaction,
    NewFollower,
    FollowRequest,
    RequestAccepted,
}

impl NotificationKind {
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "new_post" => Some(Self::NewPost),
            "comment" => Some(Self::Comment),
            "reaction" => Some(Self::Reaction),
            "new_follower" => Some(Self::NewFollower),
            "follow_request" => Some(Self::FollowRequest),
            "request_accepted" => Some(Self::RequestAccepted),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::NewPost => "new_post",
            Self::Comment => "comment",
            Self::Reaction => "reaction",
            Self::NewFollower => "new_follower",
            Self::FollowRequest => "follow_request",
            Self::RequestAccepted => "request_accepted",
        }
    }
}

/// Per-recipient toggles, one per event family. A user without a row gets
/// every kind delivered; rows appear lazily on the first settings write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub user_id: Uuid,
    pub new_post: bool,
    pub comment: bool,
    pub reaction: bool,
    pub new_follower: bool,
}

impl NotificationPreferences {
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id,
            new_post: true,
            comment: true,
            reaction: true,
            new_follower: true,
        }
    }

    /// Follow-request traffic rides the new-follower toggle; there is no
    /// separate switch for it.
    pub fn allows(&self, kind: NotificationKind) -> bool {
        match kind {
            NotificationKind::NewPost => self.new_post,
            NotificationKind::Comment => self.comment,
            NotificationKind::Reaction => self.reaction,
            NotificationKind::NewFollower
            | NotificationKind::FollowRequest
            | NotificationKind::RequestAccepted => self.new_follower,
        }
    }

    pub fn set(&mut self, kind: NotificationKind, enabled: bool) {
        match kind {
            NotificationKind::NewPost => self.new_post = enabled,
            NotificationKind::Comment => self.comment = enabled,
            NotificationKind::Reaction => self.reaction = enabled,
            NotificationKind::NewFollower
            | NotificationKind::FollowRequest
            | NotificationKind::RequestAccepted => self.new_follower = enabled,
        }
    }
}
