use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub community_id: Option<Uuid>,
    pub title: Option<String>,
    pub body: String,
    pub visibility: PostVisibility,
    pub edited: bool,
    pub edited_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Declared audience of a single post. The owner's account privacy is
/// applied on top: a private account never exposes anything to
/// non-followers, whatever the post flag says.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostVisibility {
    Public,
    FriendsList,
    Private,
}

impl PostVisibility {
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "public" => Some(Self::Public),
            "friends_list" => Some(Self::FriendsList),
            "private" => Some(Self::Private),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::FriendsList => "friends_list",
            Self::Private => "private",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedPost {
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub saved_at: OffsetDateTime,
}
