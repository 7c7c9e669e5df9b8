use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::comment::{Comment, CommentStatus};
use crate::domain::community::{CommunityMembership, CommunityRole};
use crate::domain::engagement::EngagementCounts;
use crate::domain::moderation::ModerationAction;
use crate::domain::notification::{Notification, NotificationPreferences};
use crate::domain::post::Post;
use crate::domain::social_graph::{FollowEdge, FollowState};
use crate::domain::user::Actor;

/// Read/write access to the social graph: actors, follow edges, blocks,
/// mutes, community membership and bans. Implementations must keep at most
/// one follow edge per ordered pair under concurrent writers.
#[async_trait]
pub trait RelationshipStore: Send + Sync {
    async fn actor(&self, id: Uuid) -> anyhow::Result<Option<Actor>>;
    async fn actors(&self, ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, Actor>>;

    async fn follow_edge(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
    ) -> anyhow::Result<Option<FollowEdge>>;
    async fn active_followee_ids(&self, follower_id: Uuid) -> anyhow::Result<HashSet<Uuid>>;
    async fn active_follower_ids(&self, followee_id: Uuid) -> anyhow::Result<HashSet<Uuid>>;
    async fn follower_count(&self, followee_id: Uuid) -> anyhow::Result<i64>;
    async fn insert_follow_edge(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
        state: FollowState,
    ) -> anyhow::Result<bool>;
    async fn set_follow_state(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
        state: FollowState,
    ) -> anyhow::Result<bool>;
    /// Only flips the flag on an active edge.
    async fn set_close_friend(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
        close_friend: bool,
    ) -> anyhow::Result<bool>;
    async fn delete_follow_edge(&self, follower_id: Uuid, followee_id: Uuid)
        -> anyhow::Result<bool>;

    /// Directed check: does `blocker_id` block `blocked_id`.
    async fn block_exists(&self, blocker_id: Uuid, blocked_id: Uuid) -> anyhow::Result<bool>;
    /// Either-direction check.
    async fn block_between(&self, a: Uuid, b: Uuid) -> anyhow::Result<bool>;
    /// Everyone blocked by, or blocking, the viewer.
    async fn blocked_either_ids(&self, viewer_id: Uuid) -> anyhow::Result<HashSet<Uuid>>;
    /// Creating a block also severs follow edges in both directions, in one
    /// atomic storage operation. A self-block is a no-op returning false.
    async fn insert_block(&self, blocker_id: Uuid, blocked_id: Uuid) -> anyhow::Result<bool>;
    async fn delete_block(&self, blocker_id: Uuid, blocked_id: Uuid) -> anyhow::Result<bool>;

    async fn mute_exists(&self, muter_id: Uuid, muted_id: Uuid) -> anyhow::Result<bool>;
    async fn muted_ids(&self, muter_id: Uuid) -> anyhow::Result<HashSet<Uuid>>;
    /// A self-mute is a no-op returning false.
    async fn insert_mute(&self, muter_id: Uuid, muted_id: Uuid) -> anyhow::Result<bool>;
    async fn delete_mute(&self, muter_id: Uuid, muted_id: Uuid) -> anyhow::Result<bool>;

    async fn membership(
        &self,
        community_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<Option<CommunityMembership>>;
    async fn insert_membership(
        &self,
        community_id: Uuid,
        user_id: Uuid,
        role: CommunityRole,
    ) -> anyhow::Result<bool>;
    async fn delete_membership(&self, community_id: Uuid, user_id: Uuid) -> anyhow::Result<bool>;
    async fn community_ban_exists(
        &self,
        community_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<bool>;
    async fn insert_community_ban(
        &self,
        community_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<bool>;
    async fn delete_community_ban(
        &self,
        community_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<bool>;
}

/// Post, save, comment and reaction records, plus the moderation audit
/// trail. The engine reads feed candidates and writes engagement rows;
/// creating posts belongs to the caller.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn post(&self, id: Uuid) -> anyhow::Result<Option<Post>>;
    async fn posts_by_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<Post>>;
    async fn posts_by_owners(&self, owner_ids: &[Uuid]) -> anyhow::Result<Vec<Post>>;
    /// Public-visibility candidates only; the composer re-applies the full
    /// visibility predicate on top.
    async fn public_posts(&self) -> anyhow::Result<Vec<Post>>;
    async fn posts_in_community(&self, community_id: Uuid) -> anyhow::Result<Vec<Post>>;
    async fn delete_post(&self, id: Uuid) -> anyhow::Result<bool>;

    async fn saved_posts(&self, user_id: Uuid)
        -> anyhow::Result<Vec<(Post, OffsetDateTime)>>;
    async fn insert_saved_post(&self, user_id: Uuid, post_id: Uuid) -> anyhow::Result<bool>;
    async fn delete_saved_post(&self, user_id: Uuid, post_id: Uuid) -> anyhow::Result<bool>;

    async fn comment(&self, id: Uuid) -> anyhow::Result<Option<Comment>>;
    async fn comments_for_post(&self, post_id: Uuid) -> anyhow::Result<Vec<Comment>>;
    async fn insert_comment(&self, comment: &Comment) -> anyhow::Result<()>;
    async fn active_reply_count(&self, comment_id: Uuid) -> anyhow::Result<i64>;
    async fn set_comment_status(&self, id: Uuid, status: CommentStatus) -> anyhow::Result<bool>;

    async fn insert_reaction(&self, post_id: Uuid, user_id: Uuid) -> anyhow::Result<bool>;
    async fn delete_reaction(&self, post_id: Uuid, user_id: Uuid) -> anyhow::Result<bool>;
    async fn engagement_counts(
        &self,
        post_ids: &[Uuid],
    ) -> anyhow::Result<HashMap<Uuid, EngagementCounts>>;

    async fn insert_moderation_action(&self, action: &ModerationAction) -> anyhow::Result<()>;
    async fn list_moderation_actions(&self, limit: i64) -> anyhow::Result<Vec<ModerationAction>>;
}

/// Notification rows and per-recipient preferences. Writes are best-effort;
/// the engine never retries a failed insert.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn preferences(&self, user_id: Uuid)
        -> anyhow::Result<Option<NotificationPreferences>>;
    async fn upsert_preferences(&self, prefs: &NotificationPreferences) -> anyhow::Result<()>;
    async fn insert_notification(&self, notification: &Notification) -> anyhow::Result<()>;
    async fn notifications_for(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> anyhow::Result<Vec<Notification>>;
    async fn mark_notification_read(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<bool>;
}
