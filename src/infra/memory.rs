use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::comment::{Comment, CommentStatus};
use crate::domain::community::{CommunityMembership, CommunityRole};
use crate::domain::engagement::EngagementCounts;
use crate::domain::moderation::ModerationAction;
use crate::domain::notification::{Notification, NotificationPreferences};
use crate::domain::post::{Post, PostVisibility};
use crate::domain::social_graph::{FollowEdge, FollowState};
use crate::domain::user::Actor;
use crate::infra::store::{ContentStore, NotificationStore, RelationshipStore};

/// Reference store backed by in-process maps. The test suite runs against
/// it; a single lock stands in for the row-level serialization the
/// Postgres store gets from its unique indexes.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    actors: HashMap<Uuid, Actor>,
    follows: HashMap<(Uuid, Uuid), FollowEdge>,
    blocks: HashSet<(Uuid, Uuid)>,
    mutes: HashSet<(Uuid, Uuid)>,
    memberships: HashMap<(Uuid, Uuid), CommunityMembership>,
    community_bans: HashSet<(Uuid, Uuid)>,
    posts: HashMap<Uuid, Post>,
    saved: HashMap<(Uuid, Uuid), OffsetDateTime>,
    comments: HashMap<Uuid, Comment>,
    reactions: HashSet<(Uuid, Uuid)>,
    moderation_log: Vec<ModerationAction>,
    preferences: HashMap<Uuid, NotificationPreferences>,
    notifications: Vec<Notification>,
}

impl MemoryStore {
    pub async fn put_actor(&self, actor: Actor) {
        self.inner.write().await.actors.insert(actor.id, actor);
    }

    pub async fn put_post(&self, post: Post) {
        self.inner.write().await.posts.insert(post.id, post);
    }

    pub async fn put_saved(&self, user_id: Uuid, post_id: Uuid, saved_at: OffsetDateTime) {
        self.inner
            .write()
            .await
            .saved
            .insert((user_id, post_id), saved_at);
    }
}

fn sort_recency(mut posts: Vec<Post>) -> Vec<Post> {
    posts.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    posts
}

#[async_trait]
impl RelationshipStore for MemoryStore {
    async fn actor(&self, id: Uuid) -> anyhow::Result<Option<Actor>> {
        Ok(self.inner.read().await.actors.get(&id).cloned())
    }

    async fn actors(&self, ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, Actor>> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.actors.get(id).map(|actor| (*id, actor.clone())))
            .collect())
    }

    async fn follow_edge(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
    ) -> anyhow::Result<Option<FollowEdge>> {
        Ok(self
            .inner
            .read()
            .await
            .follows
            .get(&(follower_id, followee_id))
            .cloned())
    }

    async fn active_followee_ids(&self, follower_id: Uuid) -> anyhow::Result<HashSet<Uuid>> {
        let inner = self.inner.read().await;
        Ok(inner
            .follows
            .values()
            .filter(|edge| edge.follower_id == follower_id && edge.state == FollowState::Active)
            .map(|edge| edge.followee_id)
            .collect())
    }

    async fn active_follower_ids(&self, followee_id: Uuid) -> anyhow::Result<HashSet<Uuid>> {
        let inner = self.inner.read().await;
        Ok(inner
            .follows
            .values()
            .filter(|edge| edge.followee_id == followee_id && edge.state == FollowState::Active)
            .map(|edge| edge.follower_id)
            .collect())
    }

    async fn follower_count(&self, followee_id: Uuid) -> anyhow::Result<i64> {
        let inner = self.inner.read().await;
        Ok(inner
            .follows
            .values()
            .filter(|edge| edge.followee_id == followee_id && edge.state == FollowState::Active)
            .count() as i64)
    }

    async fn insert_follow_edge(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
        state: FollowState,
    ) -> anyhow::Result<bool> {
        let mut inner = self.inner.write().await;
        if inner.follows.contains_key(&(follower_id, followee_id)) {
            return Ok(false);
        }
        inner.follows.insert(
            (follower_id, followee_id),
            FollowEdge {
                follower_id,
                followee_id,
                state,
                close_friend: false,
                created_at: OffsetDateTime::now_utc(),
            },
        );
        Ok(true)
    }

    async fn set_follow_state(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
        state: FollowState,
    ) -> anyhow::Result<bool> {
        let mut inner = self.inner.write().await;
        match inner.follows.get_mut(&(follower_id, followee_id)) {
            Some(edge) => {
                edge.state = state;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_close_friend(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
        close_friend: bool,
    ) -> anyhow::Result<bool> {
        let mut inner = self.inner.write().await;
        match inner.follows.get_mut(&(follower_id, followee_id)) {
            Some(edge) if edge.state == FollowState::Active => {
                edge.close_friend = close_friend;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_follow_edge(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
    ) -> anyhow::Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.follows.remove(&(follower_id, followee_id)).is_some())
    }

    async fn block_exists(&self, blocker_id: Uuid, blocked_id: Uuid) -> anyhow::Result<bool> {
        Ok(self
            .inner
            .read()
            .await
            .blocks
            .contains(&(blocker_id, blocked_id)))
    }

    async fn block_between(&self, a: Uuid, b: Uuid) -> anyhow::Result<bool> {
        let inner = self.inner.read().await;
        Ok(inner.blocks.contains(&(a, b)) || inner.blocks.contains(&(b, a)))
    }

    async fn blocked_either_ids(&self, viewer_id: Uuid) -> anyhow::Result<HashSet<Uuid>> {
        let inner = self.inner.read().await;
        Ok(inner
            .blocks
            .iter()
            .filter_map(|&(blocker, blocked)| {
                if blocker == viewer_id {
                    Some(blocked)
                } else if blocked == viewer_id {
                    Some(blocker)
                } else {
                    None
                }
            })
            .collect())
    }

    async fn insert_block(&self, blocker_id: Uuid, blocked_id: Uuid) -> anyhow::Result<bool> {
        if blocker_id == blocked_id {
            return Ok(false);
        }
        let mut inner = self.inner.write().await;
        inner.follows.remove(&(blocker_id, blocked_id));
        inner.follows.remove(&(blocked_id, blocker_id));
        Ok(inner.blocks.insert((blocker_id, blocked_id)))
    }

    async fn delete_block(&self, blocker_id: Uuid, blocked_id: Uuid) -> anyhow::Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.blocks.remove(&(blocker_id, blocked_id)))
    }

    async fn mute_exists(&self, muter_id: Uuid, muted_id: Uuid) -> anyhow::Result<bool> {
        Ok(self
            .inner
            .read()
            .await
            .mutes
            .contains(&(muter_id, muted_id)))
    }

    async fn muted_ids(&self, muter_id: Uuid) -> anyhow::Result<HashSet<Uuid>> {
        let inner = self.inner.read().await;
        Ok(inner
            .mutes
            .iter()
            .filter(|(muter, _)| *muter == muter_id)
            .map(|(_, muted)| *muted)
            .collect())
    }

    async fn insert_mute(&self, muter_id: Uuid, muted_id: Uuid) -> anyhow::Result<bool> {
        if muter_id == muted_id {
            return Ok(false);
        }
        let mut inner = self.inner.write().await;
        Ok(inner.mutes.insert((muter_id, muted_id)))
    }

    async fn delete_mute(&self, muter_id: Uuid, muted_id: Uuid) -> anyhow::Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.mutes.remove(&(muter_id, muted_id)))
    }

    async fn membership(
        &self,
        community_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<Option<CommunityMembership>> {
        Ok(self
            .inner
            .read()
            .await
            .memberships
            .get(&(community_id, user_id))
            .cloned())
    }

    async fn insert_membership(
        &self,
        community_id: Uuid,
        user_id: Uuid,
        role: CommunityRole,
    ) -> anyhow::Result<bool> {
        let mut inner = self.inner.write().await;
        if inner.memberships.contains_key(&(community_id, user_id)) {
            return Ok(false);
        }
        inner.memberships.insert(
            (community_id, user_id),
            CommunityMembership {
                community_id,
                user_id,
                role,
                joined_at: OffsetDateTime::now_utc(),
            },
        );
        Ok(true)
    }

    async fn delete_membership(&self, community_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.memberships.remove(&(community_id, user_id)).is_some())
    }

    async fn community_ban_exists(
        &self,
        community_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<bool> {
        Ok(self
            .inner
            .read()
            .await
            .community_bans
            .contains(&(community_id, user_id)))
    }

    async fn insert_community_ban(
        &self,
        community_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.community_bans.insert((community_id, user_id)))
    }

    async fn delete_community_ban(
        &self,
        community_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.community_bans.remove(&(community_id, user_id)))
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn post(&self, id: Uuid) -> anyhow::Result<Option<Post>> {
        Ok(self.inner.read().await.posts.get(&id).cloned())
    }

    async fn posts_by_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<Post>> {
        let inner = self.inner.read().await;
        Ok(sort_recency(
            inner
                .posts
                .values()
                .filter(|post| post.owner_id == owner_id)
                .cloned()
                .collect(),
        ))
    }

    async fn posts_by_owners(&self, owner_ids: &[Uuid]) -> anyhow::Result<Vec<Post>> {
        let wanted: HashSet<Uuid> = owner_ids.iter().copied().collect();
        let inner = self.inner.read().await;
        Ok(sort_recency(
            inner
                .posts
                .values()
                .filter(|post| wanted.contains(&post.owner_id))
                .cloned()
                .collect(),
        ))
    }

    async fn public_posts(&self) -> anyhow::Result<Vec<Post>> {
        let inner = self.inner.read().await;
        Ok(sort_recency(
            inner
                .posts
                .values()
                .filter(|post| post.visibility == PostVisibility::Public)
                .cloned()
                .collect(),
        ))
    }

    async fn posts_in_community(&self, community_id: Uuid) -> anyhow::Result<Vec<Post>> {
        let inner = self.inner.read().await;
        Ok(sort_recency(
            inner
                .posts
                .values()
                .filter(|post| post.community_id == Some(community_id))
                .cloned()
                .collect(),
        ))
    }

    async fn delete_post(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut inner = self.inner.write().await;
        let removed = inner.posts.remove(&id).is_some();
        if removed {
            // Mirrors the cascading delete rules of the SQL schema.
            inner.comments.retain(|_, comment| comment.post_id != id);
            inner.reactions.retain(|(post_id, _)| *post_id != id);
            inner.saved.retain(|(_, post_id), _| *post_id != id);
        }
        Ok(removed)
    }

    async fn saved_posts(&self, user_id: Uuid) -> anyhow::Result<Vec<(Post, OffsetDateTime)>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<(Post, OffsetDateTime)> = inner
            .saved
            .iter()
            .filter(|((saver, _), _)| *saver == user_id)
            .filter_map(|((_, post_id), saved_at)| {
                inner.posts.get(post_id).map(|post| (post.clone(), *saved_at))
            })
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.id.cmp(&a.0.id)));
        Ok(rows)
    }

    async fn insert_saved_post(&self, user_id: Uuid, post_id: Uuid) -> anyhow::Result<bool> {
        let mut inner = self.inner.write().await;
        if inner.saved.contains_key(&(user_id, post_id)) {
            return Ok(false);
        }
        inner
            .saved
            .insert((user_id, post_id), OffsetDateTime::now_utc());
        Ok(true)
    }

    async fn delete_saved_post(&self, user_id: Uuid, post_id: Uuid) -> anyhow::Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.saved.remove(&(user_id, post_id)).is_some())
    }

    async fn comment(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        Ok(self.inner.read().await.comments.get(&id).cloned())
    }

    async fn comments_for_post(&self, post_id: Uuid) -> anyhow::Result<Vec<Comment>> {
        let inner = self.inner.read().await;
        Ok(inner
            .comments
            .values()
            .filter(|comment| comment.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn insert_comment(&self, comment: &Comment) -> anyhow::Result<()> {
        let mut inner = self.inner.write().await;
        inner.comments.insert(comment.id, comment.clone());
        Ok(())
    }

    async fn active_reply_count(&self, comment_id: Uuid) -> anyhow::Result<i64> {
        let inner = self.inner.read().await;
        Ok(inner
            .comments
            .values()
            .filter(|comment| {
                comment.parent_id == Some(comment_id) && comment.status == CommentStatus::Active
            })
            .count() as i64)
    }

    async fn set_comment_status(&self, id: Uuid, status: CommentStatus) -> anyhow::Result<bool> {
        let mut inner = self.inner.write().await;
        match inner.comments.get_mut(&id) {
            Some(comment) => {
                comment.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_reaction(&self, post_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.reactions.insert((post_id, user_id)))
    }

    async fn delete_reaction(&self, post_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.reactions.remove(&(post_id, user_id)))
    }

    async fn engagement_counts(
        &self,
        post_ids: &[Uuid],
    ) -> anyhow::Result<HashMap<Uuid, EngagementCounts>> {
        let inner = self.inner.read().await;
        let mut counts: HashMap<Uuid, EngagementCounts> = HashMap::new();
        for &post_id in post_ids {
            let reactors = inner
                .reactions
                .iter()
                .filter(|(post, _)| *post == post_id)
                .count() as i64;
            let commenters = inner
                .comments
                .values()
                .filter(|comment| {
                    comment.post_id == post_id && comment.status == CommentStatus::Active
                })
                .map(|comment| comment.author_id)
                .collect::<HashSet<Uuid>>()
                .len() as i64;
            counts.insert(
                post_id,
                EngagementCounts {
                    reactors,
                    commenters,
                },
            );
        }
        Ok(counts)
    }

    async fn insert_moderation_action(&self, action: &ModerationAction) -> anyhow::Result<()> {
        let mut inner = self.inner.write().await;
        inner.moderation_log.push(action.clone());
        Ok(())
    }

    async fn list_moderation_actions(&self, limit: i64) -> anyhow::Result<Vec<ModerationAction>> {
        let inner = self.inner.read().await;
        let mut actions = inner.moderation_log.clone();
        actions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        actions.truncate(limit.max(0) as usize);
        Ok(actions)
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn preferences(
        &self,
        user_id: Uuid,
    ) -> anyhow::Result<Option<NotificationPreferences>> {
        Ok(self.inner.read().await.preferences.get(&user_id).cloned())
    }

    async fn upsert_preferences(&self, prefs: &NotificationPreferences) -> anyhow::Result<()> {
        let mut inner = self.inner.write().await;
        inner.preferences.insert(prefs.user_id, prefs.clone());
        Ok(())
    }

    async fn insert_notification(&self, notification: &Notification) -> anyhow::Result<()> {
        let mut inner = self.inner.write().await;
        inner.notifications.push(notification.clone());
        Ok(())
    }

    async fn notifications_for(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> anyhow::Result<Vec<Notification>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<Notification> = inner
            .notifications
            .iter()
            .filter(|notification| notification.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn mark_notification_read(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let mut inner = self.inner.write().await;
        match inner
            .notifications
            .iter_mut()
            .find(|notification| notification.id == id && notification.user_id == user_id)
        {
            Some(notification) if notification.read_at.is_none() => {
                notification.read_at = Some(OffsetDateTime::now_utc());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
