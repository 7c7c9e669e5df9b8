use std::collections::{HashMap, HashSet};

use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::comment::{Comment, CommentStatus};
use crate::domain::community::{CommunityMembership, CommunityRole};
use crate::domain::engagement::EngagementCounts;
use crate::domain::moderation::ModerationAction;
use crate::domain::notification::{Notification, NotificationKind, NotificationPreferences};
use crate::domain::post::{Post, PostVisibility};
use crate::domain::social_graph::{FollowEdge, FollowState};
use crate::domain::user::{AccountPrivacy, Actor, ActorStatus};
use crate::infra::db::Db;
use crate::infra::store::{ContentStore, NotificationStore, RelationshipStore};

/// Postgres-backed store. Unique indexes serialize concurrent writers on
/// the same ordered pair; upserts go through `ON CONFLICT DO NOTHING`.
#[derive(Clone)]
pub struct PgStore {
    db: Db,
}

impl PgStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

fn map_actor(row: &PgRow) -> anyhow::Result<Actor> {
    let status: String = row.get("status");
    let status = ActorStatus::from_db(&status)
        .ok_or_else(|| anyhow!("unknown actor status: {}", status))?;
    let privacy: String = row.get("privacy");
    let privacy = AccountPrivacy::from_db(&privacy)
        .ok_or_else(|| anyhow!("unknown account privacy: {}", privacy))?;

    Ok(Actor {
        id: row.get("id"),
        handle: row.get("handle"),
        display_name: row.get("display_name"),
        bio: row.get("bio"),
        status,
        privacy,
        created_at: row.get("created_at"),
    })
}

fn map_post(row: &PgRow) -> anyhow::Result<Post> {
    let visibility: String = row.get("visibility");
    let visibility = PostVisibility::from_db(&visibility)
        .ok_or_else(|| anyhow!("unknown post visibility: {}", visibility))?;

    Ok(Post {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        community_id: row.get("community_id"),
        title: row.get("title"),
        body: row.get("body"),
        visibility,
        edited: row.get("edited"),
        edited_at: row.get("edited_at"),
        created_at: row.get("created_at"),
    })
}

fn map_comment(row: &PgRow) -> anyhow::Result<Comment> {
    let status: String = row.get("status");
    let status = CommentStatus::from_db(&status)
        .ok_or_else(|| anyhow!("unknown comment status: {}", status))?;

    Ok(Comment {
        id: row.get("id"),
        post_id: row.get("post_id"),
        author_id: row.get("author_id"),
        parent_id: row.get("parent_id"),
        body: row.get("body"),
        status,
        created_at: row.get("created_at"),
    })
}

const POST_COLUMNS: &str = "id, owner_id, community_id, title, body, \
                            visibility::text AS visibility, edited, edited_at, created_at";

#[async_trait]
impl RelationshipStore for PgStore {
    async fn actor(&self, id: Uuid) -> anyhow::Result<Option<Actor>> {
        let row = sqlx::query(
            "SELECT id, handle, display_name, bio, status::text AS status, \
                    privacy::text AS privacy, created_at \
             FROM actors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(map_actor).transpose()
    }

    async fn actors(&self, ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, Actor>> {
        let rows = sqlx::query(
            "SELECT id, handle, display_name, bio, status::text AS status, \
                    privacy::text AS privacy, created_at \
             FROM actors WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(self.db.pool())
        .await?;

        let mut actors = HashMap::with_capacity(rows.len());
        for row in &rows {
            let actor = map_actor(row)?;
            actors.insert(actor.id, actor);
        }
        Ok(actors)
    }

    async fn follow_edge(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
    ) -> anyhow::Result<Option<FollowEdge>> {
        let row = sqlx::query(
            "SELECT follower_id, followee_id, state::text AS state, close_friend, created_at \
             FROM follow_edges WHERE follower_id = $1 AND followee_id = $2",
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_optional(self.db.pool())
        .await?;

        let edge = match row {
            Some(row) => {
                let state: String = row.get("state");
                let state = FollowState::from_db(&state)
                    .ok_or_else(|| anyhow!("unknown follow state: {}", state))?;
                Some(FollowEdge {
                    follower_id: row.get("follower_id"),
                    followee_id: row.get("followee_id"),
                    state,
                    close_friend: row.get("close_friend"),
                    created_at: row.get("created_at"),
                })
            }
            None => None,
        };

        Ok(edge)
    }

    async fn active_followee_ids(&self, follower_id: Uuid) -> anyhow::Result<HashSet<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT followee_id FROM follow_edges \
             WHERE follower_id = $1 AND state = 'active'",
        )
        .bind(follower_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(ids.into_iter().collect())
    }

    async fn active_follower_ids(&self, followee_id: Uuid) -> anyhow::Result<HashSet<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT follower_id FROM follow_edges \
             WHERE followee_id = $1 AND state = 'active'",
        )
        .bind(followee_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(ids.into_iter().collect())
    }

    async fn follower_count(&self, followee_id: Uuid) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM follow_edges WHERE followee_id = $1 AND state = 'active'",
        )
        .bind(followee_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(count)
    }

    async fn insert_follow_edge(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
        state: FollowState,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "INSERT INTO follow_edges (follower_id, followee_id, state) \
             SELECT $1, $2, $3::follow_state \
             WHERE $1 <> $2 \
             ON CONFLICT DO NOTHING",
        )
        .bind(follower_id)
        .bind(followee_id)
        .bind(state.as_db())
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_follow_state(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
        state: FollowState,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE follow_edges SET state = $3::follow_state \
             WHERE follower_id = $1 AND followee_id = $2",
        )
        .bind(follower_id)
        .bind(followee_id)
        .bind(state.as_db())
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_close_friend(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
        close_friend: bool,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE follow_edges SET close_friend = $3 \
             WHERE follower_id = $1 AND followee_id = $2 AND state = 'active'",
        )
        .bind(follower_id)
        .bind(followee_id)
        .bind(close_friend)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_follow_edge(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "DELETE FROM follow_edges WHERE follower_id = $1 AND followee_id = $2",
        )
        .bind(follower_id)
        .bind(followee_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn block_exists(&self, blocker_id: Uuid, blocked_id: Uuid) -> anyhow::Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM blocks WHERE blocker_id = $1 AND blocked_id = $2)",
        )
        .bind(blocker_id)
        .bind(blocked_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(exists)
    }

    async fn block_between(&self, a: Uuid, b: Uuid) -> anyhow::Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS ( \
                 SELECT 1 FROM blocks \
                 WHERE (blocker_id = $1 AND blocked_id = $2) \
                    OR (blocker_id = $2 AND blocked_id = $1) \
             )",
        )
        .bind(a)
        .bind(b)
        .fetch_one(self.db.pool())
        .await?;

        Ok(exists)
    }

    async fn blocked_either_ids(&self, viewer_id: Uuid) -> anyhow::Result<HashSet<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT CASE WHEN blocker_id = $1 THEN blocked_id ELSE blocker_id END \
             FROM blocks WHERE blocker_id = $1 OR blocked_id = $1",
        )
        .bind(viewer_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(ids.into_iter().collect())
    }

    async fn insert_block(&self, blocker_id: Uuid, blocked_id: Uuid) -> anyhow::Result<bool> {
        let mut tx = self.db.pool().begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO blocks (blocker_id, blocked_id) \
             SELECT $1, $2 \
             WHERE $1 <> $2 \
             ON CONFLICT DO NOTHING",
        )
        .bind(blocker_id)
        .bind(blocked_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "DELETE FROM follow_edges \
             WHERE (follower_id = $1 AND followee_id = $2) \
                OR (follower_id = $2 AND followee_id = $1)",
        )
        .bind(blocker_id)
        .bind(blocked_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(inserted.rows_affected() > 0)
    }

    async fn delete_block(&self, blocker_id: Uuid, blocked_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "DELETE FROM blocks WHERE blocker_id = $1 AND blocked_id = $2",
        )
        .bind(blocker_id)
        .bind(blocked_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mute_exists(&self, muter_id: Uuid, muted_id: Uuid) -> anyhow::Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM mutes WHERE muter_id = $1 AND muted_id = $2)",
        )
        .bind(muter_id)
        .bind(muted_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(exists)
    }

    async fn muted_ids(&self, muter_id: Uuid) -> anyhow::Result<HashSet<Uuid>> {
        let ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT muted_id FROM mutes WHERE muter_id = $1")
                .bind(muter_id)
                .fetch_all(self.db.pool())
                .await?;

        Ok(ids.into_iter().collect())
    }

    async fn insert_mute(&self, muter_id: Uuid, muted_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "INSERT INTO mutes (muter_id, muted_id) \
             SELECT $1, $2 \
             WHERE $1 <> $2 \
             ON CONFLICT DO NOTHING",
        )
        .bind(muter_id)
        .bind(muted_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_mute(&self, muter_id: Uuid, muted_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM mutes WHERE muter_id = $1 AND muted_id = $2")
            .bind(muter_id)
            .bind(muted_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn membership(
        &self,
        community_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<Option<CommunityMembership>> {
        let row = sqlx::query(
            "SELECT community_id, user_id, role::text AS role, joined_at \
             FROM community_members WHERE community_id = $1 AND user_id = $2",
        )
        .bind(community_id)
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        let membership = match row {
            Some(row) => {
                let role: String = row.get("role");
                let role = CommunityRole::from_db(&role)
                    .ok_or_else(|| anyhow!("unknown community role: {}", role))?;
                Some(CommunityMembership {
                    community_id: row.get("community_id"),
                    user_id: row.get("user_id"),
                    role,
                    joined_at: row.get("joined_at"),
                })
            }
            None => None,
        };

        Ok(membership)
    }

    async fn insert_membership(
        &self,
        community_id: Uuid,
        user_id: Uuid,
        role: CommunityRole,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "INSERT INTO community_members (community_id, user_id, role) \
             VALUES ($1, $2, $3::community_role) \
             ON CONFLICT DO NOTHING",
        )
        .bind(community_id)
        .bind(user_id)
        .bind(role.as_db())
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_membership(&self, community_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "DELETE FROM community_members WHERE community_id = $1 AND user_id = $2",
        )
        .bind(community_id)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn community_ban_exists(
        &self,
        community_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS ( \
                 SELECT 1 FROM community_bans WHERE community_id = $1 AND user_id = $2 \
             )",
        )
        .bind(community_id)
        .bind(user_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(exists)
    }

    async fn insert_community_ban(
        &self,
        community_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "INSERT INTO community_bans (community_id, user_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(community_id)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_community_ban(
        &self,
        community_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "DELETE FROM community_bans WHERE community_id = $1 AND user_id = $2",
        )
        .bind(community_id)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ContentStore for PgStore {
    async fn post(&self, id: Uuid) -> anyhow::Result<Option<Post>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM posts WHERE id = $1",
            POST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(map_post).transpose()
    }

    async fn posts_by_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM posts WHERE owner_id = $1 \
             ORDER BY created_at DESC, id DESC",
            POST_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(map_post).collect()
    }

    async fn posts_by_owners(&self, owner_ids: &[Uuid]) -> anyhow::Result<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM posts WHERE owner_id = ANY($1) \
             ORDER BY created_at DESC, id DESC",
            POST_COLUMNS
        ))
        .bind(owner_ids)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(map_post).collect()
    }

    async fn public_posts(&self) -> anyhow::Result<Vec<Post>> {
        // Pre-filters in SQL what the composer will re-check in memory: the
        // bulk form of the visibility predicate.
        let rows = sqlx::query(&format!(
            "SELECT {} FROM posts p \
             WHERE p.visibility = 'public' \
               AND EXISTS ( \
                   SELECT 1 FROM actors a \
                   WHERE a.id = p.owner_id \
                     AND a.status = 'active' \
                     AND a.privacy = 'public' \
               ) \
             ORDER BY p.created_at DESC, p.id DESC",
            "p.id, p.owner_id, p.community_id, p.title, p.body, \
             p.visibility::text AS visibility, p.edited, p.edited_at, p.created_at"
        ))
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(map_post).collect()
    }

    async fn posts_in_community(&self, community_id: Uuid) -> anyhow::Result<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM posts WHERE community_id = $1 \
             ORDER BY created_at DESC, id DESC",
            POST_COLUMNS
        ))
        .bind(community_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(map_post).collect()
    }

    async fn delete_post(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn saved_posts(&self, user_id: Uuid) -> anyhow::Result<Vec<(Post, OffsetDateTime)>> {
        let rows = sqlx::query(
            "SELECT p.id, p.owner_id, p.community_id, p.title, p.body, \
                    p.visibility::text AS visibility, p.edited, p.edited_at, p.created_at, \
                    s.created_at AS saved_at \
             FROM saved_posts s \
             JOIN posts p ON p.id = s.post_id \
             WHERE s.user_id = $1 \
             ORDER BY s.created_at DESC, p.id DESC",
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            let post = map_post(row)?;
            items.push((post, row.get("saved_at")));
        }
        Ok(items)
    }

    async fn insert_saved_post(&self, user_id: Uuid, post_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "INSERT INTO saved_posts (user_id, post_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(post_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_saved_post(&self, user_id: Uuid, post_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "DELETE FROM saved_posts WHERE user_id = $1 AND post_id = $2",
        )
        .bind(user_id)
        .bind(post_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn comment(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query(
            "SELECT id, post_id, author_id, parent_id, body, status::text AS status, created_at \
             FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(map_comment).transpose()
    }

    async fn comments_for_post(&self, post_id: Uuid) -> anyhow::Result<Vec<Comment>> {
        let rows = sqlx::query(
            "SELECT id, post_id, author_id, parent_id, body, status::text AS status, created_at \
             FROM comments WHERE post_id = $1 \
             ORDER BY created_at ASC, id ASC",
        )
        .bind(post_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(map_comment).collect()
    }

    async fn insert_comment(&self, comment: &Comment) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO comments (id, post_id, author_id, parent_id, body, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6::comment_status, $7)",
        )
        .bind(comment.id)
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(comment.parent_id)
        .bind(&comment.body)
        .bind(comment.status.as_db())
        .bind(comment.created_at)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    async fn active_reply_count(&self, comment_id: Uuid) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM comments WHERE parent_id = $1 AND status = 'active'",
        )
        .bind(comment_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(count)
    }

    async fn set_comment_status(&self, id: Uuid, status: CommentStatus) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE comments SET status = $2::comment_status WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_db())
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_reaction(&self, post_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "INSERT INTO reactions (post_id, user_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(post_id)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_reaction(&self, post_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "DELETE FROM reactions WHERE post_id = $1 AND user_id = $2",
        )
        .bind(post_id)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn engagement_counts(
        &self,
        post_ids: &[Uuid],
    ) -> anyhow::Result<HashMap<Uuid, EngagementCounts>> {
        let rows = sqlx::query(
            "SELECT p.id, \
                    (SELECT COUNT(DISTINCT r.user_id) FROM reactions r \
                     WHERE r.post_id = p.id) AS reactors, \
                    (SELECT COUNT(DISTINCT c.author_id) FROM comments c \
                     WHERE c.post_id = p.id AND c.status = 'active') AS commenters \
             FROM posts p WHERE p.id = ANY($1)",
        )
        .bind(post_ids)
        .fetch_all(self.db.pool())
        .await?;

        let mut counts = HashMap::with_capacity(rows.len());
        for row in rows {
            counts.insert(
                row.get("id"),
                EngagementCounts {
                    reactors: row.get("reactors"),
                    commenters: row.get("commenters"),
                },
            );
        }
        Ok(counts)
    }

    async fn insert_moderation_action(&self, action: &ModerationAction) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO moderation_actions \
             (id, community_id, actor_id, target_type, target_id, reason, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(action.id)
        .bind(action.community_id)
        .bind(action.actor_id)
        .bind(&action.target_type)
        .bind(action.target_id)
        .bind(&action.reason)
        .bind(action.created_at)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    async fn list_moderation_actions(&self, limit: i64) -> anyhow::Result<Vec<ModerationAction>> {
        let rows = sqlx::query(
            "SELECT id, community_id, actor_id, target_type, target_id, reason, created_at \
             FROM moderation_actions \
             ORDER BY created_at DESC, id DESC \
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        let mut actions = Vec::with_capacity(rows.len());
        for row in rows {
            actions.push(ModerationAction {
                id: row.get("id"),
                community_id: row.get("community_id"),
                actor_id: row.get("actor_id"),
                target_type: row.get("target_type"),
                target_id: row.get("target_id"),
                reason: row.get("reason"),
                created_at: row.get("created_at"),
            });
        }
        Ok(actions)
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn preferences(
        &self,
        user_id: Uuid,
    ) -> anyhow::Result<Option<NotificationPreferences>> {
        let row = sqlx::query(
            "SELECT user_id, new_post, comment, reaction, new_follower \
             FROM notification_preferences WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|row| NotificationPreferences {
            user_id: row.get("user_id"),
            new_post: row.get("new_post"),
            comment: row.get("comment"),
            reaction: row.get("reaction"),
            new_follower: row.get("new_follower"),
        }))
    }

    async fn upsert_preferences(&self, prefs: &NotificationPreferences) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO notification_preferences \
             (user_id, new_post, comment, reaction, new_follower) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (user_id) DO UPDATE \
             SET new_post = $2, comment = $3, reaction = $4, new_follower = $5",
        )
        .bind(prefs.user_id)
        .bind(prefs.new_post)
        .bind(prefs.comment)
        .bind(prefs.reaction)
        .bind(prefs.new_follower)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    async fn insert_notification(&self, notification: &Notification) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO notifications (id, user_id, actor_id, kind, payload, created_at) \
             VALUES ($1, $2, $3, $4::notification_kind, $5, $6)",
        )
        .bind(notification.id)
        .bind(notification.user_id)
        .bind(notification.actor_id)
        .bind(notification.kind.as_db())
        .bind(&notification.payload)
        .bind(notification.created_at)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    async fn notifications_for(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> anyhow::Result<Vec<Notification>> {
        let rows = sqlx::query(
            "SELECT id, user_id, actor_id, kind::text AS kind, payload, read_at, created_at \
             FROM notifications \
             WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        let mut notifications = Vec::with_capacity(rows.len());
        for row in rows {
            let kind: String = row.get("kind");
            let kind = NotificationKind::from_db(&kind)
                .ok_or_else(|| anyhow!("unknown notification kind: {}", kind))?;
            notifications.push(Notification {
                id: row.get("id"),
                user_id: row.get("user_id"),
                actor_id: row.get("actor_id"),
                kind,
                payload: row.get("payload"),
                read_at: row.get("read_at"),
                created_at: row.get("created_at"),
            });
        }
        Ok(notifications)
    }

    async fn mark_notification_read(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET read_at = now() \
             WHERE id = $1 AND user_id = $2 AND read_at IS NULL",
        )
        .bind(id)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
