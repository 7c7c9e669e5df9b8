use std::collections::HashMap;

use serde_json::json;
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::app::notifications::NotificationService;
use crate::app::visibility::VisibilityService;
use crate::domain::comment::{Comment, CommentNode, CommentStatus};
use crate::domain::error::EngineError;
use crate::domain::notification::NotificationKind;
use crate::domain::post::Post;
use crate::infra::store::{ContentStore, NotificationStore, RelationshipStore};

/// Reactions and comment threads, including the delete guard: a comment
/// with active replies stays until its subtree is removed bottom-up.
#[derive(Clone)]
pub struct EngagementService<S> {
    store: S,
    visibility: VisibilityService<S>,
    notifications: NotificationService<S>,
    thread_depth_cap: u32,
}

impl<S> EngagementService<S>
where
    S: RelationshipStore + ContentStore + NotificationStore + Clone,
{
    pub fn new(store: S, thread_depth_cap: u32) -> Self {
        Self {
            visibility: VisibilityService::new(store.clone()),
            notifications: NotificationService::new(store.clone()),
            store,
            thread_depth_cap,
        }
    }

    /// One reaction per (post, user); repeats return false.
    pub async fn react(&self, actor_id: Uuid, post_id: Uuid) -> Result<bool, EngineError> {
        let post = self.visible_post(actor_id, post_id).await?;
        let inserted = self.store.insert_reaction(post_id, actor_id).await?;
        if inserted {
            self.notify(
                post.owner_id,
                actor_id,
                NotificationKind::Reaction,
                json!({ "post_id": post_id }),
            )
            .await;
        }
        Ok(inserted)
    }

    pub async fn unreact(&self, actor_id: Uuid, post_id: Uuid) -> Result<bool, EngineError> {
        Ok(self.store.delete_reaction(post_id, actor_id).await?)
    }

    pub async fn comment(
        &self,
        actor_id: Uuid,
        post_id: Uuid,
        parent_id: Option<Uuid>,
        body: String,
    ) -> Result<Comment, EngineError> {
        let post = self.visible_post(actor_id, post_id).await?;
        if let Some(parent_id) = parent_id {
            match self.store.comment(parent_id).await? {
                Some(parent)
                    if parent.post_id == post_id && parent.status == CommentStatus::Active => {}
                _ => return Err(EngineError::NotFound),
            }
        }

        let comment = Comment {
            id: Uuid::new_v4(),
            post_id,
            author_id: actor_id,
            parent_id,
            body,
            status: CommentStatus::Active,
            created_at: OffsetDateTime::now_utc(),
        };
        self.store.insert_comment(&comment).await?;
        self.notify(
            post.owner_id,
            actor_id,
            NotificationKind::Comment,
            json!({ "post_id": post_id, "comment_id": comment.id }),
        )
        .await;
        Ok(comment)
    }

    pub async fn can_delete(&self, comment_id: Uuid) -> Result<bool, EngineError> {
        Ok(self.store.active_reply_count(comment_id).await? == 0)
    }

    /// Refuses to cascade: callers delete leaves before ancestors.
    pub async fn delete_comment(
        &self,
        author_id: Uuid,
        comment_id: Uuid,
    ) -> Result<(), EngineError> {
        let comment = self
            .store
            .comment(comment_id)
            .await?
            .ok_or(EngineError::NotFound)?;
        if comment.author_id != author_id || comment.status != CommentStatus::Active {
            return Err(EngineError::NotFound);
        }
        if self.store.active_reply_count(comment_id).await? > 0 {
            return Err(EngineError::HasActiveReplies);
        }
        self.store
            .set_comment_status(comment_id, CommentStatus::Removed)
            .await?;
        Ok(())
    }

    /// Renders the active comment forest of a post, bounded at the
    /// configured depth. Children past the cap come back empty instead of
    /// recursing without limit on pathological nesting.
    pub async fn thread(
        &self,
        viewer_id: Uuid,
        post_id: Uuid,
    ) -> Result<Vec<CommentNode>, EngineError> {
        self.visible_post(viewer_id, post_id).await?;

        let mut children: HashMap<Option<Uuid>, Vec<Comment>> = HashMap::new();
        for comment in self.store.comments_for_post(post_id).await? {
            if comment.status == CommentStatus::Active {
                children.entry(comment.parent_id).or_default().push(comment);
            }
        }
        for bucket in children.values_mut() {
            bucket.sort_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            });
        }

        Ok(build_nodes(&children, None, 1, self.thread_depth_cap))
    }

    /// Content the actor cannot see reads as absent, not forbidden.
    async fn visible_post(&self, actor_id: Uuid, post_id: Uuid) -> Result<Post, EngineError> {
        let post = self
            .store
            .post(post_id)
            .await?
            .ok_or(EngineError::NotFound)?;
        if !self
            .visibility
            .can_view(actor_id, post.owner_id, post.visibility)
            .await?
        {
            return Err(EngineError::NotFound);
        }
        Ok(post)
    }

    async fn notify(
        &self,
        recipient_id: Uuid,
        actor_id: Uuid,
        kind: NotificationKind,
        payload: serde_json::Value,
    ) {
        if let Err(err) = self
            .notifications
            .maybe_notify(recipient_id, actor_id, kind, payload)
            .await
        {
            warn!(error = ?err, "failed to record engagement notification");
        }
    }
}

fn build_nodes(
    children: &HashMap<Option<Uuid>, Vec<Comment>>,
    parent: Option<Uuid>,
    depth: u32,
    cap: u32,
) -> Vec<CommentNode> {
    if depth > cap {
        return Vec::new();
    }
    children
        .get(&parent)
        .map(|bucket| {
            bucket
                .iter()
                .map(|comment| CommentNode {
                    comment: comment.clone(),
                    replies: build_nodes(children, Some(comment.id), depth + 1, cap),
                })
                .collect()
        })
        .unwrap_or_default()
}
