use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::app::notifications::NotificationService;
use crate::app::visibility::VisibilityService;
use crate::domain::error::EngineError;
use crate::domain::notification::NotificationKind;
use crate::domain::post::{Post, PostVisibility};
use crate::infra::store::{ContentStore, NotificationStore, RelationshipStore};

#[derive(Clone)]
pub struct PostService<S> {
    store: S,
    visibility: VisibilityService<S>,
    notifications: NotificationService<S>,
}

impl<S> PostService<S>
where
    S: RelationshipStore + ContentStore + NotificationStore + Clone,
{
    pub fn new(store: S) -> Self {
        Self {
            visibility: VisibilityService::new(store.clone()),
            notifications: NotificationService::new(store.clone()),
            store,
        }
    }

    /// Detail fetch behind the single-pair visibility check. Invisible
    /// posts read as absent.
    pub async fn get_post(
        &self,
        viewer_id: Uuid,
        post_id: Uuid,
    ) -> Result<Option<Post>, EngineError> {
        let Some(post) = self.store.post(post_id).await? else {
            return Ok(None);
        };
        if !self
            .visibility
            .can_view(viewer_id, post.owner_id, post.visibility)
            .await?
        {
            return Ok(None);
        }
        Ok(Some(post))
    }

    /// Fans a new-post notification out to the owner's accepted followers,
    /// one gate pass per recipient. Owner-only posts announce to nobody.
    /// Returns how many notifications were recorded; dropped deliveries are
    /// logged and skipped, never retried.
    pub async fn announce_post(
        &self,
        owner_id: Uuid,
        post_id: Uuid,
    ) -> Result<usize, EngineError> {
        let post = self
            .store
            .post(post_id)
            .await?
            .ok_or(EngineError::NotFound)?;
        if post.owner_id != owner_id {
            return Err(EngineError::NotFound);
        }
        if post.visibility == PostVisibility::Private {
            return Ok(0);
        }

        let mut delivered = 0;
        for follower_id in self.store.active_follower_ids(owner_id).await? {
            match self
                .notifications
                .maybe_notify(
                    follower_id,
                    owner_id,
                    NotificationKind::NewPost,
                    json!({ "post_id": post_id }),
                )
                .await
            {
                Ok(Some(_)) => delivered += 1,
                Ok(None) => {}
                Err(err) => {
                    warn!(error = ?err, %follower_id, "failed to record new-post notification");
                }
            }
        }
        Ok(delivered)
    }

    pub async fn delete_post(&self, owner_id: Uuid, post_id: Uuid) -> Result<(), EngineError> {
        let post = self
            .store
            .post(post_id)
            .await?
            .ok_or(EngineError::NotFound)?;
        if post.owner_id != owner_id {
            return Err(EngineError::NotFound);
        }
        self.store.delete_post(post_id).await?;
        Ok(())
    }

    /// Only content the viewer can currently see may be saved.
    pub async fn save_post(&self, viewer_id: Uuid, post_id: Uuid) -> Result<bool, EngineError> {
        if self.get_post(viewer_id, post_id).await?.is_none() {
            return Err(EngineError::NotFound);
        }
        Ok(self.store.insert_saved_post(viewer_id, post_id).await?)
    }

    pub async fn unsave_post(&self, viewer_id: Uuid, post_id: Uuid) -> Result<bool, EngineError> {
        Ok(self.store.delete_saved_post(viewer_id, post_id).await?)
    }
}
