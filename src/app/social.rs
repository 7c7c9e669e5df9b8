use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::app::notifications::NotificationService;
use crate::domain::error::EngineError;
use crate::domain::notification::NotificationKind;
use crate::domain::social_graph::FollowState;
use crate::domain::user::AccountPrivacy;
use crate::infra::store::{NotificationStore, RelationshipStore};

/// Follow-edge lifecycle: none -> pending -> active, with cancel, reject,
/// unfollow and block transitions. One edge per ordered pair.
#[derive(Clone)]
pub struct SocialService<S> {
    store: S,
    notifications: NotificationService<S>,
    follower_limit: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    /// The followee is public; the edge is active immediately.
    Accepted,
    /// The followee is private; the edge waits for approval.
    Requested,
}

#[derive(Debug, Clone)]
pub struct RelationshipStatus {
    pub following: Option<FollowState>,
    pub followed_by: Option<FollowState>,
    pub is_blocking: bool,
    pub is_blocked_by: bool,
    pub is_muting: bool,
}

impl<S> SocialService<S>
where
    S: RelationshipStore + NotificationStore + Clone,
{
    pub fn new(store: S, follower_limit: i64) -> Self {
        Self {
            notifications: NotificationService::new(store.clone()),
            store,
            follower_limit,
        }
    }

    pub async fn follow(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
    ) -> Result<FollowOutcome, EngineError> {
        if follower_id == followee_id {
            return Err(EngineError::SelfFollow);
        }
        let followee = self
            .store
            .actor(followee_id)
            .await?
            .ok_or(EngineError::NotFound)?;
        if self.store.block_between(follower_id, followee_id).await? {
            return Err(EngineError::Blocked);
        }
        match self.store.follow_edge(follower_id, followee_id).await? {
            Some(edge) if edge.state == FollowState::Active => {
                return Err(EngineError::AlreadyFollowing)
            }
            Some(_) => return Err(EngineError::RequestAlreadySent),
            None => {}
        }
        if self.store.follower_count(followee_id).await? >= self.follower_limit {
            return Err(EngineError::FollowerLimit);
        }

        let state = match followee.privacy {
            AccountPrivacy::Private => FollowState::Pending,
            AccountPrivacy::Public => FollowState::Active,
        };
        self.store
            .insert_follow_edge(follower_id, followee_id, state)
            .await?;

        match state {
            FollowState::Active => {
                self.notify(followee_id, follower_id, NotificationKind::NewFollower)
                    .await;
                Ok(FollowOutcome::Accepted)
            }
            FollowState::Pending => {
                self.notify(followee_id, follower_id, NotificationKind::FollowRequest)
                    .await;
                Ok(FollowOutcome::Requested)
            }
        }
    }

    /// The followee approves a pending request addressed to them.
    pub async fn accept_request(
        &self,
        followee_id: Uuid,
        follower_id: Uuid,
    ) -> Result<(), EngineError> {
        match self.store.follow_edge(follower_id, followee_id).await? {
            Some(edge) if edge.state == FollowState::Pending => {}
            _ => return Err(EngineError::NotFound),
        }
        self.store
            .set_follow_state(follower_id, followee_id, FollowState::Active)
            .await?;
        self.notify(follower_id, followee_id, NotificationKind::RequestAccepted)
            .await;
        Ok(())
    }

    pub async fn reject_request(
        &self,
        followee_id: Uuid,
        follower_id: Uuid,
    ) -> Result<(), EngineError> {
        self.remove_pending(follower_id, followee_id).await
    }

    pub async fn cancel_request(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
    ) -> Result<(), EngineError> {
        self.remove_pending(follower_id, followee_id).await
    }

    async fn remove_pending(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
    ) -> Result<(), EngineError> {
        match self.store.follow_edge(follower_id, followee_id).await? {
            Some(edge) if edge.state == FollowState::Pending => {}
            _ => return Err(EngineError::NotFound),
        }
        self.store
            .delete_follow_edge(follower_id, followee_id)
            .await?;
        Ok(())
    }

    /// Removes an active or pending edge.
    pub async fn unfollow(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
    ) -> Result<(), EngineError> {
        if !self
            .store
            .delete_follow_edge(follower_id, followee_id)
            .await?
        {
            return Err(EngineError::NotFollowing);
        }
        Ok(())
    }

    /// Blocking severs follow edges in both directions at creation time.
    pub async fn block(&self, blocker_id: Uuid, blocked_id: Uuid) -> Result<bool, EngineError> {
        Ok(self.store.insert_block(blocker_id, blocked_id).await?)
    }

    pub async fn unblock(&self, blocker_id: Uuid, blocked_id: Uuid) -> Result<bool, EngineError> {
        Ok(self.store.delete_block(blocker_id, blocked_id).await?)
    }

    pub async fn mute(&self, muter_id: Uuid, muted_id: Uuid) -> Result<bool, EngineError> {
        Ok(self.store.insert_mute(muter_id, muted_id).await?)
    }

    pub async fn unmute(&self, muter_id: Uuid, muted_id: Uuid) -> Result<bool, EngineError> {
        Ok(self.store.delete_mute(muter_id, muted_id).await?)
    }

    /// The list owner marks one of their accepted followers as a close
    /// friend. The flag is inert for visibility for now.
    pub async fn set_close_friend(
        &self,
        owner_id: Uuid,
        friend_id: Uuid,
        close_friend: bool,
    ) -> Result<(), EngineError> {
        if !self
            .store
            .set_close_friend(friend_id, owner_id, close_friend)
            .await?
        {
            return Err(EngineError::NotFollowing);
        }
        Ok(())
    }

    pub async fn relationship_status(
        &self,
        viewer_id: Uuid,
        other_id: Uuid,
    ) -> Result<RelationshipStatus, EngineError> {
        let following = self
            .store
            .follow_edge(viewer_id, other_id)
            .await?
            .map(|edge| edge.state);
        let followed_by = self
            .store
            .follow_edge(other_id, viewer_id)
            .await?
            .map(|edge| edge.state);

        Ok(RelationshipStatus {
            following,
            followed_by,
            is_blocking: self.store.block_exists(viewer_id, other_id).await?,
            is_blocked_by: self.store.block_exists(other_id, viewer_id).await?,
            is_muting: self.store.mute_exists(viewer_id, other_id).await?,
        })
    }

    async fn notify(&self, recipient_id: Uuid, actor_id: Uuid, kind: NotificationKind) {
        // Best-effort: losing a notification never fails the follow action.
        if let Err(err) = self
            .notifications
            .maybe_notify(recipient_id, actor_id, kind, json!({}))
            .await
        {
            warn!(error = ?err, "failed to record follow notification");
        }
    }
}
