use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::community::CommunityRole;
use crate::domain::error::EngineError;
use crate::domain::moderation::ModerationAction;
use crate::infra::store::{ContentStore, RelationshipStore};

/// Membership and community moderation. Roles gate moderation actions;
/// every takedown and ban leaves an audit row.
#[derive(Clone)]
pub struct CommunityService<S> {
    store: S,
}

impl<S> CommunityService<S>
where
    S: RelationshipStore + ContentStore + Clone,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn join(&self, community_id: Uuid, user_id: Uuid) -> Result<bool, EngineError> {
        if self.store.community_ban_exists(community_id, user_id).await? {
            return Err(EngineError::Blocked);
        }
        Ok(self
            .store
            .insert_membership(community_id, user_id, CommunityRole::Member)
            .await?)
    }

    pub async fn leave(&self, community_id: Uuid, user_id: Uuid) -> Result<bool, EngineError> {
        Ok(self.store.delete_membership(community_id, user_id).await?)
    }

    pub async fn role(
        &self,
        community_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<CommunityRole>, EngineError> {
        Ok(self
            .store
            .membership(community_id, user_id)
            .await?
            .map(|membership| membership.role))
    }

    /// Bans remove the membership and keep the user out until unbanned.
    /// Moderators cannot ban other moderators or admins.
    pub async fn ban_member(
        &self,
        community_id: Uuid,
        moderator_id: Uuid,
        target_id: Uuid,
        reason: Option<String>,
    ) -> Result<(), EngineError> {
        self.require_moderator(community_id, moderator_id).await?;
        if let Some(target) = self.store.membership(community_id, target_id).await? {
            if target.role.can_moderate() {
                return Err(EngineError::NotModerator);
            }
        }
        self.store.delete_membership(community_id, target_id).await?;
        self.store
            .insert_community_ban(community_id, target_id)
            .await?;
        self.audit(community_id, moderator_id, "member", target_id, reason)
            .await?;
        Ok(())
    }

    pub async fn unban_member(
        &self,
        community_id: Uuid,
        moderator_id: Uuid,
        target_id: Uuid,
    ) -> Result<bool, EngineError> {
        self.require_moderator(community_id, moderator_id).await?;
        Ok(self
            .store
            .delete_community_ban(community_id, target_id)
            .await?)
    }

    /// Role-gated takedown of a post inside the community.
    pub async fn remove_post(
        &self,
        community_id: Uuid,
        moderator_id: Uuid,
        post_id: Uuid,
        reason: Option<String>,
    ) -> Result<(), EngineError> {
        self.require_moderator(community_id, moderator_id).await?;
        let post = self
            .store
            .post(post_id)
            .await?
            .ok_or(EngineError::NotFound)?;
        if post.community_id != Some(community_id) {
            return Err(EngineError::NotFound);
        }
        self.store.delete_post(post_id).await?;
        self.audit(community_id, moderator_id, "post", post_id, reason)
            .await?;
        Ok(())
    }

    pub async fn list_audit(&self, limit: i64) -> Result<Vec<ModerationAction>, EngineError> {
        Ok(self.store.list_moderation_actions(limit).await?)
    }

    async fn require_moderator(
        &self,
        community_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), EngineError> {
        match self.store.membership(community_id, user_id).await? {
            Some(membership) if membership.role.can_moderate() => Ok(()),
            _ => Err(EngineError::NotModerator),
        }
    }

    async fn audit(
        &self,
        community_id: Uuid,
        actor_id: Uuid,
        target_type: &str,
        target_id: Uuid,
        reason: Option<String>,
    ) -> Result<(), EngineError> {
        let action = ModerationAction {
            id: Uuid::new_v4(),
            community_id: Some(community_id),
            actor_id,
            target_type: target_type.to_string(),
            target_id,
            reason,
            created_at: OffsetDateTime::now_utc(),
        };
        self.store.insert_moderation_action(&action).await?;
        Ok(())
    }
}
