use std::collections::HashSet;

use uuid::Uuid;

use crate::domain::error::EngineError;
use crate::domain::post::PostVisibility;
use crate::domain::social_graph::FollowState;
use crate::domain::user::{AccountPrivacy, Actor, ActorStatus};
use crate::infra::store::{ContentStore, RelationshipStore};

/// Relationship facts for a single (viewer, owner) pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationshipFacts {
    pub blocked_either_way: bool,
    pub following_active: bool,
}

/// The visibility decision. Both the per-pair check and the bulk feed
/// filter end up here; rule order matters.
///
/// A pending follow grants nothing, and a private account gates even
/// public-flagged posts behind an accepted follow. Absent data means deny.
pub fn post_visible(
    viewer_id: Uuid,
    owner: &Actor,
    visibility: PostVisibility,
    facts: &RelationshipFacts,
) -> bool {
    // Owners always see their own content, whatever their account status.
    if viewer_id == owner.id {
        return true;
    }
    if owner.status != ActorStatus::Active {
        return false;
    }
    if facts.blocked_either_way {
        return false;
    }
    match visibility {
        PostVisibility::Private => false,
        // Follow-gated only; the close-friend flag is not consulted here.
        PostVisibility::FriendsList => facts.following_active,
        PostVisibility::Public => match owner.privacy {
            AccountPrivacy::Public => true,
            AccountPrivacy::Private => facts.following_active,
        },
    }
}

#[derive(Clone)]
pub struct VisibilityService<S> {
    store: S,
}

impl<S> VisibilityService<S>
where
    S: RelationshipStore + ContentStore + Clone,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Single-pair form, used for detail fetches.
    pub async fn can_view(
        &self,
        viewer_id: Uuid,
        owner_id: Uuid,
        visibility: PostVisibility,
    ) -> Result<bool, EngineError> {
        let Some(owner) = self.store.actor(owner_id).await? else {
            return Ok(false);
        };
        let facts = self.facts(viewer_id, owner_id).await?;
        Ok(post_visible(viewer_id, &owner, visibility, &facts))
    }

    /// Detail fetch by post id; an absent post reads as not visible.
    pub async fn can_view_post(
        &self,
        viewer_id: Uuid,
        post_id: Uuid,
    ) -> Result<bool, EngineError> {
        let Some(post) = self.store.post(post_id).await? else {
            return Ok(false);
        };
        self.can_view(viewer_id, post.owner_id, post.visibility).await
    }

    async fn facts(
        &self,
        viewer_id: Uuid,
        owner_id: Uuid,
    ) -> Result<RelationshipFacts, EngineError> {
        if viewer_id == owner_id {
            return Ok(RelationshipFacts::default());
        }
        let blocked = self.store.block_between(viewer_id, owner_id).await?;
        let following = matches!(
            self.store.follow_edge(viewer_id, owner_id).await?,
            Some(edge) if edge.state == FollowState::Active
        );
        Ok(RelationshipFacts {
            blocked_either_way: blocked,
            following_active: following,
        })
    }

    /// Snapshot of the viewer's edges for bulk filtering.
    pub async fn lens(&self, viewer_id: Uuid) -> Result<ViewerLens, EngineError> {
        Ok(ViewerLens {
            viewer_id,
            following: self.store.active_followee_ids(viewer_id).await?,
            blocked: self.store.blocked_either_ids(viewer_id).await?,
        })
    }
}

/// Set-builder form of the resolver: one relationship snapshot applied as a
/// filter predicate over feed candidates. Must stay consistent with
/// [`VisibilityService::can_view`].
#[derive(Debug, Clone)]
pub struct ViewerLens {
    viewer_id: Uuid,
    following: HashSet<Uuid>,
    blocked: HashSet<Uuid>,
}

impl ViewerLens {
    pub fn permits(&self, owner: &Actor, visibility: PostVisibility) -> bool {
        let facts = RelationshipFacts {
            blocked_either_way: self.blocked.contains(&owner.id),
            following_active: self.following.contains(&owner.id),
        };
        post_visible(self.viewer_id, owner, visibility, &facts)
    }
}
