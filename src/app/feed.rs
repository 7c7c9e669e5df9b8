use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::app::visibility::VisibilityService;
use crate::domain::error::EngineError;
use crate::domain::post::Post;
use crate::domain::user::{AccountPrivacy, Actor, ActorStatus};
use crate::infra::store::{ContentStore, RelationshipStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedTab {
    /// Own posts plus accepted followees, by recency.
    Following,
    /// Ranked public posts from public accounts, by engagement.
    ForYou,
    /// Everything the viewer owns, any visibility.
    Mine,
    /// Explicit saves, by save time.
    Saved,
    Community(Uuid),
    User(Uuid),
}

#[derive(Clone)]
pub struct FeedService<S> {
    store: S,
    visibility: VisibilityService<S>,
    ranked_limit: i64,
}

impl<S> FeedService<S>
where
    S: RelationshipStore + ContentStore + Clone,
{
    pub fn new(store: S, ranked_limit: i64) -> Self {
        Self {
            visibility: VisibilityService::new(store.clone()),
            store,
            ranked_limit,
        }
    }

    /// Assembles one feed page. Scoped tabs come back empty, never as an
    /// error, when the scope target is closed to the viewer.
    pub async fn compose(
        &self,
        viewer_id: Uuid,
        tab: FeedTab,
        limit: i64,
    ) -> Result<Vec<Post>, EngineError> {
        let mut posts = match tab {
            FeedTab::Following => self.following(viewer_id).await?,
            FeedTab::ForYou => self.for_you(viewer_id).await?,
            FeedTab::Mine => self.mine(viewer_id).await?,
            FeedTab::Saved => self.saved(viewer_id).await?,
            FeedTab::Community(community_id) => self.community(viewer_id, community_id).await?,
            FeedTab::User(target_id) => self.user(viewer_id, target_id).await?,
        };
        posts.truncate(limit.max(0) as usize);
        Ok(posts)
    }

    async fn following(&self, viewer_id: Uuid) -> Result<Vec<Post>, EngineError> {
        let mut owner_ids: Vec<Uuid> = self
            .store
            .active_followee_ids(viewer_id)
            .await?
            .into_iter()
            .collect();
        owner_ids.push(viewer_id);

        let candidates = self.store.posts_by_owners(&owner_ids).await?;
        Ok(sort_recency(
            self.filter_visible(viewer_id, candidates).await?,
        ))
    }

    async fn for_you(&self, viewer_id: Uuid) -> Result<Vec<Post>, EngineError> {
        let lens = self.visibility.lens(viewer_id).await?;
        let muted = self.store.muted_ids(viewer_id).await?;
        let candidates = self.store.public_posts().await?;
        let owners = self.owners_of(&candidates).await?;

        // Ranked exposure only: public posts from public, active accounts,
        // minus blocked-either-way and muted owners.
        let mut visible: Vec<Post> = candidates
            .into_iter()
            .filter(|post| {
                owners.get(&post.owner_id).is_some_and(|owner| {
                    owner.status == ActorStatus::Active
                        && owner.privacy == AccountPrivacy::Public
                        && !muted.contains(&owner.id)
                        && lens.permits(owner, post.visibility)
                })
            })
            .collect();

        let ids: Vec<Uuid> = visible.iter().map(|post| post.id).collect();
        let counts = self.store.engagement_counts(&ids).await?;
        visible.sort_by(|a, b| {
            let score_a = counts.get(&a.id).map_or(0, |c| c.score());
            let score_b = counts.get(&b.id).map_or(0, |c| c.score());
            score_b
                .cmp(&score_a)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| b.id.cmp(&a.id))
        });
        visible.truncate(self.ranked_limit.max(0) as usize);
        Ok(visible)
    }

    async fn mine(&self, viewer_id: Uuid) -> Result<Vec<Post>, EngineError> {
        Ok(sort_recency(self.store.posts_by_owner(viewer_id).await?))
    }

    async fn saved(&self, viewer_id: Uuid) -> Result<Vec<Post>, EngineError> {
        let lens = self.visibility.lens(viewer_id).await?;
        let mut rows = self.store.saved_posts(viewer_id).await?;
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.id.cmp(&a.0.id)));

        let posts: Vec<Post> = rows.into_iter().map(|(post, _)| post).collect();
        let owners = self.owners_of(&posts).await?;

        // A save on a since-blocked or since-suspended owner's post must
        // not resurface it.
        Ok(posts
            .into_iter()
            .filter(|post| {
                owners
                    .get(&post.owner_id)
                    .is_some_and(|owner| lens.permits(owner, post.visibility))
            })
            .collect())
    }

    async fn community(
        &self,
        viewer_id: Uuid,
        community_id: Uuid,
    ) -> Result<Vec<Post>, EngineError> {
        if self
            .store
            .community_ban_exists(community_id, viewer_id)
            .await?
        {
            return Ok(Vec::new());
        }
        let candidates = self.store.posts_in_community(community_id).await?;
        Ok(sort_recency(
            self.filter_visible(viewer_id, candidates).await?,
        ))
    }

    async fn user(&self, viewer_id: Uuid, target_id: Uuid) -> Result<Vec<Post>, EngineError> {
        let candidates = self.store.posts_by_owner(target_id).await?;
        Ok(sort_recency(
            self.filter_visible(viewer_id, candidates).await?,
        ))
    }

    /// Community scoping never bypasses the privacy and block rules; every
    /// candidate passes through the same lens.
    async fn filter_visible(
        &self,
        viewer_id: Uuid,
        candidates: Vec<Post>,
    ) -> Result<Vec<Post>, EngineError> {
        let lens = self.visibility.lens(viewer_id).await?;
        let owners = self.owners_of(&candidates).await?;
        Ok(candidates
            .into_iter()
            .filter(|post| {
                owners
                    .get(&post.owner_id)
                    .is_some_and(|owner| lens.permits(owner, post.visibility))
            })
            .collect())
    }

    async fn owners_of(&self, posts: &[Post]) -> Result<HashMap<Uuid, Actor>, EngineError> {
        let ids: Vec<Uuid> = posts
            .iter()
            .map(|post| post.owner_id)
            .collect::<HashSet<Uuid>>()
            .into_iter()
            .collect();
        Ok(self.store.actors(&ids).await?)
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
