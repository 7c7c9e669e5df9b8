pub mod app;
pub mod config;
pub mod domain;
pub mod infra;

use crate::app::community::CommunityService;
use crate::app::engagement::EngagementService;
use crate::app::feed::FeedService;
use crate::app::notifications::NotificationService;
use crate::app::posts::PostService;
use crate::app::social::SocialService;
use crate::app::visibility::VisibilityService;
use crate::config::EngineConfig;
use crate::infra::store::{ContentStore, NotificationStore, RelationshipStore};

/// Every engine service wired over a single store, the way the API layer
/// holds its state.
#[derive(Clone)]
pub struct Engine<S> {
    pub visibility: VisibilityService<S>,
    pub social: SocialService<S>,
    pub feed: FeedService<S>,
    pub notifications: NotificationService<S>,
    pub engagement: EngagementService<S>,
    pub posts: PostService<S>,
    pub community: CommunityService<S>,
}

impl<S> Engine<S>
where
    S: RelationshipStore + ContentStore + NotificationStore + Clone,
{
    pub fn new(store: S, config: &EngineConfig) -> Self {
        Self {
            visibility: VisibilityService::new(store.clone()),
            social: SocialService::new(store.clone(), config.follower_limit),
            feed: FeedService::new(store.clone(), config.ranked_feed_limit),
            notifications: NotificationService::new(store.clone()),
            engagement: EngagementService::new(store.clone(), config.thread_depth_cap),
            posts: PostService::new(store.clone()),
            community: CommunityService::new(store),
        }
    }
}
