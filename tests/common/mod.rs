#![allow(dead_code)]

use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use etoile::config::EngineConfig;
use etoile::domain::post::{Post, PostVisibility};
use etoile::domain::user::{AccountPrivacy, Actor, ActorStatus};
use etoile::infra::memory::MemoryStore;
use etoile::infra::store::RelationshipStore;
use etoile::Engine;

/// Engine over a fresh in-memory store, one per test.
pub struct TestEngine {
    pub store: MemoryStore,
    pub engine: Engine<MemoryStore>,
}

pub fn engine() -> TestEngine {
    engine_with(EngineConfig::default())
}

pub fn engine_with(config: EngineConfig) -> TestEngine {
    let store = MemoryStore::default();
    let engine = Engine::new(store.clone(), &config);
    TestEngine { store, engine }
}

/// Fixed origin so seeded timestamps order deterministically.
pub fn base_time() -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(1_700_000_000).expect("valid timestamp")
}

impl TestEngine {
    pub async fn create_user(&self, handle: &str) -> Uuid {
        self.create_user_with(handle, ActorStatus::Active, AccountPrivacy::Public)
            .await
    }

    pub async fn create_private_user(&self, handle: &str) -> Uuid {
        self.create_user_with(handle, ActorStatus::Active, AccountPrivacy::Private)
            .await
    }

    pub async fn create_user_with(
        &self,
        handle: &str,
        status: ActorStatus,
        privacy: AccountPrivacy,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.store
            .put_actor(Actor {
                id,
                handle: handle.to_string(),
                display_name: format!("Test User {}", handle),
                bio: None,
                status,
                privacy,
                created_at: base_time(),
            })
            .await;
        id
    }

    pub async fn set_status(&self, user_id: Uuid, status: ActorStatus) {
        let mut actor = self.store.actor(user_id).await.unwrap().unwrap();
        actor.status = status;
        self.store.put_actor(actor).await;
    }

    /// Seeds a post `minutes` after the base time so recency ordering is
    /// under test control.
    pub async fn create_post(
        &self,
        owner_id: Uuid,
        visibility: PostVisibility,
        minutes: i64,
    ) -> Uuid {
        self.create_community_post(owner_id, None, visibility, minutes)
            .await
    }

    pub async fn create_community_post(
        &self,
        owner_id: Uuid,
        community_id: Option<Uuid>,
        visibility: PostVisibility,
        minutes: i64,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.store
            .put_post(Post {
                id,
                owner_id,
                community_id,
                title: None,
                body: "last night I dreamt of flying".to_string(),
                visibility,
                edited: false,
                edited_at: None,
                created_at: base_time() + Duration::minutes(minutes),
            })
            .await;
        id
    }
}
