//! Visibility Resolver Tests
//!
//! Covers the per-pair decision, the bulk lens, and their consistency.

mod common;

use common::engine;
use etoile::domain::post::PostVisibility;
use etoile::domain::social_graph::FollowState;
use etoile::domain::user::{AccountPrivacy, ActorStatus};
use etoile::infra::store::RelationshipStore;

const ALL_VISIBILITIES: [PostVisibility; 3] = [
    PostVisibility::Public,
    PostVisibility::FriendsList,
    PostVisibility::Private,
];

const ALL_FOLLOW_STATES: [Option<FollowState>; 3] =
    [None, Some(FollowState::Pending), Some(FollowState::Active)];

#[tokio::test]
async fn blocked_pairs_never_see_each_other() {
    for visibility in ALL_VISIBILITIES {
        for follow in ALL_FOLLOW_STATES {
            let t = engine();
            let viewer = t.create_user("vis_block_viewer").await;
            let owner = t.create_user("vis_block_owner").await;

            t.store.insert_block(owner, viewer).await.unwrap();
            if let Some(state) = follow {
                t.store
                    .insert_follow_edge(viewer, owner, state)
                    .await
                    .unwrap();
            }

            let allowed = t
                .engine
                .visibility
                .can_view(viewer, owner, visibility)
                .await
                .unwrap();
            assert!(
                !allowed,
                "block must deny visibility={:?} follow={:?}",
                visibility, follow
            );
        }
    }
}

#[tokio::test]
async fn private_account_gates_even_public_posts() {
    let t = engine();
    let owner = t.create_private_user("vis_private_owner").await;
    let stranger = t.create_user("vis_private_stranger").await;
    let follower = t.create_user("vis_private_follower").await;
    t.store
        .insert_follow_edge(follower, owner, FollowState::Active)
        .await
        .unwrap();

    assert!(!t
        .engine
        .visibility
        .can_view(stranger, owner, PostVisibility::Public)
        .await
        .unwrap());
    assert!(!t
        .engine
        .visibility
        .can_view(stranger, owner, PostVisibility::FriendsList)
        .await
        .unwrap());
    assert!(t
        .engine
        .visibility
        .can_view(follower, owner, PostVisibility::Public)
        .await
        .unwrap());
    assert!(t
        .engine
        .visibility
        .can_view(follower, owner, PostVisibility::FriendsList)
        .await
        .unwrap());
}

#[tokio::test]
async fn friends_list_requires_active_follow() {
    let t = engine();
    let owner = t.create_user("vis_fl_owner").await;
    let follower = t.create_user("vis_fl_follower").await;
    let stranger = t.create_user("vis_fl_stranger").await;
    t.store
        .insert_follow_edge(follower, owner, FollowState::Active)
        .await
        .unwrap();

    assert!(t
        .engine
        .visibility
        .can_view(follower, owner, PostVisibility::FriendsList)
        .await
        .unwrap());
    assert!(!t
        .engine
        .visibility
        .can_view(stranger, owner, PostVisibility::FriendsList)
        .await
        .unwrap());
}

#[tokio::test]
async fn pending_follow_grants_nothing() {
    let t = engine();
    let owner = t.create_private_user("vis_pending_owner").await;
    let requester = t.create_user("vis_pending_requester").await;
    t.store
        .insert_follow_edge(requester, owner, FollowState::Pending)
        .await
        .unwrap();

    for visibility in ALL_VISIBILITIES {
        assert!(
            !t.engine
                .visibility
                .can_view(requester, owner, visibility)
                .await
                .unwrap(),
            "pending must not grant {:?}",
            visibility
        );
    }
}

#[tokio::test]
async fn inactive_owner_hidden_except_from_self() {
    for status in [ActorStatus::Suspended, ActorStatus::Deactivated] {
        let t = engine();
        let owner = t
            .create_user_with("vis_inactive_owner", status, AccountPrivacy::Public)
            .await;
        let follower = t.create_user("vis_inactive_follower").await;
        t.store
            .insert_follow_edge(follower, owner, FollowState::Active)
            .await
            .unwrap();

        assert!(!t
            .engine
            .visibility
            .can_view(follower, owner, PostVisibility::Public)
            .await
            .unwrap());
        // Own posts stay visible to the owner.
        assert!(t
            .engine
            .visibility
            .can_view(owner, owner, PostVisibility::Private)
            .await
            .unwrap());
    }
}

#[tokio::test]
async fn private_visibility_is_owner_only() {
    let t = engine();
    let owner = t.create_user("vis_po_owner").await;
    let follower = t.create_user("vis_po_follower").await;
    t.store
        .insert_follow_edge(follower, owner, FollowState::Active)
        .await
        .unwrap();

    assert!(!t
        .engine
        .visibility
        .can_view(follower, owner, PostVisibility::Private)
        .await
        .unwrap());
    assert!(t
        .engine
        .visibility
        .can_view(owner, owner, PostVisibility::Private)
        .await
        .unwrap());
}

#[tokio::test]
async fn missing_owner_denies() {
    let t = engine();
    let viewer = t.create_user("vis_missing_viewer").await;
    let ghost = uuid::Uuid::new_v4();

    assert!(!t
        .engine
        .visibility
        .can_view(viewer, ghost, PostVisibility::Public)
        .await
        .unwrap());
    assert!(!t.engine.visibility.can_view_post(viewer, ghost).await.unwrap());
}

// The per-pair predicate and the bulk lens must agree on the whole state
// space: owner status x owner privacy x post visibility x block x follow
// state x viewer-is-owner.
#[tokio::test]
async fn single_pair_and_bulk_filter_agree() {
    for status in [
        ActorStatus::Active,
        ActorStatus::Suspended,
        ActorStatus::Deactivated,
    ] {
        for privacy in [AccountPrivacy::Public, AccountPrivacy::Private] {
            for visibility in ALL_VISIBILITIES {
                for blocked in [false, true] {
                    for follow in ALL_FOLLOW_STATES {
                        for viewer_is_owner in [false, true] {
                            let t = engine();
                            let owner = t
                                .create_user_with("vis_enum_owner", status, privacy)
                                .await;
                            let viewer = if viewer_is_owner {
                                owner
                            } else {
                                t.create_user("vis_enum_viewer").await
                            };
                            if blocked {
                                t.store.insert_block(viewer, owner).await.unwrap();
                            }
                            if let Some(state) = follow {
                                t.store
                                    .insert_follow_edge(viewer, owner, state)
                                    .await
                                    .unwrap();
                            }

                            let single = t
                                .engine
                                .visibility
                                .can_view(viewer, owner, visibility)
                                .await
                                .unwrap();
                            let lens = t.engine.visibility.lens(viewer).await.unwrap();
                            let owner_actor =
                                t.store.actor(owner).await.unwrap().unwrap();
                            let bulk = lens.permits(&owner_actor, visibility);

                            assert_eq!(
                                single, bulk,
                                "status={:?} privacy={:?} visibility={:?} blocked={} \
                                 follow={:?} viewer_is_owner={}",
                                status, privacy, visibility, blocked, follow, viewer_is_owner
                            );
                        }
                    }
                }
            }
        }
    }
}
