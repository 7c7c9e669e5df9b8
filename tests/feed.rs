//! Feed Composer Tests
//!
//! Covers each tab's candidate selection, ordering and filtering.

mod common;

use common::{base_time, engine, engine_with};
use etoile::app::feed::FeedTab;
use etoile::config::EngineConfig;
use etoile::domain::comment::{Comment, CommentStatus};
use etoile::domain::post::PostVisibility;
use etoile::domain::user::ActorStatus;
use etoile::infra::store::{ContentStore, RelationshipStore};
use time::Duration;
use uuid::Uuid;

// ===========================================================================
// Following
// ===========================================================================

#[tokio::test]
async fn following_feed_mixes_own_and_followed_by_recency() {
    let t = engine();
    let viewer = t.create_user("feed_fol_viewer").await;
    let followed = t.create_user("feed_fol_followed").await;
    let stranger = t.create_user("feed_fol_stranger").await;

    t.engine.social.follow(viewer, followed).await.unwrap();

    let older = t.create_post(followed, PostVisibility::Public, 1).await;
    let newer = t.create_post(viewer, PostVisibility::Private, 2).await;
    t.create_post(stranger, PostVisibility::Public, 3).await;

    let feed = t
        .engine
        .feed
        .compose(viewer, FeedTab::Following, 20)
        .await
        .unwrap();
    let ids: Vec<Uuid> = feed.iter().map(|post| post.id).collect();
    // Own private post is visible to self; the stranger's post is not a
    // candidate at all.
    assert_eq!(ids, vec![newer, older]);
}

#[tokio::test]
async fn following_feed_includes_friends_list_posts() {
    let t = engine();
    let viewer = t.create_user("feed_folfl_viewer").await;
    let followed = t.create_user("feed_folfl_followed").await;
    t.engine.social.follow(viewer, followed).await.unwrap();

    let post = t
        .create_post(followed, PostVisibility::FriendsList, 1)
        .await;

    let feed = t
        .engine
        .feed
        .compose(viewer, FeedTab::Following, 20)
        .await
        .unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].id, post);
}

// ===========================================================================
// For-you ranking
// ===========================================================================

#[tokio::test]
async fn foryou_ranks_by_distinct_engagement() {
    let t = engine();
    let viewer = t.create_user("feed_fy_viewer").await;
    let owner = t.create_user("feed_fy_owner").await;

    // p1 scores 6 (5 reactors + 1 commenter), p2 scores 4 (2 + 2). p2 is
    // newer, so recency alone would order them the other way.
    let p1 = t.create_post(owner, PostVisibility::Public, 1).await;
    let p2 = t.create_post(owner, PostVisibility::Public, 2).await;

    for i in 0..5 {
        let reactor = t.create_user(&format!("feed_fy_r1_{}", i)).await;
        t.store.insert_reaction(p1, reactor).await.unwrap();
    }
    for i in 0..2 {
        let reactor = t.create_user(&format!("feed_fy_r2_{}", i)).await;
        t.store.insert_reaction(p2, reactor).await.unwrap();
    }
    seed_comment(&t, p1, t.create_user("feed_fy_c1").await, 10).await;
    seed_comment(&t, p2, t.create_user("feed_fy_c2a").await, 11).await;
    seed_comment(&t, p2, t.create_user("feed_fy_c2b").await, 12).await;

    let feed = t
        .engine
        .feed
        .compose(viewer, FeedTab::ForYou, 20)
        .await
        .unwrap();
    let ids: Vec<Uuid> = feed.iter().map(|post| post.id).collect();
    assert_eq!(ids, vec![p1, p2]);
}

#[tokio::test]
async fn foryou_counts_each_commenter_once() {
    let t = engine();
    let viewer = t.create_user("feed_fyd_viewer").await;
    let owner = t.create_user("feed_fyd_owner").await;

    // One author commenting three times scores 1; two distinct authors
    // score 2.
    let noisy = t.create_post(owner, PostVisibility::Public, 2).await;
    let quiet = t.create_post(owner, PostVisibility::Public, 1).await;

    let chatterbox = t.create_user("feed_fyd_chatter").await;
    for minute in 10..13 {
        seed_comment(&t, noisy, chatterbox, minute).await;
    }
    seed_comment(&t, quiet, t.create_user("feed_fyd_a").await, 20).await;
    seed_comment(&t, quiet, t.create_user("feed_fyd_b").await, 21).await;

    let feed = t
        .engine
        .feed
        .compose(viewer, FeedTab::ForYou, 20)
        .await
        .unwrap();
    let ids: Vec<Uuid> = feed.iter().map(|post| post.id).collect();
    assert_eq!(ids, vec![quiet, noisy]);
}

#[tokio::test]
async fn foryou_ties_break_by_recency() {
    let t = engine();
    let viewer = t.create_user("feed_fyt_viewer").await;
    let owner = t.create_user("feed_fyt_owner").await;

    let older = t.create_post(owner, PostVisibility::Public, 1).await;
    let newer = t.create_post(owner, PostVisibility::Public, 2).await;

    let feed = t
        .engine
        .feed
        .compose(viewer, FeedTab::ForYou, 20)
        .await
        .unwrap();
    let ids: Vec<Uuid> = feed.iter().map(|post| post.id).collect();
    assert_eq!(ids, vec![newer, older]);
}

#[tokio::test]
async fn foryou_excludes_muted_but_profile_still_shows() {
    let t = engine();
    let viewer = t.create_user("feed_mute_viewer").await;
    let muted = t.create_user("feed_mute_owner").await;
    let post = t.create_post(muted, PostVisibility::Public, 1).await;

    t.engine.social.mute(viewer, muted).await.unwrap();

    let foryou = t
        .engine
        .feed
        .compose(viewer, FeedTab::ForYou, 20)
        .await
        .unwrap();
    assert!(foryou.is_empty());

    // Mute affects ranked exposure only, never direct access.
    let profile = t
        .engine
        .feed
        .compose(viewer, FeedTab::User(muted), 20)
        .await
        .unwrap();
    assert_eq!(profile.len(), 1);
    assert_eq!(profile[0].id, post);
    assert!(t
        .engine
        .posts
        .get_post(viewer, post)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn foryou_excludes_gated_owners_and_blocked() {
    let t = engine();
    let viewer = t.create_user("feed_fyx_viewer").await;

    let private_owner = t.create_private_user("feed_fyx_private").await;
    t.create_post(private_owner, PostVisibility::Public, 1).await;

    let blocked_owner = t.create_user("feed_fyx_blocked").await;
    t.create_post(blocked_owner, PostVisibility::Public, 2).await;
    t.engine.social.block(blocked_owner, viewer).await.unwrap();

    let friendly_owner = t.create_user("feed_fyx_friendly").await;
    t.create_post(friendly_owner, PostVisibility::FriendsList, 3)
        .await;

    let visible_owner = t.create_user("feed_fyx_visible").await;
    let visible = t.create_post(visible_owner, PostVisibility::Public, 4).await;

    let feed = t
        .engine
        .feed
        .compose(viewer, FeedTab::ForYou, 20)
        .await
        .unwrap();
    let ids: Vec<Uuid> = feed.iter().map(|post| post.id).collect();
    assert_eq!(ids, vec![visible]);
}

#[tokio::test]
async fn foryou_is_bounded_by_ranked_limit() {
    let t = engine_with(EngineConfig {
        ranked_feed_limit: 2,
        ..EngineConfig::default()
    });
    let viewer = t.create_user("feed_cap_viewer").await;
    let owner = t.create_user("feed_cap_owner").await;
    for minute in 0..5 {
        t.create_post(owner, PostVisibility::Public, minute).await;
    }

    let feed = t
        .engine
        .feed
        .compose(viewer, FeedTab::ForYou, 20)
        .await
        .unwrap();
    assert_eq!(feed.len(), 2);
}

// ===========================================================================
// Mine and saved
// ===========================================================================

#[tokio::test]
async fn mine_returns_all_own_posts_regardless_of_visibility() {
    let t = engine();
    let viewer = t.create_user("feed_mine_viewer").await;
    let public = t.create_post(viewer, PostVisibility::Public, 1).await;
    let private = t.create_post(viewer, PostVisibility::Private, 2).await;

    let feed = t
        .engine
        .feed
        .compose(viewer, FeedTab::Mine, 20)
        .await
        .unwrap();
    let ids: Vec<Uuid> = feed.iter().map(|post| post.id).collect();
    assert_eq!(ids, vec![private, public]);
}

#[tokio::test]
async fn saved_feed_orders_by_save_time() {
    let t = engine();
    let viewer = t.create_user("feed_sav_viewer").await;
    let owner = t.create_user("feed_sav_owner").await;

    // Saved later wins even though the post itself is older.
    let older_post = t.create_post(owner, PostVisibility::Public, 1).await;
    let newer_post = t.create_post(owner, PostVisibility::Public, 2).await;
    t.store
        .put_saved(viewer, newer_post, base_time() + Duration::minutes(10))
        .await;
    t.store
        .put_saved(viewer, older_post, base_time() + Duration::minutes(20))
        .await;

    let feed = t
        .engine
        .feed
        .compose(viewer, FeedTab::Saved, 20)
        .await
        .unwrap();
    let ids: Vec<Uuid> = feed.iter().map(|post| post.id).collect();
    assert_eq!(ids, vec![older_post, newer_post]);
}

#[tokio::test]
async fn saved_feed_drops_posts_from_since_blocked_owners() {
    let t = engine();
    let viewer = t.create_user("feed_savb_viewer").await;
    let owner = t.create_user("feed_savb_owner").await;
    let post = t.create_post(owner, PostVisibility::Public, 1).await;

    assert!(t.engine.posts.save_post(viewer, post).await.unwrap());
    t.engine.social.block(owner, viewer).await.unwrap();

    let feed = t
        .engine
        .feed
        .compose(viewer, FeedTab::Saved, 20)
        .await
        .unwrap();
    assert!(feed.is_empty());
}

#[tokio::test]
async fn saved_feed_drops_posts_from_since_suspended_owners() {
    let t = engine();
    let viewer = t.create_user("feed_savs_viewer").await;
    let owner = t.create_user("feed_savs_owner").await;
    let post = t.create_post(owner, PostVisibility::Public, 1).await;

    assert!(t.engine.posts.save_post(viewer, post).await.unwrap());
    t.set_status(owner, ActorStatus::Suspended).await;

    let feed = t
        .engine
        .feed
        .compose(viewer, FeedTab::Saved, 20)
        .await
        .unwrap();
    assert!(feed.is_empty());
}

// ===========================================================================
// Scoped tabs
// ===========================================================================

#[tokio::test]
async fn community_feed_scopes_and_filters() {
    let t = engine();
    let community = Uuid::new_v4();
    let viewer = t.create_user("feed_com_viewer").await;
    let member = t.create_user("feed_com_member").await;
    let hermit = t.create_private_user("feed_com_hermit").await;

    let open_post = t
        .create_community_post(member, Some(community), PostVisibility::Public, 1)
        .await;
    // Community scoping does not bypass the private-account gate.
    t.create_community_post(hermit, Some(community), PostVisibility::Public, 2)
        .await;
    // Posts outside the community are not candidates.
    t.create_post(member, PostVisibility::Public, 3).await;

    let feed = t
        .engine
        .feed
        .compose(viewer, FeedTab::Community(community), 20)
        .await
        .unwrap();
    let ids: Vec<Uuid> = feed.iter().map(|post| post.id).collect();
    assert_eq!(ids, vec![open_post]);
}

#[tokio::test]
async fn community_feed_is_empty_for_banned_viewer() {
    let t = engine();
    let community = Uuid::new_v4();
    let viewer = t.create_user("feed_comb_viewer").await;
    let member = t.create_user("feed_comb_member").await;
    t.create_community_post(member, Some(community), PostVisibility::Public, 1)
        .await;

    t.store
        .insert_community_ban(community, viewer)
        .await
        .unwrap();

    let feed = t
        .engine
        .feed
        .compose(viewer, FeedTab::Community(community), 20)
        .await
        .unwrap();
    assert!(feed.is_empty());
}

#[tokio::test]
async fn user_feed_is_empty_for_unapproved_viewer_of_private_account() {
    let t = engine();
    let target = t.create_private_user("feed_usr_target").await;
    let stranger = t.create_user("feed_usr_stranger").await;
    let follower = t.create_user("feed_usr_follower").await;
    let post = t.create_post(target, PostVisibility::Public, 1).await;

    t.engine.social.follow(follower, target).await.unwrap();
    t.engine.social.accept_request(target, follower).await.unwrap();

    let closed = t
        .engine
        .feed
        .compose(stranger, FeedTab::User(target), 20)
        .await
        .unwrap();
    assert!(closed.is_empty());

    let open = t
        .engine
        .feed
        .compose(follower, FeedTab::User(target), 20)
        .await
        .unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, post);
}

#[tokio::test]
async fn compose_truncates_to_requested_limit() {
    let t = engine();
    let viewer = t.create_user("feed_lim_viewer").await;
    for minute in 0..5 {
        t.create_post(viewer, PostVisibility::Public, minute).await;
    }

    let feed = t
        .engine
        .feed
        .compose(viewer, FeedTab::Mine, 3)
        .await
        .unwrap();
    assert_eq!(feed.len(), 3);
}

async fn seed_comment(t: &common::TestEngine, post_id: Uuid, author_id: Uuid, minute: i64) {
    t.store
        .insert_comment(&Comment {
            id: Uuid::new_v4(),
            post_id,
            author_id,
            parent_id: None,
            body: "so vivid".to_string(),
            status: CommentStatus::Active,
            created_at: base_time() + Duration::minutes(minute),
        })
        .await
        .unwrap();
}
