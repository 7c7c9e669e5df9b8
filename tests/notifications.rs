//! Notification Gate Tests
//!
//! Covers self-suppression, per-kind preferences and the fail-open default.

mod common;

use common::engine;
use etoile::domain::notification::NotificationKind;
use etoile::domain::post::PostVisibility;
use etoile::infra::store::NotificationStore;
use serde_json::json;

#[tokio::test]
async fn missing_preference_row_defaults_to_enabled() {
    let t = engine();
    let recipient = t.create_user("ntf_open_recipient").await;
    let actor = t.create_user("ntf_open_actor").await;

    // No settings were ever touched: deliver.
    let delivered = t
        .engine
        .notifications
        .maybe_notify(recipient, actor, NotificationKind::Comment, json!({}))
        .await
        .unwrap();
    assert!(delivered.is_some());
}

#[tokio::test]
async fn self_actions_never_notify() {
    let t = engine();
    let user = t.create_user("ntf_self").await;

    let delivered = t
        .engine
        .notifications
        .maybe_notify(user, user, NotificationKind::Reaction, json!({}))
        .await
        .unwrap();
    assert!(delivered.is_none());
    assert!(t.engine.notifications.list(user, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn preferences_are_per_kind_and_independent() {
    let t = engine();
    let recipient = t.create_user("ntf_kind_recipient").await;
    let actor = t.create_user("ntf_kind_actor").await;
    let post = t.create_post(recipient, PostVisibility::Public, 0).await;

    t.engine
        .notifications
        .set_preference(recipient, NotificationKind::Comment, false)
        .await
        .unwrap();

    t.engine
        .engagement
        .comment(actor, post, None, "hello".to_string())
        .await
        .unwrap();
    t.engine.engagement.react(actor, post).await.unwrap();

    // The comment was suppressed; the reaction still went through.
    let notifications = t.engine.notifications.list(recipient, 10).await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, NotificationKind::Reaction);
}

#[tokio::test]
async fn follow_request_rides_the_new_follower_toggle() {
    let t = engine();
    let followee = t.create_private_user("ntf_req_followee").await;
    let follower = t.create_user("ntf_req_follower").await;

    t.engine
        .notifications
        .set_preference(followee, NotificationKind::NewFollower, false)
        .await
        .unwrap();

    // The follow itself still succeeds; only the notification is dropped.
    t.engine.social.follow(follower, followee).await.unwrap();
    assert!(t
        .engine
        .notifications
        .list(followee, 10)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn settings_write_materializes_the_preference_row() {
    let t = engine();
    let user = t.create_user("ntf_lazy").await;

    assert!(t.store.preferences(user).await.unwrap().is_none());

    let prefs = t
        .engine
        .notifications
        .set_preference(user, NotificationKind::Reaction, false)
        .await
        .unwrap();
    assert!(!prefs.reaction);
    assert!(prefs.comment);

    let stored = t.store.preferences(user).await.unwrap().unwrap();
    assert!(!stored.reaction);
    assert!(stored.new_follower);
}

#[tokio::test]
async fn mark_read_is_idempotent() {
    let t = engine();
    let recipient = t.create_user("ntf_read_recipient").await;
    let actor = t.create_user("ntf_read_actor").await;

    let notification = t
        .engine
        .notifications
        .maybe_notify(recipient, actor, NotificationKind::NewFollower, json!({}))
        .await
        .unwrap()
        .unwrap();

    assert!(t
        .engine
        .notifications
        .mark_read(notification.id, recipient)
        .await
        .unwrap());
    assert!(!t
        .engine
        .notifications
        .mark_read(notification.id, recipient)
        .await
        .unwrap());

    let listed = t.engine.notifications.list(recipient, 10).await.unwrap();
    assert!(listed[0].read_at.is_some());
}

#[tokio::test]
async fn mark_read_checks_the_recipient() {
    let t = engine();
    let recipient = t.create_user("ntf_owner_recipient").await;
    let actor = t.create_user("ntf_owner_actor").await;
    let other = t.create_user("ntf_owner_other").await;

    let notification = t
        .engine
        .notifications
        .maybe_notify(recipient, actor, NotificationKind::Comment, json!({}))
        .await
        .unwrap()
        .unwrap();

    assert!(!t
        .engine
        .notifications
        .mark_read(notification.id, other)
        .await
        .unwrap());
}
