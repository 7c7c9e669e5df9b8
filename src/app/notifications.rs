use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::error::EngineError;
use crate::domain::notification::{Notification, NotificationKind, NotificationPreferences};
use crate::infra::store::NotificationStore;

#[derive(Clone)]
pub struct NotificationService<S> {
    store: S,
}

impl<S> NotificationService<S>
where
    S: NotificationStore + Clone,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Gate for every notification triggered by another actor's action.
    /// Self-actions never notify. An explicit opt-out suppresses the kind;
    /// a missing preference record means enabled. Delivery is at-most-once
    /// and non-durable: a failed insert is not retried.
    pub async fn maybe_notify(
        &self,
        recipient_id: Uuid,
        actor_id: Uuid,
        kind: NotificationKind,
        payload: Value,
    ) -> Result<Option<Notification>, EngineError> {
        if recipient_id == actor_id {
            return Ok(None);
        }
        let enabled = self
            .store
            .preferences(recipient_id)
            .await?
            .map_or(true, |prefs| prefs.allows(kind));
        if !enabled {
            return Ok(None);
        }

        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: recipient_id,
            actor_id: Some(actor_id),
            kind,
            payload,
            read_at: None,
            created_at: OffsetDateTime::now_utc(),
        };
        self.store.insert_notification(&notification).await?;
        Ok(Some(notification))
    }

    pub async fn list(&self, user_id: Uuid, limit: i64) -> Result<Vec<Notification>, EngineError> {
        Ok(self.store.notifications_for(user_id, limit).await?)
    }

    pub async fn mark_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, EngineError> {
        Ok(self
            .store
            .mark_notification_read(notification_id, user_id)
            .await?)
    }

    pub async fn preferences(
        &self,
        user_id: Uuid,
    ) -> Result<NotificationPreferences, EngineError> {
        Ok(self
            .store
            .preferences(user_id)
            .await?
            .unwrap_or_else(|| NotificationPreferences::for_user(user_id)))
    }

    /// The preference row is materialized lazily on the first settings
    /// write; a user who never touches settings stays on defaults.
    pub async fn set_preference(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        enabled: bool,
    ) -> Result<NotificationPreferences, EngineError> {
        let mut prefs = self
            .store
            .preferences(user_id)
            .await?
            .unwrap_or_else(|| NotificationPreferences::for_user(user_id));
        prefs.set(kind, enabled);
        self.store.upsert_preferences(&prefs).await?;
        Ok(prefs)
    }
}
