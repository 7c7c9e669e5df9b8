use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationAction {
    pub id: Uuid,
    pub community_id: Option<Uuid>,
    pub actor_id: Uuid,
    pub target_type: String,
    pub target_id: Uuid,
    pub reason: Option<String>,
    pub created_at: OffsetDateTime,
}
