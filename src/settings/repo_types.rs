use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Stored per-user settings row, one per user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSettings {
    pub user_id: Uuid,
    pub target_schedule: Value,
    pub theme: String,
    pub view_mode: String,
    pub selected_day: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
