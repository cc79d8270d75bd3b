use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// A stored week of sleep entries, unique per user/year/week.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SleepWeek {
    pub id: Uuid,
    pub user_id: Uuid,
    pub year: i32,
    pub week_number: i32,
    pub week_start_date: String,
    pub week_data: Value, // opaque 7-day document owned by the client
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
