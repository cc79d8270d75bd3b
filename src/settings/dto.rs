use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// User settings as returned to the client. Absent rows fall back to
/// these defaults wholesale.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub target_schedule: Value,
    pub theme: String,
    pub view_mode: String,
    pub selected_day: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target_schedule: json!({ "bedTime": "", "riseTime": "" }),
            theme: "light".into(),
            view_mode: "week".into(),
            selected_day: 0,
        }
    }
}

/// Partial update: only provided fields change.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    pub target_schedule: Option<Value>,
    pub theme: Option<String>,
    pub view_mode: Option<String>,
    pub selected_day: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct GetSettingsResponse {
    pub success: bool,
    pub settings: Settings,
}

#[derive(Debug, Serialize)]
pub struct UpdateSettingsResponse {
    pub success: bool,
    pub message: &'static str,
    pub settings: Settings,
}
