use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body for saving a week of sleep entries. `week_data` is the
/// client's document: an array of 7 day objects the server never
/// inspects beyond its length.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveWeekRequest {
    pub year: Option<i32>,
    pub week_number: Option<i32>,
    pub week_start_date: Option<String>,
    pub week_data: Option<Value>,
}

/// Query parameters for fetching a single week. Kept as strings so a
/// non-numeric value gets its own error instead of a generic 400.
#[derive(Debug, Deserialize)]
pub struct WeekQuery {
    pub year: Option<String>,
    pub week: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AllWeeksQuery {
    pub year: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekData {
    pub year: i32,
    pub week_number: i32,
    pub week_start_date: String,
    pub week_data: Value,
}

#[derive(Debug, Serialize)]
pub struct GetWeekResponse {
    pub success: bool,
    pub data: WeekData,
}

#[derive(Debug, Serialize)]
pub struct ListWeeksResponse {
    pub success: bool,
    pub weeks: Vec<WeekData>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveWeekResponse {
    pub success: bool,
    pub message: &'static str,
    pub week_id: String,
}
