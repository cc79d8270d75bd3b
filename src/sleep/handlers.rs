use axum::{
    extract::{rejection::JsonRejection, Query, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::extractors::AuthUser,
    error::{method_not_allowed, ApiError},
    sleep::{
        dto::{
            AllWeeksQuery, GetWeekResponse, ListWeeksResponse, SaveWeekRequest, SaveWeekResponse,
            WeekData, WeekQuery,
        },
        repo_types::SleepWeek,
    },
    state::AppState,
};

pub fn sleep_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/sleep/week",
            post(save_week).get(get_week).fallback(method_not_allowed),
        )
        .route("/sleep/weeks", get(get_all_weeks).fallback(method_not_allowed))
}

impl From<SleepWeek> for WeekData {
    fn from(week: SleepWeek) -> Self {
        Self {
            year: week.year,
            week_number: week.week_number,
            week_start_date: week.week_start_date,
            week_data: week.week_data,
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn save_week(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    payload: Result<Json<SaveWeekRequest>, JsonRejection>,
) -> Result<Json<SaveWeekResponse>, ApiError> {
    let Json(payload) =
        payload.map_err(|_| ApiError::validation("Invalid JSON in request body"))?;

    let (Some(year), Some(week_number), Some(week_start_date), Some(week_data)) = (
        payload.year,
        payload.week_number,
        payload.week_start_date,
        payload.week_data,
    ) else {
        return Err(ApiError::validation(
            "year, weekNumber, weekStartDate, and weekData are required",
        ));
    };

    if week_data.as_array().map(Vec::len) != Some(7) {
        return Err(ApiError::validation("weekData must be an array of 7 days"));
    }

    let week_id = SleepWeek::upsert(
        &state.db,
        claims.user_id,
        year,
        week_number,
        &week_start_date,
        &week_data,
    )
    .await
    .map_err(|e| ApiError::server("Failed to save week data", e))?;

    info!(user_id = %claims.user_id, year, week_number, "week saved");
    Ok(Json(SaveWeekResponse {
        success: true,
        message: "Week data saved successfully",
        week_id: week_id.to_string(),
    }))
}

#[instrument(skip(state))]
pub async fn get_week(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(query): Query<WeekQuery>,
) -> Result<Json<GetWeekResponse>, ApiError> {
    let (Some(year), Some(week)) = (query.year, query.week) else {
        return Err(ApiError::validation(
            "year and week query parameters are required",
        ));
    };
    let (Ok(year), Ok(week)) = (year.parse::<i32>(), week.parse::<i32>()) else {
        return Err(ApiError::validation("year and week must be valid numbers"));
    };

    let data = SleepWeek::find_week(&state.db, claims.user_id, year, week)
        .await
        .map_err(|e| ApiError::server("Failed to retrieve week data", e))?
        .map(WeekData::from)
        // an unsaved week reads back as an empty document
        .unwrap_or(WeekData {
            year,
            week_number: week,
            week_start_date: String::new(),
            week_data: serde_json::Value::Array(Vec::new()),
        });

    Ok(Json(GetWeekResponse {
        success: true,
        data,
    }))
}

#[instrument(skip(state))]
pub async fn get_all_weeks(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(query): Query<AllWeeksQuery>,
) -> Result<Json<ListWeeksResponse>, ApiError> {
    let year = match query.year {
        Some(raw) => Some(
            raw.parse::<i32>()
                .map_err(|_| ApiError::validation("year must be a valid number"))?,
        ),
        None => None,
    };

    let weeks = SleepWeek::list_for_user(&state.db, claims.user_id, year)
        .await
        .map_err(|e| ApiError::server("Failed to retrieve weeks data", e))?;

    Ok(Json(ListWeeksResponse {
        success: true,
        weeks: weeks.into_iter().map(WeekData::from).collect(),
    }))
}
