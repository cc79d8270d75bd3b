use axum::{
    extract::{rejection::JsonRejection, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::extractors::AuthUser,
    error::{method_not_allowed, ApiError},
    settings::{
        dto::{GetSettingsResponse, Settings, UpdateSettingsRequest, UpdateSettingsResponse},
        repo_types::UserSettings,
    },
    state::AppState,
};

pub fn settings_routes() -> Router<AppState> {
    Router::new().route(
        "/settings",
        get(get_settings)
            .put(update_settings)
            .fallback(method_not_allowed),
    )
}

impl From<UserSettings> for Settings {
    fn from(row: UserSettings) -> Self {
        Self {
            target_schedule: row.target_schedule,
            theme: row.theme,
            view_mode: row.view_mode,
            selected_day: row.selected_day,
        }
    }
}

#[instrument(skip(state))]
pub async fn get_settings(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<GetSettingsResponse>, ApiError> {
    let settings = UserSettings::find_by_user(&state.db, claims.user_id)
        .await
        .map_err(|e| ApiError::server("Failed to retrieve settings", e))?
        .map(Settings::from)
        .unwrap_or_default();

    Ok(Json(GetSettingsResponse {
        success: true,
        settings,
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_settings(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    payload: Result<Json<UpdateSettingsRequest>, JsonRejection>,
) -> Result<Json<UpdateSettingsResponse>, ApiError> {
    let Json(payload) =
        payload.map_err(|_| ApiError::validation("Invalid JSON in request body"))?;

    if let Some(theme) = payload.theme.as_deref() {
        if !matches!(theme, "light" | "dark") {
            return Err(ApiError::validation(
                r#"theme must be either "light" or "dark""#,
            ));
        }
    }
    if let Some(view_mode) = payload.view_mode.as_deref() {
        if !matches!(view_mode, "week" | "day" | "analytics") {
            return Err(ApiError::validation(
                r#"viewMode must be "week", "day", or "analytics""#,
            ));
        }
    }
    if let Some(day) = payload.selected_day {
        if !(0..=6).contains(&day) {
            return Err(ApiError::validation(
                "selectedDay must be a number between 0 and 6",
            ));
        }
    }

    let settings = UserSettings::upsert(
        &state.db,
        claims.user_id,
        payload.target_schedule.as_ref(),
        payload.theme.as_deref(),
        payload.view_mode.as_deref(),
        payload.selected_day,
    )
    .await
    .map_err(|e| ApiError::server("Failed to update settings", e))?;

    info!(user_id = %claims.user_id, "settings updated");
    Ok(Json(UpdateSettingsResponse {
        success: true,
        message: "Settings updated successfully",
        settings: settings.into(),
    }))
}
