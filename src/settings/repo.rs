use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::settings::repo_types::UserSettings;

impl UserSettings {
    pub async fn find_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<UserSettings>> {
        let settings = sqlx::query_as::<_, UserSettings>(
            r#"
            SELECT user_id, target_schedule, theme, view_mode, selected_day,
                   created_at, updated_at
            FROM user_settings
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(settings)
    }

    /// Partial upsert: NULL parameters leave the stored column (or its
    /// default, on first insert) untouched.
    pub async fn upsert(
        db: &PgPool,
        user_id: Uuid,
        target_schedule: Option<&Value>,
        theme: Option<&str>,
        view_mode: Option<&str>,
        selected_day: Option<i32>,
    ) -> anyhow::Result<UserSettings> {
        let settings = sqlx::query_as::<_, UserSettings>(
            r#"
            INSERT INTO user_settings (user_id, target_schedule, theme, view_mode, selected_day)
            VALUES (
                $1,
                COALESCE($2, '{"bedTime": "", "riseTime": ""}'::jsonb),
                COALESCE($3, 'light'),
                COALESCE($4, 'week'),
                COALESCE($5, 0)
            )
            ON CONFLICT (user_id)
            DO UPDATE SET target_schedule = COALESCE($2, user_settings.target_schedule),
                          theme = COALESCE($3, user_settings.theme),
                          view_mode = COALESCE($4, user_settings.view_mode),
                          selected_day = COALESCE($5, user_settings.selected_day),
                          updated_at = now()
            RETURNING user_id, target_schedule, theme, view_mode, selected_day,
                      created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(target_schedule)
        .bind(theme)
        .bind(view_mode)
        .bind(selected_day)
        .fetch_one(db)
        .await?;
        Ok(settings)
    }
}
