use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::sleep::repo_types::SleepWeek;

impl SleepWeek {
    /// Create or replace the week document for `(user, year, week)`.
    pub async fn upsert(
        db: &PgPool,
        user_id: Uuid,
        year: i32,
        week_number: i32,
        week_start_date: &str,
        week_data: &Value,
    ) -> anyhow::Result<Uuid> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO sleep_weeks (user_id, year, week_number, week_start_date, week_data)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, year, week_number)
            DO UPDATE SET week_start_date = EXCLUDED.week_start_date,
                          week_data = EXCLUDED.week_data,
                          updated_at = now()
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(year)
        .bind(week_number)
        .bind(week_start_date)
        .bind(week_data)
        .fetch_one(db)
        .await?;
        Ok(id)
    }

    /// Find one week for a user.
    pub async fn find_week(
        db: &PgPool,
        user_id: Uuid,
        year: i32,
        week_number: i32,
    ) -> anyhow::Result<Option<SleepWeek>> {
        let week = sqlx::query_as::<_, SleepWeek>(
            r#"
            SELECT id, user_id, year, week_number, week_start_date, week_data,
                   created_at, updated_at
            FROM sleep_weeks
            WHERE user_id = $1 AND year = $2 AND week_number = $3
            "#,
        )
        .bind(user_id)
        .bind(year)
        .bind(week_number)
        .fetch_optional(db)
        .await?;
        Ok(week)
    }

    /// All weeks for a user, most recent first, optionally scoped to a year.
    pub async fn list_for_user(
        db: &PgPool,
        user_id: Uuid,
        year: Option<i32>,
    ) -> anyhow::Result<Vec<SleepWeek>> {
        let weeks = sqlx::query_as::<_, SleepWeek>(
            r#"
            SELECT id, user_id, year, week_number, week_start_date, week_data,
                   created_at, updated_at
            FROM sleep_weeks
            WHERE user_id = $1 AND ($2::int IS NULL OR year = $2)
            ORDER BY year DESC, week_number DESC
            "#,
        )
        .bind(user_id)
        .bind(year)
        .fetch_all(db)
        .await?;
        Ok(weeks)
    }
}
