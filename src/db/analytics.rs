use chrono::{DateTime, Utc};
use color_eyre::Result;

use super::models::ResultCountRow;
use super::Db;

impl Db {
    pub async fn sessions_viewed_count(&self, quiz_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quiz_sessions WHERE quiz_id = ?")
            .bind(quiz_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub async fn sessions_started_count(&self, quiz_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM quiz_sessions \
             WHERE quiz_id = ? AND status IN ('started', 'completed')",
        )
        .bind(quiz_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn sessions_completed_count(&self, quiz_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM quiz_sessions WHERE quiz_id = ? AND status = 'completed'",
        )
        .bind(quiz_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn sessions_lead_count(&self, quiz_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM quiz_sessions WHERE quiz_id = ? AND is_lead = TRUE",
        )
        .bind(quiz_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Completion timestamps since the cutoff; grouped by calendar date in
    /// the handler rather than in SQL.
    pub async fn completion_times(
        &self,
        quiz_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>> {
        let times: Vec<DateTime<Utc>> = sqlx::query_scalar(
            "SELECT completed_at FROM quiz_sessions \
             WHERE quiz_id = ? AND status = 'completed' AND completed_at >= ? \
             ORDER BY completed_at",
        )
        .bind(quiz_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(times)
    }

    /// How many completed sessions landed on each primary result.
    pub async fn result_distribution(&self, quiz_id: i64) -> Result<Vec<ResultCountRow>> {
        let rows = sqlx::query_as::<_, ResultCountRow>(
            r#"
            SELECT qr.title AS result, COUNT(*) AS count
            FROM session_results sr
            JOIN quiz_sessions s ON s.id = sr.session_id
            JOIN quiz_results qr ON qr.id = sr.result_id
            WHERE sr.is_primary = TRUE AND s.quiz_id = ? AND s.status = 'completed'
            GROUP BY sr.result_id, qr.title
            ORDER BY count DESC, qr.title
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
