use chrono::Utc;
use color_eyre::Result;
use ulid::Ulid;

use super::models::{
    QuizResultRow, ResponseRow, ResponseWeightRow, SessionDetail, SessionResultDetail,
    SessionResultRow, SessionRow, SessionStatus,
};
use super::Db;

const SESSION_COLUMNS: &str = "id, quiz_id, user_id, anonymous_token, status, entered_at, \
                               started_at, completed_at, is_lead, lead_score";
const RESPONSE_COLUMNS: &str = "id, session_id, question_id, answer_id, answered_at";

/// Partial update for a session; absent fields are left untouched.
#[derive(Debug, Default)]
pub struct SessionPatch {
    pub status: Option<SessionStatus>,
    pub user_id: Option<i64>,
    pub is_lead: Option<bool>,
    pub lead_score: Option<f64>,
}

impl Db {
    /// Create a quiz-taking attempt in `viewed` status with a fresh opaque
    /// token, used before any identity is attached. quiz_id validity is
    /// enforced by the foreign key, not checked here.
    pub async fn create_session(&self, quiz_id: i64) -> Result<SessionRow> {
        let anonymous_token = Ulid::new().to_string();

        let session = sqlx::query_as::<_, SessionRow>(&format!(
            "INSERT INTO quiz_sessions (quiz_id, anonymous_token, status, entered_at) \
             VALUES (?, ?, 'viewed', ?) RETURNING {SESSION_COLUMNS}"
        ))
        .bind(quiz_id)
        .bind(&anonymous_token)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("session created for quiz={quiz_id}: session_id={}", session.id);
        Ok(session)
    }

    pub async fn get_session(&self, session_id: i64) -> Result<Option<SessionRow>> {
        let session = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM quiz_sessions WHERE id = ?"
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    pub async fn get_session_detail(&self, session_id: i64) -> Result<Option<SessionDetail>> {
        let Some(session) = self.get_session(session_id).await? else {
            return Ok(None);
        };

        let user = match session.user_id {
            Some(user_id) => self.get_user(user_id).await?,
            None => None,
        };

        let quiz_responses = self.responses_for_session(session_id).await?;

        let session_results = sqlx::query_as::<_, SessionResultRow>(
            "SELECT id, session_id, result_id, score, is_primary \
             FROM session_results WHERE session_id = ? ORDER BY id",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        let mut details = Vec::with_capacity(session_results.len());
        for session_result in session_results {
            let quiz_result = sqlx::query_as::<_, QuizResultRow>(
                "SELECT id, quiz_id, title, description, image_url, email_content, \
                        is_lead, min_score, display_order \
                 FROM quiz_results WHERE id = ?",
            )
            .bind(session_result.result_id)
            .fetch_one(&self.pool)
            .await?;
            details.push(SessionResultDetail {
                session_result,
                quiz_result,
            });
        }

        Ok(Some(SessionDetail {
            session,
            user,
            quiz_responses,
            session_results: details,
        }))
    }

    pub async fn responses_for_session(&self, session_id: i64) -> Result<Vec<ResponseRow>> {
        let responses = sqlx::query_as::<_, ResponseRow>(&format!(
            "SELECT {RESPONSE_COLUMNS} FROM quiz_responses WHERE session_id = ? ORDER BY id"
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(responses)
    }

    /// Record an answer, overwriting any earlier answer to the same
    /// question. A first answer on a fresh session moves it forward to
    /// `started`; the promotion is conditional so out-of-order or duplicate
    /// calls never clobber a later status.
    pub async fn upsert_response(
        &self,
        session_id: i64,
        question_id: i64,
        answer_id: i64,
    ) -> Result<ResponseRow> {
        let response = sqlx::query_as::<_, ResponseRow>(&format!(
            r#"
            INSERT INTO quiz_responses (session_id, question_id, answer_id, answered_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(session_id, question_id)
            DO UPDATE SET answer_id = excluded.answer_id, answered_at = excluded.answered_at
            RETURNING {RESPONSE_COLUMNS}
            "#
        ))
        .bind(session_id)
        .bind(question_id)
        .bind(answer_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        sqlx::query(
            "UPDATE quiz_sessions SET status = 'started', started_at = ? \
             WHERE id = ? AND status = 'viewed'",
        )
        .bind(Utc::now())
        .bind(session_id)
        .execute(&self.pool)
        .await?;

        Ok(response)
    }

    pub async fn update_session(
        &self,
        session_id: i64,
        patch: SessionPatch,
    ) -> Result<Option<SessionRow>> {
        match patch.status {
            Some(SessionStatus::Started) => {
                sqlx::query(
                    "UPDATE quiz_sessions SET status = 'started', started_at = ? WHERE id = ?",
                )
                .bind(Utc::now())
                .bind(session_id)
                .execute(&self.pool)
                .await?;
            }
            Some(SessionStatus::Completed) => {
                sqlx::query(
                    "UPDATE quiz_sessions SET status = 'completed', completed_at = ? WHERE id = ?",
                )
                .bind(Utc::now())
                .bind(session_id)
                .execute(&self.pool)
                .await?;
            }
            // 'viewed' is the initial state; there is no transition back into it.
            Some(SessionStatus::Viewed) | None => {}
        }

        if let Some(user_id) = patch.user_id {
            sqlx::query("UPDATE quiz_sessions SET user_id = ? WHERE id = ?")
                .bind(user_id)
                .bind(session_id)
                .execute(&self.pool)
                .await?;
        }
        if let Some(is_lead) = patch.is_lead {
            sqlx::query("UPDATE quiz_sessions SET is_lead = ? WHERE id = ?")
                .bind(is_lead)
                .bind(session_id)
                .execute(&self.pool)
                .await?;
        }
        if let Some(lead_score) = patch.lead_score {
            sqlx::query("UPDATE quiz_sessions SET lead_score = ? WHERE id = ?")
                .bind(lead_score)
                .bind(session_id)
                .execute(&self.pool)
                .await?;
        }

        self.get_session(session_id).await
    }

    /// Every (recorded answer, result mapping) pair for a session — the
    /// resolver's input. Answers without mappings contribute no rows.
    pub async fn response_weights(&self, session_id: i64) -> Result<Vec<ResponseWeightRow>> {
        let weights = sqlx::query_as::<_, ResponseWeightRow>(
            r#"
            SELECT w.answer_id, w.result_id, w.weight
            FROM quiz_responses r
            JOIN answer_result_weights w ON w.answer_id = r.answer_id
            WHERE r.session_id = ?
            ORDER BY r.id, w.id
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(weights)
    }

    /// Replace the session's persisted outcome: delete everything, then
    /// insert the primary row if there is one. Delete-then-insert keeps
    /// recomputation idempotent.
    pub async fn replace_session_result(
        &self,
        session_id: i64,
        primary: Option<(i64, f64)>,
    ) -> Result<()> {
        sqlx::query("DELETE FROM session_results WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        if let Some((result_id, score)) = primary {
            sqlx::query(
                "INSERT INTO session_results (session_id, result_id, score, is_primary) \
                 VALUES (?, ?, ?, TRUE)",
            )
            .bind(session_id)
            .bind(result_id)
            .bind(score)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    pub async fn mark_completed(
        &self,
        session_id: i64,
        lead_score: f64,
        is_lead: bool,
    ) -> Result<Option<SessionRow>> {
        sqlx::query(
            "UPDATE quiz_sessions \
             SET status = 'completed', completed_at = ?, lead_score = ?, is_lead = ? \
             WHERE id = ?",
        )
        .bind(Utc::now())
        .bind(lead_score)
        .bind(is_lead)
        .bind(session_id)
        .execute(&self.pool)
        .await?;

        self.get_session(session_id).await
    }

    pub async fn session_results_for(&self, session_id: i64) -> Result<Vec<SessionResultRow>> {
        let rows = sqlx::query_as::<_, SessionResultRow>(
            "SELECT id, session_id, result_id, score, is_primary \
             FROM session_results WHERE session_id = ? ORDER BY id",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
