use color_eyre::Result;

use super::models::{AnswerWeightRow, QuizResultRow};
use super::Db;

const RESULT_COLUMNS: &str =
    "id, quiz_id, title, description, image_url, email_content, is_lead, min_score, display_order";

/// Partial update for a quiz result; absent fields are left untouched.
#[derive(Debug, Default)]
pub struct QuizResultPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub email_content: Option<String>,
    pub is_lead: Option<bool>,
    pub min_score: Option<f64>,
    pub display_order: Option<i64>,
}

impl Db {
    pub async fn results_for_quiz(&self, quiz_id: i64) -> Result<Vec<QuizResultRow>> {
        let results = sqlx::query_as::<_, QuizResultRow>(&format!(
            "SELECT {RESULT_COLUMNS} FROM quiz_results WHERE quiz_id = ? \
             ORDER BY display_order, id"
        ))
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(results)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_result(
        &self,
        quiz_id: i64,
        title: &str,
        description: Option<&str>,
        image_url: Option<&str>,
        email_content: Option<&str>,
        is_lead: bool,
        min_score: f64,
    ) -> Result<QuizResultRow> {
        let result = sqlx::query_as::<_, QuizResultRow>(&format!(
            "INSERT INTO quiz_results \
             (quiz_id, title, description, image_url, email_content, is_lead, min_score, display_order) \
             VALUES (?, ?, ?, ?, ?, ?, ?, (SELECT COALESCE(MAX(display_order) + 1, 0) FROM quiz_results WHERE quiz_id = ?)) \
             RETURNING {RESULT_COLUMNS}"
        ))
        .bind(quiz_id)
        .bind(title)
        .bind(description)
        .bind(image_url)
        .bind(email_content)
        .bind(is_lead)
        .bind(min_score)
        .bind(quiz_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    pub async fn update_result(
        &self,
        result_id: i64,
        patch: QuizResultPatch,
    ) -> Result<Option<QuizResultRow>> {
        if let Some(title) = patch.title {
            sqlx::query("UPDATE quiz_results SET title = ? WHERE id = ?")
                .bind(title)
                .bind(result_id)
                .execute(&self.pool)
                .await?;
        }
        if let Some(description) = patch.description {
            sqlx::query("UPDATE quiz_results SET description = ? WHERE id = ?")
                .bind(description)
                .bind(result_id)
                .execute(&self.pool)
                .await?;
        }
        if let Some(image_url) = patch.image_url {
            sqlx::query("UPDATE quiz_results SET image_url = ? WHERE id = ?")
                .bind(image_url)
                .bind(result_id)
                .execute(&self.pool)
                .await?;
        }
        if let Some(email_content) = patch.email_content {
            sqlx::query("UPDATE quiz_results SET email_content = ? WHERE id = ?")
                .bind(email_content)
                .bind(result_id)
                .execute(&self.pool)
                .await?;
        }
        if let Some(is_lead) = patch.is_lead {
            sqlx::query("UPDATE quiz_results SET is_lead = ? WHERE id = ?")
                .bind(is_lead)
                .bind(result_id)
                .execute(&self.pool)
                .await?;
        }
        if let Some(min_score) = patch.min_score {
            sqlx::query("UPDATE quiz_results SET min_score = ? WHERE id = ?")
                .bind(min_score)
                .bind(result_id)
                .execute(&self.pool)
                .await?;
        }
        if let Some(display_order) = patch.display_order {
            sqlx::query("UPDATE quiz_results SET display_order = ? WHERE id = ?")
                .bind(display_order)
                .bind(result_id)
                .execute(&self.pool)
                .await?;
        }

        let result = sqlx::query_as::<_, QuizResultRow>(&format!(
            "SELECT {RESULT_COLUMNS} FROM quiz_results WHERE id = ?"
        ))
        .bind(result_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result)
    }

    pub async fn delete_result(&self, result_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM quiz_results WHERE id = ?")
            .bind(result_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Create or update the weight for an (answer, result) edge.
    pub async fn upsert_answer_weight(
        &self,
        answer_id: i64,
        result_id: i64,
        weight: f64,
    ) -> Result<AnswerWeightRow> {
        let row = sqlx::query_as::<_, AnswerWeightRow>(
            r#"
            INSERT INTO answer_result_weights (answer_id, result_id, weight)
            VALUES (?, ?, ?)
            ON CONFLICT(answer_id, result_id) DO UPDATE SET weight = excluded.weight
            RETURNING id, answer_id, result_id, weight
            "#,
        )
        .bind(answer_id)
        .bind(result_id)
        .bind(weight)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn delete_answer_weight(&self, answer_id: i64, result_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM answer_result_weights WHERE answer_id = ? AND result_id = ?")
            .bind(answer_id)
            .bind(result_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
