use color_eyre::Result;

use super::models::QuestionRow;
use super::Db;

const QUESTION_COLUMNS: &str = "id, quiz_id, question_text, image_url, display_order";

impl Db {
    /// Presentation order: display_order, ties broken by creation order.
    pub async fn questions_for_quiz(&self, quiz_id: i64) -> Result<Vec<QuestionRow>> {
        let questions = sqlx::query_as::<_, QuestionRow>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE quiz_id = ? \
             ORDER BY display_order, id"
        ))
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(questions)
    }

    pub async fn create_question(
        &self,
        quiz_id: i64,
        question_text: &str,
        image_url: Option<&str>,
    ) -> Result<QuestionRow> {
        let question = sqlx::query_as::<_, QuestionRow>(&format!(
            "INSERT INTO questions (quiz_id, question_text, image_url, display_order) \
             VALUES (?, ?, ?, (SELECT COALESCE(MAX(display_order) + 1, 0) FROM questions WHERE quiz_id = ?)) \
             RETURNING {QUESTION_COLUMNS}"
        ))
        .bind(quiz_id)
        .bind(question_text)
        .bind(image_url)
        .bind(quiz_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(question)
    }

    pub async fn update_question(
        &self,
        question_id: i64,
        question_text: Option<&str>,
        image_url: Option<&str>,
        display_order: Option<i64>,
    ) -> Result<Option<QuestionRow>> {
        if let Some(text) = question_text {
            sqlx::query("UPDATE questions SET question_text = ? WHERE id = ?")
                .bind(text)
                .bind(question_id)
                .execute(&self.pool)
                .await?;
        }
        if let Some(url) = image_url {
            sqlx::query("UPDATE questions SET image_url = ? WHERE id = ?")
                .bind(url)
                .bind(question_id)
                .execute(&self.pool)
                .await?;
        }
        if let Some(order) = display_order {
            sqlx::query("UPDATE questions SET display_order = ? WHERE id = ?")
                .bind(order)
                .bind(question_id)
                .execute(&self.pool)
                .await?;
        }

        let question = sqlx::query_as::<_, QuestionRow>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE id = ?"
        ))
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(question)
    }

    pub async fn delete_question(&self, question_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM questions WHERE id = ?")
            .bind(question_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
