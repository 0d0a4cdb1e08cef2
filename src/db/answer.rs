use color_eyre::Result;

use super::models::AnswerRow;
use super::Db;

const ANSWER_COLUMNS: &str = "id, question_id, answer_text, display_order";

impl Db {
    pub async fn create_answer(&self, question_id: i64, answer_text: &str) -> Result<AnswerRow> {
        let answer = sqlx::query_as::<_, AnswerRow>(&format!(
            "INSERT INTO answers (question_id, answer_text, display_order) \
             VALUES (?, ?, (SELECT COALESCE(MAX(display_order) + 1, 0) FROM answers WHERE question_id = ?)) \
             RETURNING {ANSWER_COLUMNS}"
        ))
        .bind(question_id)
        .bind(answer_text)
        .bind(question_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(answer)
    }

    pub async fn update_answer(
        &self,
        answer_id: i64,
        answer_text: Option<&str>,
        display_order: Option<i64>,
    ) -> Result<Option<AnswerRow>> {
        if let Some(text) = answer_text {
            sqlx::query("UPDATE answers SET answer_text = ? WHERE id = ?")
                .bind(text)
                .bind(answer_id)
                .execute(&self.pool)
                .await?;
        }
        if let Some(order) = display_order {
            sqlx::query("UPDATE answers SET display_order = ? WHERE id = ?")
                .bind(order)
                .bind(answer_id)
                .execute(&self.pool)
                .await?;
        }

        let answer = sqlx::query_as::<_, AnswerRow>(&format!(
            "SELECT {ANSWER_COLUMNS} FROM answers WHERE id = ?"
        ))
        .bind(answer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(answer)
    }

    pub async fn delete_answer(&self, answer_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM answers WHERE id = ?")
            .bind(answer_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Reassign display_order to match the given id sequence.
    /// Sequential single-row updates; no transaction, last write wins.
    pub async fn reorder_answers(&self, answer_ids: &[i64]) -> Result<()> {
        for (order, answer_id) in answer_ids.iter().enumerate() {
            sqlx::query("UPDATE answers SET display_order = ? WHERE id = ?")
                .bind(order as i64)
                .bind(answer_id)
                .execute(&self.pool)
                .await?;
        }

        Ok(())
    }
}
