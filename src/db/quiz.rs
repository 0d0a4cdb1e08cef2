use std::collections::HashMap;

use color_eyre::Result;
use sqlx::types::Json;

use super::models::{
    AnswerDetail, AnswerRow, AnswerWeightRow, QuestionDetail, QuizDetail, QuizRow, QuizSettings,
    QuizSummaryRow,
};
use super::Db;

const QUIZ_COLUMNS: &str = "id, title, description, image_url, slug, is_published, settings";

/// Partial update for a quiz; absent fields are left untouched.
#[derive(Debug, Default)]
pub struct QuizPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub slug: Option<String>,
    pub is_published: Option<bool>,
    pub settings: Option<QuizSettings>,
}

impl Db {
    pub async fn list_quizzes(&self) -> Result<Vec<QuizSummaryRow>> {
        let quizzes = sqlx::query_as::<_, QuizSummaryRow>(
            r#"
            SELECT q.id, q.title, q.description, q.slug, q.is_published,
                   (SELECT COUNT(*) FROM questions WHERE quiz_id = q.id) AS question_count,
                   (SELECT COUNT(*) FROM quiz_results WHERE quiz_id = q.id) AS result_count
            FROM quizzes q
            ORDER BY q.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(quizzes)
    }

    pub async fn create_quiz(
        &self,
        title: &str,
        description: Option<&str>,
        image_url: Option<&str>,
        slug: &str,
        settings: QuizSettings,
    ) -> Result<QuizRow> {
        let quiz = sqlx::query_as::<_, QuizRow>(&format!(
            "INSERT INTO quizzes (title, description, image_url, slug, settings) \
             VALUES (?, ?, ?, ?, ?) RETURNING {QUIZ_COLUMNS}"
        ))
        .bind(title)
        .bind(description)
        .bind(image_url)
        .bind(slug)
        .bind(Json(settings))
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("quiz created: id={}, slug={}", quiz.id, quiz.slug);
        Ok(quiz)
    }

    pub async fn get_quiz(&self, quiz_id: i64) -> Result<Option<QuizRow>> {
        let quiz = sqlx::query_as::<_, QuizRow>(&format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = ?"
        ))
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quiz)
    }

    /// Look up a published quiz by its public slug.
    pub async fn get_published_quiz_by_slug(&self, slug: &str) -> Result<Option<QuizRow>> {
        let quiz = sqlx::query_as::<_, QuizRow>(&format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE slug = ? AND is_published = TRUE"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quiz)
    }

    pub async fn update_quiz(&self, quiz_id: i64, patch: QuizPatch) -> Result<Option<QuizRow>> {
        if let Some(title) = patch.title {
            sqlx::query("UPDATE quizzes SET title = ? WHERE id = ?")
                .bind(title)
                .bind(quiz_id)
                .execute(&self.pool)
                .await?;
        }
        if let Some(description) = patch.description {
            sqlx::query("UPDATE quizzes SET description = ? WHERE id = ?")
                .bind(description)
                .bind(quiz_id)
                .execute(&self.pool)
                .await?;
        }
        if let Some(image_url) = patch.image_url {
            sqlx::query("UPDATE quizzes SET image_url = ? WHERE id = ?")
                .bind(image_url)
                .bind(quiz_id)
                .execute(&self.pool)
                .await?;
        }
        if let Some(slug) = patch.slug {
            sqlx::query("UPDATE quizzes SET slug = ? WHERE id = ?")
                .bind(slug)
                .bind(quiz_id)
                .execute(&self.pool)
                .await?;
        }
        if let Some(is_published) = patch.is_published {
            sqlx::query("UPDATE quizzes SET is_published = ? WHERE id = ?")
                .bind(is_published)
                .bind(quiz_id)
                .execute(&self.pool)
                .await?;
        }
        if let Some(settings) = patch.settings {
            sqlx::query("UPDATE quizzes SET settings = ? WHERE id = ?")
                .bind(Json(settings))
                .bind(quiz_id)
                .execute(&self.pool)
                .await?;
        }

        self.get_quiz(quiz_id).await
    }

    pub async fn delete_quiz(&self, quiz_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM quizzes WHERE id = ?")
            .bind(quiz_id)
            .execute(&self.pool)
            .await?;

        tracing::info!("deleted quiz {quiz_id}");
        Ok(())
    }

    /// Fetch a quiz with its results, questions, answers, and weight
    /// mappings, assembled into a nested shape for the authoring UI and
    /// the public taking flow.
    pub async fn get_quiz_detail(&self, quiz_id: i64) -> Result<Option<QuizDetail>> {
        let Some(quiz) = self.get_quiz(quiz_id).await? else {
            return Ok(None);
        };

        let quiz_results = self.results_for_quiz(quiz_id).await?;
        let questions = self.questions_for_quiz(quiz_id).await?;

        let answers = sqlx::query_as::<_, AnswerRow>(
            r#"
            SELECT a.id, a.question_id, a.answer_text, a.display_order
            FROM answers a
            JOIN questions q ON q.id = a.question_id
            WHERE q.quiz_id = ?
            ORDER BY a.display_order, a.id
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        let weights = sqlx::query_as::<_, AnswerWeightRow>(
            r#"
            SELECT w.id, w.answer_id, w.result_id, w.weight
            FROM answer_result_weights w
            JOIN answers a ON a.id = w.answer_id
            JOIN questions q ON q.id = a.question_id
            WHERE q.quiz_id = ?
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        let mut weights_by_answer: HashMap<i64, Vec<AnswerWeightRow>> = HashMap::new();
        for weight in weights {
            weights_by_answer.entry(weight.answer_id).or_default().push(weight);
        }

        let mut answers_by_question: HashMap<i64, Vec<AnswerDetail>> = HashMap::new();
        for answer in answers {
            let answer_result_weights =
                weights_by_answer.remove(&answer.id).unwrap_or_default();
            answers_by_question
                .entry(answer.question_id)
                .or_default()
                .push(AnswerDetail {
                    answer,
                    answer_result_weights,
                });
        }

        let questions = questions
            .into_iter()
            .map(|question| {
                let answers = answers_by_question.remove(&question.id).unwrap_or_default();
                QuestionDetail { question, answers }
            })
            .collect();

        Ok(Some(QuizDetail {
            quiz,
            quiz_results,
            questions,
        }))
    }
}
