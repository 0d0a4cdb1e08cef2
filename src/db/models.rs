// Database model structs. One named row type per access pattern; joined
// shapes are assembled from these instead of shape-sniffing a generic row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SessionStatus {
    Viewed,
    Started,
    Completed,
}

/// Display settings stored as a JSON blob on the quiz row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSettings {
    #[serde(default = "default_primary_color")]
    pub primary_color: String,
    #[serde(default = "default_background_color")]
    pub background_color: String,
    #[serde(default = "default_button_style")]
    pub button_style: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub randomize_answers: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_button_text: Option<String>,
}

fn default_primary_color() -> String {
    "#3b82f6".to_string()
}

fn default_background_color() -> String {
    "#ffffff".to_string()
}

fn default_button_style() -> String {
    "rounded".to_string()
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            primary_color: default_primary_color(),
            background_color: default_background_color(),
            button_style: default_button_style(),
            logo_url: None,
            logo_size: None,
            randomize_answers: None,
            start_button_text: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct QuizRow {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub slug: String,
    pub is_published: bool,
    pub settings: Json<QuizSettings>,
}

/// List view of a quiz with child counts.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct QuizSummaryRow {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub slug: String,
    pub is_published: bool,
    pub question_count: i64,
    pub result_count: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct QuestionRow {
    pub id: i64,
    pub quiz_id: i64,
    pub question_text: String,
    pub image_url: Option<String>,
    pub display_order: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AnswerRow {
    pub id: i64,
    pub question_id: i64,
    pub answer_text: String,
    pub display_order: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AnswerWeightRow {
    pub id: i64,
    pub answer_id: i64,
    pub result_id: i64,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct QuizResultRow {
    pub id: i64,
    pub quiz_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub email_content: Option<String>,
    pub is_lead: bool,
    pub min_score: f64,
    pub display_order: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub stytch_user_id: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub profile_picture_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SessionRow {
    pub id: i64,
    pub quiz_id: i64,
    pub user_id: Option<i64>,
    pub anonymous_token: String,
    pub status: SessionStatus,
    pub entered_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub is_lead: bool,
    pub lead_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ResponseRow {
    pub id: i64,
    pub session_id: i64,
    pub question_id: i64,
    pub answer_id: i64,
    pub answered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SessionResultRow {
    pub id: i64,
    pub session_id: i64,
    pub result_id: i64,
    pub score: f64,
    pub is_primary: bool,
}

/// One row per (recorded answer, result mapping) pair for a session —
/// the resolver's entire input from the response side.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ResponseWeightRow {
    pub answer_id: i64,
    pub result_id: i64,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AppSettingsRow {
    pub id: i64,
    pub notify_admin: Option<bool>,
    pub admin_notification_email: Option<String>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ResultCountRow {
    pub result: String,
    pub count: i64,
}

// ---------------------------------------------------------------------------
// Assembled (joined) shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct AnswerDetail {
    #[serde(flatten)]
    pub answer: AnswerRow,
    pub answer_result_weights: Vec<AnswerWeightRow>,
}

#[derive(Debug, Serialize)]
pub struct QuestionDetail {
    #[serde(flatten)]
    pub question: QuestionRow,
    pub answers: Vec<AnswerDetail>,
}

#[derive(Debug, Serialize)]
pub struct QuizDetail {
    #[serde(flatten)]
    pub quiz: QuizRow,
    pub quiz_results: Vec<QuizResultRow>,
    pub questions: Vec<QuestionDetail>,
}

#[derive(Debug, Serialize)]
pub struct SessionResultDetail {
    #[serde(flatten)]
    pub session_result: SessionResultRow,
    pub quiz_result: QuizResultRow,
}

#[derive(Debug, Serialize)]
pub struct SessionDetail {
    #[serde(flatten)]
    pub session: SessionRow,
    pub user: Option<UserRow>,
    pub quiz_responses: Vec<ResponseRow>,
    pub session_results: Vec<SessionResultDetail>,
}
