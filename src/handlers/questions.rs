use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::extractors::AdminGuard;
use crate::rejections::{AppError, ResultExt};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/questions", post(create_question))
        .route("/questions/{id}", patch(update_question).delete(delete_question))
}

#[derive(Deserialize)]
struct CreateQuestionRequest {
    quiz_id: i64,
    question_text: String,
    image_url: Option<String>,
}

async fn create_question(
    _guard: AdminGuard,
    State(state): State<AppState>,
    Json(body): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if body.question_text.trim().is_empty() {
        return Err(AppError::Input("question_text is required"));
    }

    let question = state
        .db
        .create_question(body.quiz_id, body.question_text.trim(), body.image_url.as_deref())
        .await
        .reject("failed to create question")?;

    Ok((StatusCode::CREATED, Json(question)))
}

#[derive(Deserialize)]
struct UpdateQuestionRequest {
    question_text: Option<String>,
    image_url: Option<String>,
    display_order: Option<i64>,
}

async fn update_question(
    _guard: AdminGuard,
    State(state): State<AppState>,
    Path(question_id): Path<i64>,
    Json(body): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let question = state
        .db
        .update_question(
            question_id,
            body.question_text.as_deref(),
            body.image_url.as_deref(),
            body.display_order,
        )
        .await
        .reject("failed to update question")?
        .ok_or(AppError::NotFound("question not found"))?;

    Ok(Json(question))
}

async fn delete_question(
    _guard: AdminGuard,
    State(state): State<AppState>,
    Path(question_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state
        .db
        .delete_question(question_id)
        .await
        .reject("failed to delete question")?;

    Ok(Json(json!({ "success": true })))
}
