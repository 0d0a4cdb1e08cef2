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
        .route("/answers", post(create_answer))
        .route("/answers/reorder", post(reorder_answers))
        .route("/answers/{id}", patch(update_answer).delete(delete_answer))
}

#[derive(Deserialize)]
struct CreateAnswerRequest {
    question_id: i64,
    answer_text: String,
}

async fn create_answer(
    _guard: AdminGuard,
    State(state): State<AppState>,
    Json(body): Json<CreateAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    if body.answer_text.trim().is_empty() {
        return Err(AppError::Input("answer_text is required"));
    }

    let answer = state
        .db
        .create_answer(body.question_id, body.answer_text.trim())
        .await
        .reject("failed to create answer")?;

    Ok((StatusCode::CREATED, Json(answer)))
}

#[derive(Deserialize)]
struct UpdateAnswerRequest {
    answer_text: Option<String>,
    display_order: Option<i64>,
}

async fn update_answer(
    _guard: AdminGuard,
    State(state): State<AppState>,
    Path(answer_id): Path<i64>,
    Json(body): Json<UpdateAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let answer = state
        .db
        .update_answer(answer_id, body.answer_text.as_deref(), body.display_order)
        .await
        .reject("failed to update answer")?
        .ok_or(AppError::NotFound("answer not found"))?;

    Ok(Json(answer))
}

async fn delete_answer(
    _guard: AdminGuard,
    State(state): State<AppState>,
    Path(answer_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state
        .db
        .delete_answer(answer_id)
        .await
        .reject("failed to delete answer")?;

    Ok(Json(json!({ "success": true })))
}

#[derive(Deserialize)]
struct ReorderRequest {
    answer_ids: Vec<i64>,
}

/// Rewrite display_order to match the given id sequence.
async fn reorder_answers(
    _guard: AdminGuard,
    State(state): State<AppState>,
    Json(body): Json<ReorderRequest>,
) -> Result<impl IntoResponse, AppError> {
    if body.answer_ids.is_empty() {
        return Err(AppError::Input("answer_ids is required"));
    }

    state
        .db
        .reorder_answers(&body.answer_ids)
        .await
        .reject("failed to reorder answers")?;

    Ok(Json(json!({ "success": true })))
}
