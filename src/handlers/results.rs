use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::db::QuizResultPatch;
use crate::extractors::AdminGuard;
use crate::rejections::{AppError, ResultExt};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/quiz-results", post(create_result))
        .route("/quiz-results/{id}", patch(update_result).delete(delete_result))
}

#[derive(Deserialize)]
struct CreateResultRequest {
    quiz_id: i64,
    title: String,
    description: Option<String>,
    image_url: Option<String>,
    email_content: Option<String>,
    #[serde(default)]
    is_lead: bool,
    #[serde(default)]
    min_score: f64,
}

async fn create_result(
    _guard: AdminGuard,
    State(state): State<AppState>,
    Json(body): Json<CreateResultRequest>,
) -> Result<impl IntoResponse, AppError> {
    if body.title.trim().is_empty() {
        return Err(AppError::Input("title is required"));
    }

    let result = state
        .db
        .create_result(
            body.quiz_id,
            body.title.trim(),
            body.description.as_deref(),
            body.image_url.as_deref(),
            body.email_content.as_deref(),
            body.is_lead,
            body.min_score,
        )
        .await
        .reject("failed to create quiz result")?;

    Ok((StatusCode::CREATED, Json(result)))
}

#[derive(Deserialize)]
struct UpdateResultRequest {
    title: Option<String>,
    description: Option<String>,
    image_url: Option<String>,
    email_content: Option<String>,
    is_lead: Option<bool>,
    min_score: Option<f64>,
    display_order: Option<i64>,
}

async fn update_result(
    _guard: AdminGuard,
    State(state): State<AppState>,
    Path(result_id): Path<i64>,
    Json(body): Json<UpdateResultRequest>,
) -> Result<impl IntoResponse, AppError> {
    let patch = QuizResultPatch {
        title: body.title,
        description: body.description,
        image_url: body.image_url,
        email_content: body.email_content,
        is_lead: body.is_lead,
        min_score: body.min_score,
        display_order: body.display_order,
    };

    let result = state
        .db
        .update_result(result_id, patch)
        .await
        .reject("failed to update quiz result")?
        .ok_or(AppError::NotFound("quiz result not found"))?;

    Ok(Json(result))
}

async fn delete_result(
    _guard: AdminGuard,
    State(state): State<AppState>,
    Path(result_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state
        .db
        .delete_result(result_id)
        .await
        .reject("failed to delete quiz result")?;

    Ok(Json(json!({ "success": true })))
}
