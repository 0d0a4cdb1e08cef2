//! Quiz CRUD for the admin surface, plus the public read model the
//! embeddable quiz player loads by slug.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::db::models::QuizSettings;
use crate::db::QuizPatch;
use crate::extractors::AdminGuard;
use crate::rejections::{AppError, ResultExt};
use crate::utils::slugify;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/quizzes", get(list_quizzes).post(create_quiz))
        .route(
            "/quizzes/{id}",
            get(get_quiz).patch(update_quiz).delete(delete_quiz),
        )
}

/// Unauthenticated read model for the quiz player.
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/q/{slug}", get(get_published_quiz))
}

async fn get_published_quiz(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = state
        .db
        .get_published_quiz_by_slug(&slug)
        .await
        .reject("failed to load quiz")?
        .ok_or(AppError::NotFound("quiz not found"))?;

    let detail = state
        .db
        .get_quiz_detail(quiz.id)
        .await
        .reject("failed to load quiz detail")?
        .ok_or(AppError::NotFound("quiz not found"))?;

    Ok(Json(detail))
}

async fn list_quizzes(
    _guard: AdminGuard,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let quizzes = state.db.list_quizzes().await.reject("failed to list quizzes")?;
    Ok(Json(quizzes))
}

#[derive(Deserialize)]
struct CreateQuizRequest {
    title: String,
    description: Option<String>,
    image_url: Option<String>,
    slug: Option<String>,
    settings: Option<QuizSettings>,
}

async fn create_quiz(
    _guard: AdminGuard,
    State(state): State<AppState>,
    Json(body): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if body.title.trim().is_empty() {
        return Err(AppError::Input("title is required"));
    }

    let slug = match body.slug {
        Some(slug) if !slug.trim().is_empty() => slug,
        _ => slugify(&body.title),
    };

    let quiz = state
        .db
        .create_quiz(
            body.title.trim(),
            body.description.as_deref(),
            body.image_url.as_deref(),
            &slug,
            body.settings.unwrap_or_default(),
        )
        .await
        .reject("failed to create quiz")?;

    Ok((StatusCode::CREATED, Json(quiz)))
}

async fn get_quiz(
    _guard: AdminGuard,
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let detail = state
        .db
        .get_quiz_detail(quiz_id)
        .await
        .reject("failed to load quiz")?
        .ok_or(AppError::NotFound("quiz not found"))?;

    Ok(Json(detail))
}

#[derive(Deserialize)]
struct UpdateQuizRequest {
    title: Option<String>,
    description: Option<String>,
    image_url: Option<String>,
    slug: Option<String>,
    is_published: Option<bool>,
    settings: Option<QuizSettings>,
}

async fn update_quiz(
    _guard: AdminGuard,
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
    Json(body): Json<UpdateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let patch = QuizPatch {
        title: body.title,
        description: body.description,
        image_url: body.image_url,
        slug: body.slug,
        is_published: body.is_published,
        settings: body.settings,
    };

    let quiz = state
        .db
        .update_quiz(quiz_id, patch)
        .await
        .reject("failed to update quiz")?
        .ok_or(AppError::NotFound("quiz not found"))?;

    Ok(Json(quiz))
}

async fn delete_quiz(
    _guard: AdminGuard,
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state
        .db
        .get_quiz(quiz_id)
        .await
        .reject("failed to load quiz")?
        .ok_or(AppError::NotFound("quiz not found"))?;

    state
        .db
        .delete_quiz(quiz_id)
        .await
        .reject("failed to delete quiz")?;

    Ok(Json(json!({ "success": true })))
}
