//! Answer-to-result weight mappings, the resolver's raw material.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::extractors::AdminGuard;
use crate::rejections::{AppError, ResultExt};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/answer-weights", post(upsert_weight).delete(delete_weight))
}

#[derive(Deserialize)]
struct UpsertWeightRequest {
    answer_id: i64,
    result_id: i64,
    weight: Option<f64>,
}

async fn upsert_weight(
    _guard: AdminGuard,
    State(state): State<AppState>,
    Json(body): Json<UpsertWeightRequest>,
) -> Result<impl IntoResponse, AppError> {
    let row = state
        .db
        .upsert_answer_weight(body.answer_id, body.result_id, body.weight.unwrap_or(1.0))
        .await
        .reject("failed to upsert answer weight")?;

    Ok((StatusCode::CREATED, Json(row)))
}

#[derive(Deserialize)]
struct DeleteWeightQuery {
    answer_id: Option<i64>,
    result_id: Option<i64>,
}

async fn delete_weight(
    _guard: AdminGuard,
    State(state): State<AppState>,
    Query(query): Query<DeleteWeightQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(answer_id), Some(result_id)) = (query.answer_id, query.result_id) else {
        return Err(AppError::Input("answer_id and result_id are required"));
    };

    state
        .db
        .delete_answer_weight(answer_id, result_id)
        .await
        .reject("failed to delete answer weight")?;

    Ok(Json(json!({ "success": true })))
}
