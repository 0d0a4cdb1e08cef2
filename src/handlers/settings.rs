use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde::Deserialize;

use crate::extractors::AdminGuard;
use crate::rejections::{AppError, ResultExt};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/app-settings", get(get_settings).patch(update_settings))
}

async fn get_settings(
    _guard: AdminGuard,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let settings = state
        .db
        .get_app_settings()
        .await
        .reject("failed to load app settings")?;

    Ok(Json(settings))
}

#[derive(Deserialize)]
struct UpdateSettingsRequest {
    notify_admin: Option<bool>,
    /// Absent leaves the address untouched; an empty string clears it.
    admin_notification_email: Option<String>,
}

async fn update_settings(
    _guard: AdminGuard,
    State(state): State<AppState>,
    Json(body): Json<UpdateSettingsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email_update = body
        .admin_notification_email
        .as_deref()
        .map(|e| if e.is_empty() { None } else { Some(e) });

    let settings = state
        .db
        .update_app_settings(body.notify_admin, email_update)
        .await
        .reject("failed to update app settings")?;

    Ok(Json(settings))
}
