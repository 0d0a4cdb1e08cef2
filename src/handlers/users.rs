//! Identity capture for quiz takers: the lead form, and the OAuth exchange
//! that upserts a user keyed on the provider's account id. Both hand back a
//! `user_id` the client attaches to its session.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::rejections::{AppError, ResultExt};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/lead", post(capture_lead))
        .route("/auth/exchange", post(oauth_exchange))
}

#[derive(Deserialize)]
struct ExchangeRequest {
    #[serde(default)]
    token: String,
}

async fn oauth_exchange(
    State(state): State<AppState>,
    Json(body): Json<ExchangeRequest>,
) -> Result<impl IntoResponse, AppError> {
    if body.token.trim().is_empty() {
        return Err(AppError::Input("token is required"));
    }

    let identity = state.auth.exchange_identity(&body.token).await.map_err(|e| {
        warn!("oauth identity exchange failed: {e}");
        AppError::Unauthorized
    })?;

    let user = state
        .db
        .upsert_oauth_user(
            &identity.user_id,
            identity.email.as_deref(),
            identity.name.as_deref(),
            identity.profile_picture_url.as_deref(),
        )
        .await
        .reject("failed to upsert user")?;

    Ok(Json(json!({ "user_id": user.id })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeadRequest {
    first_name: String,
    last_name: String,
    email: String,
}

async fn capture_lead(
    State(state): State<AppState>,
    Json(body): Json<LeadRequest>,
) -> Result<impl IntoResponse, AppError> {
    if body.first_name.trim().is_empty()
        || body.last_name.trim().is_empty()
        || body.email.trim().is_empty()
    {
        return Err(AppError::Input("firstName, lastName and email are required"));
    }

    let name = format!("{} {}", body.first_name.trim(), body.last_name.trim());
    let email = body.email.trim();

    if let Some(existing) = state
        .db
        .find_user_by_email(email)
        .await
        .reject("failed to look up user")?
    {
        // Known address: refresh the name, keep everything else.
        state
            .db
            .update_user_name(existing.id, &name)
            .await
            .reject("failed to update user")?;

        return Ok((StatusCode::OK, Json(json!({ "user_id": existing.id }))));
    }

    let user = state
        .db
        .create_lead_user(email, &name)
        .await
        .reject("failed to create user")?;

    info!("captured new lead user {}", user.id);
    Ok((StatusCode::CREATED, Json(json!({ "user_id": user.id }))))
}
