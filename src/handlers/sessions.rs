//! Quiz-taking session lifecycle: create, record answers, attach identity,
//! complete. Completion runs the resolver and delivers emails in-band but
//! never lets email failure block the response.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::db::models::{QuizResultRow, SessionRow, SessionStatus, UserRow};
use crate::db::SessionPatch;
use crate::email::{EmailSender, ResultEmail};
use crate::rejections::{AppError, ResultExt};
use crate::services::scoring;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session).patch(update_session))
        .route("/sessions/{id}/respond", post(record_response))
        .route("/sessions/{id}/complete", post(complete_session))
}

#[derive(Deserialize)]
struct CreateSessionRequest {
    quiz_id: i64,
}

async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = state
        .db
        .create_session(body.quiz_id)
        .await
        .reject("failed to create session")?;

    Ok((StatusCode::CREATED, Json(session)))
}

async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let detail = state
        .db
        .get_session_detail(session_id)
        .await
        .reject("failed to load session")?
        .ok_or(AppError::NotFound("session not found"))?;

    Ok(Json(detail))
}

#[derive(Deserialize)]
struct UpdateSessionRequest {
    status: Option<SessionStatus>,
    user_id: Option<i64>,
    is_lead: Option<bool>,
    lead_score: Option<f64>,
}

async fn update_session(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    Json(body): Json<UpdateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let patch = SessionPatch {
        status: body.status,
        user_id: body.user_id,
        is_lead: body.is_lead,
        lead_score: body.lead_score,
    };

    let session = state
        .db
        .update_session(session_id, patch)
        .await
        .reject("failed to update session")?
        .ok_or(AppError::NotFound("session not found"))?;

    Ok(Json(session))
}

#[derive(Deserialize)]
struct RecordResponseRequest {
    question_id: i64,
    answer_id: i64,
}

async fn record_response(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    Json(body): Json<RecordResponseRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .db
        .get_session(session_id)
        .await
        .reject("failed to load session")?
        .ok_or(AppError::NotFound("session not found"))?;

    let response = state
        .db
        .upsert_response(session_id, body.question_id, body.answer_id)
        .await
        .reject("failed to record response")?;

    Ok((StatusCode::CREATED, Json(response)))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionResponse {
    session: SessionRow,
    total_score: f64,
    primary_result: Option<QuizResultRow>,
    is_lead: bool,
    email_sent: bool,
    email_error: Option<String>,
}

async fn complete_session(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let session = state
        .db
        .get_session(session_id)
        .await
        .reject("failed to load session")?
        .ok_or(AppError::NotFound("session not found"))?;

    // A repeat call recomputes idempotently but must not email again.
    let already_completed = session.status == SessionStatus::Completed;

    let weights = state
        .db
        .response_weights(session_id)
        .await
        .reject("failed to load response weights")?;
    let results = state
        .db
        .results_for_quiz(session.quiz_id)
        .await
        .reject("failed to load quiz results")?;

    let resolution = scoring::resolve(state.scoring_policy, &weights, &results);

    state
        .db
        .replace_session_result(
            session_id,
            resolution.primary.as_ref().map(|r| (r.id, resolution.score)),
        )
        .await
        .reject("failed to store session result")?;

    let session = state
        .db
        .mark_completed(session_id, resolution.score, resolution.is_lead)
        .await
        .reject("failed to mark session completed")?
        .ok_or(AppError::NotFound("session not found"))?;

    info!(
        "session {session_id} completed: score {}, primary {:?}",
        resolution.score,
        resolution.primary.as_ref().map(|r| r.id)
    );

    let user = match session.user_id {
        Some(user_id) => state.db.get_user(user_id).await.reject("failed to load user")?,
        None => None,
    };
    let quiz_title = state
        .db
        .get_quiz(session.quiz_id)
        .await
        .reject("failed to load quiz")?
        .map(|q| q.title)
        .unwrap_or_default();

    let (email_sent, email_error) = if already_completed {
        (false, None)
    } else {
        deliver_result_email(
            &state.email,
            user.as_ref(),
            &quiz_title,
            resolution.primary.as_ref(),
        )
        .await
    };

    if !already_completed && resolution.is_lead {
        notify_admin_of_lead(&state, &quiz_title, user.as_ref()).await;
    }

    Ok(Json(CompletionResponse {
        session,
        total_score: resolution.score,
        primary_result: resolution.primary,
        is_lead: resolution.is_lead,
        email_sent,
        email_error,
    }))
}

/// Send the results email when every precondition holds: a primary result
/// with email content, a user with an address, delivery configured. A send
/// failure is reported in-band, never as a request error.
async fn deliver_result_email<E: EmailSender>(
    sender: &E,
    user: Option<&UserRow>,
    quiz_title: &str,
    primary: Option<&QuizResultRow>,
) -> (bool, Option<String>) {
    let Some(result) = primary else {
        return (false, None);
    };
    let Some(content) = result.email_content.as_deref().filter(|c| !c.is_empty()) else {
        return (false, None);
    };
    let Some(to) = user.and_then(|u| u.email.clone()) else {
        return (false, None);
    };
    if !sender.is_enabled() {
        return (false, None);
    }

    let email = ResultEmail {
        to,
        user_name: user.and_then(|u| u.name.clone()),
        quiz_title: quiz_title.to_string(),
        result_title: result.title.clone(),
        email_content: content.to_string(),
    };

    match sender.send_result_email(&email).await {
        Ok(()) => (true, None),
        Err(e) => {
            warn!("result email delivery failed: {e}");
            (false, Some(e.to_string()))
        }
    }
}

/// Best-effort admin heads-up on a captured lead. The app_settings row
/// overrides the deployment defaults.
async fn notify_admin_of_lead(state: &AppState, quiz_title: &str, user: Option<&UserRow>) {
    if !state.email.is_enabled() {
        return;
    }

    let settings = match state.db.get_app_settings().await {
        Ok(settings) => settings,
        Err(e) => {
            warn!("failed to load app settings for lead notification: {e}");
            return;
        }
    };

    let notify = settings.notify_admin.unwrap_or(state.notify_admin_default);
    let to = settings
        .admin_notification_email
        .or_else(|| state.admin_notification_email.clone());

    let (true, Some(to)) = (notify, to) else {
        return;
    };

    let lead_email = user
        .and_then(|u| u.email.as_deref())
        .unwrap_or("(no email on session)");

    if let Err(e) = state
        .email
        .send_lead_notification(&to, quiz_title, lead_email)
        .await
    {
        warn!("lead notification delivery failed: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::MockEmailSender;

    fn user(email: Option<&str>) -> UserRow {
        UserRow {
            id: 1,
            stytch_user_id: None,
            email: email.map(str::to_string),
            name: Some("Ada".to_string()),
            profile_picture_url: None,
        }
    }

    fn result_with_content(content: Option<&str>) -> QuizResultRow {
        QuizResultRow {
            id: 7,
            quiz_id: 1,
            title: "The Visionary".to_string(),
            description: None,
            image_url: None,
            email_content: content.map(str::to_string),
            is_lead: true,
            min_score: 0.0,
            display_order: 0,
        }
    }

    #[tokio::test]
    async fn email_sent_when_all_preconditions_hold() {
        let mut sender = MockEmailSender::new();
        sender.expect_is_enabled().return_const(true);
        sender
            .expect_send_result_email()
            .times(1)
            .returning(|_| Box::pin(async { Ok(()) }));

        let primary = result_with_content(Some("<p>hi</p>"));
        let user = user(Some("taker@example.com"));
        let (sent, error) =
            deliver_result_email(&sender, Some(&user), "Quiz", Some(&primary)).await;
        assert!(sent);
        assert!(error.is_none());
    }

    #[tokio::test]
    async fn no_email_without_content() {
        let mut sender = MockEmailSender::new();
        sender.expect_is_enabled().return_const(true);

        let primary = result_with_content(None);
        let user = user(Some("taker@example.com"));
        let (sent, error) =
            deliver_result_email(&sender, Some(&user), "Quiz", Some(&primary)).await;
        assert!(!sent);
        assert!(error.is_none());

        let primary = result_with_content(Some(""));
        let (sent, _) = deliver_result_email(&sender, Some(&user), "Quiz", Some(&primary)).await;
        assert!(!sent);
    }

    #[tokio::test]
    async fn no_email_without_user_address_or_api_key() {
        let mut sender = MockEmailSender::new();
        sender.expect_is_enabled().return_const(false);

        let primary = result_with_content(Some("<p>hi</p>"));
        let (sent, _) =
            deliver_result_email(&sender, Some(&user(None)), "Quiz", Some(&primary)).await;
        assert!(!sent);

        let user = user(Some("taker@example.com"));
        let (sent, _) = deliver_result_email(&sender, Some(&user), "Quiz", Some(&primary)).await;
        assert!(!sent);
    }

    #[tokio::test]
    async fn send_failure_is_reported_in_band() {
        let mut sender = MockEmailSender::new();
        sender.expect_is_enabled().return_const(true);
        sender.expect_send_result_email().returning(|_| {
            Box::pin(async { Err(color_eyre::eyre::eyre!("Resend API returned 500")) })
        });

        let primary = result_with_content(Some("<p>hi</p>"));
        let user = user(Some("taker@example.com"));
        let (sent, error) =
            deliver_result_email(&sender, Some(&user), "Quiz", Some(&primary)).await;
        assert!(!sent);
        assert!(error.unwrap().contains("Resend API returned 500"));
    }
}
