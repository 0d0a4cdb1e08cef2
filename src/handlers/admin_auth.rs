//! Browser-facing auth endpoints: the OAuth callback that mints the admin
//! session cookie, and logout. Failures redirect back to the login page
//! with an error code instead of surfacing JSON errors.

use axum::{
    extract::{Query, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue},
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Router,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use tracing::error;

use crate::names;
use crate::services::admin_auth::CallbackOutcome;
use crate::utils;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/auth/callback", get(oauth_callback))
        .route("/admin/auth/logout", post(logout))
}

#[derive(Deserialize)]
struct CallbackQuery {
    #[serde(default)]
    token: String,
    #[serde(default)]
    stytch_token_type: String,
}

async fn oauth_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> impl IntoResponse {
    let outcome = state
        .auth
        .oauth_callback(&query.token, &query.stytch_token_type)
        .await;

    match outcome {
        CallbackOutcome::Granted { session_token } => {
            let cookie = utils::cookie(
                names::ADMIN_SESSION_COOKIE_NAME,
                &session_token,
                names::ADMIN_COOKIE_MAX_AGE_SECS,
                state.secure_cookies,
            );
            // A token with non-header-safe bytes cannot become a cookie;
            // treat it like any other failed exchange.
            let Ok(value) = HeaderValue::from_str(&cookie) else {
                error!("provider session token is not header-safe");
                return Redirect::to(&names::login_error_url(names::ERROR_AUTH_FAILED))
                    .into_response();
            };
            let mut headers = HeaderMap::new();
            headers.insert(SET_COOKIE, value);
            (headers, Redirect::to(names::ADMIN_HOME_URL)).into_response()
        }
        CallbackOutcome::AuthFailed => {
            Redirect::to(&names::login_error_url(names::ERROR_AUTH_FAILED)).into_response()
        }
        CallbackOutcome::NotAuthorized => {
            Redirect::to(&names::login_error_url(names::ERROR_UNAUTHORIZED)).into_response()
        }
    }
}

async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(cookie) = jar.get(names::ADMIN_SESSION_COOKIE_NAME) {
        state.auth.logout(cookie.value()).await;
    }

    let mut headers = HeaderMap::new();
    let clear = utils::clear_cookie(names::ADMIN_SESSION_COOKIE_NAME, state.secure_cookies);
    if let Ok(value) = HeaderValue::from_str(&clear) {
        headers.insert(SET_COOKIE, value);
    }
    (headers, Redirect::to(names::ADMIN_LOGIN_URL)).into_response()
}
