//! Request extractors and the coarse admin-route middleware.

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;

use crate::names;
use crate::rejections::AppError;
use crate::stytch::ProviderSession;
use crate::AppState;

/// Coarse gate over the admin router: requests without a session cookie are
/// rejected before any handler runs. Validity is not checked here.
pub async fn require_session_cookie(jar: CookieJar, request: Request, next: Next) -> Response {
    if jar.get(names::ADMIN_SESSION_COOKIE_NAME).is_none() {
        return AppError::AuthRequired.into_response();
    }
    next.run(request).await
}

/// Authoritative gate: extracting this validates the cookie's token with the
/// identity provider and requires the admin role. Handlers that take an
/// `AdminGuard` argument cannot run unauthorized.
pub struct AdminGuard(pub ProviderSession);

impl FromRequestParts<AppState> for AdminGuard {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(names::ADMIN_SESSION_COOKIE_NAME)
            .map(|c| c.value().to_string())
            .ok_or(AppError::AuthRequired)?;

        let session = state.auth.authorize(&token).await?;
        Ok(AdminGuard(session))
    }
}
