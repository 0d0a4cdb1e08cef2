pub mod db;
pub mod email;
pub mod extractors;
pub mod handlers;
pub mod names;
pub mod rejections;
pub mod services;
pub mod stytch;
pub mod utils;

use axum::{middleware, Router};

use db::Db;
use email::ResendEmailSender;
use services::admin_auth::AdminAuthService;
use services::scoring::ScoringPolicy;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub auth: AdminAuthService,
    pub email: ResendEmailSender,
    pub scoring_policy: ScoringPolicy,
    pub secure_cookies: bool,
    /// Deployment-level defaults; the app_settings row overrides them.
    pub notify_admin_default: bool,
    pub admin_notification_email: Option<String>,
}

pub fn router(state: AppState) -> Router {
    // Admin routes sit behind the coarse cookie check; each handler still
    // runs the authoritative provider check via the AdminGuard extractor.
    let admin = Router::new()
        .merge(handlers::quizzes::routes())
        .merge(handlers::questions::routes())
        .merge(handlers::answers::routes())
        .merge(handlers::results::routes())
        .merge(handlers::weights::routes())
        .merge(handlers::analytics::routes())
        .merge(handlers::settings::routes())
        .layer(middleware::from_fn(extractors::require_session_cookie));

    Router::new()
        .merge(handlers::sessions::routes())
        .merge(handlers::users::routes())
        .merge(handlers::quizzes::public_routes())
        .merge(handlers::admin_auth::routes())
        .merge(admin)
        .with_state(state)
}
