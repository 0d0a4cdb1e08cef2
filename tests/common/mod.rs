use std::sync::atomic::{AtomicU32, Ordering};

use leadquiz::db::Db;
use leadquiz::email::ResendEmailSender;
use leadquiz::services::admin_auth::AdminAuthService;
use leadquiz::services::scoring::ScoringPolicy;
use leadquiz::stytch::StytchClient;
use leadquiz::AppState;

static DB_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Fresh migrated database in a per-test temp file.
pub async fn create_test_db() -> Db {
    let n = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    let path = std::env::temp_dir().join(format!(
        "leadquiz-test-{}-{n}.db",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    Db::new(&format!("sqlite://{}", path.display()))
        .await
        .expect("test database")
}

/// App state wired with a test-project identity client and email delivery
/// disabled (no API key).
pub fn test_state(db: Db) -> AppState {
    AppState {
        db,
        auth: AdminAuthService::new(
            StytchClient::new("project-test-00000000".to_string(), "secret".to_string()),
            "quiz_admin".to_string(),
        ),
        email: ResendEmailSender::new(None, "noreply@resend.dev".to_string(), "Quiz".to_string()),
        scoring_policy: ScoringPolicy::Weighted,
        secure_cookies: false,
        notify_admin_default: false,
        admin_notification_email: None,
    }
}
