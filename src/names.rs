pub const ADMIN_SESSION_COOKIE_NAME: &str = "stytch_session_token";

pub const DEFAULT_ADMIN_ROLE: &str = "quiz_admin";

/// Session duration requested from the identity provider on every
/// authenticate call (the provider extends the session as a side effect).
pub const ADMIN_SESSION_MINUTES: u32 = 60 * 24;
/// Quiz-taker OAuth sessions last a week; they only carry identity, not
/// admin access.
pub const TAKER_SESSION_MINUTES: u32 = 60 * 24 * 7;
pub const ADMIN_COOKIE_MAX_AGE_SECS: i64 = 60 * 60 * 24;

/// Token type the OAuth callback accepts; anything else is an auth failure.
pub const OAUTH_TOKEN_TYPE: &str = "oauth";

/// Custom claim the provider embeds roles under in the session JWT.
/// The REST response's role field is empty; roles must be read from here.
pub const STYTCH_SESSION_CLAIM: &str = "https://stytch.com/session";

pub const ADMIN_HOME_URL: &str = "/admin";
pub const ADMIN_LOGIN_URL: &str = "/admin/login";

pub const ERROR_AUTH_FAILED: &str = "auth_failed";
pub const ERROR_UNAUTHORIZED: &str = "unauthorized";

pub fn login_error_url(code: &str) -> String {
    format!("{ADMIN_LOGIN_URL}?error={code}")
}

// Email defaults, overridable per deployment.
pub const DEFAULT_FROM_EMAIL: &str = "noreply@resend.dev";
pub const DEFAULT_FROM_NAME: &str = "Quiz Results";

pub const RESEND_API_URL: &str = "https://api.resend.com/emails";

pub const STYTCH_TEST_API_URL: &str = "https://test.stytch.com";
pub const STYTCH_LIVE_API_URL: &str = "https://api.stytch.com";
