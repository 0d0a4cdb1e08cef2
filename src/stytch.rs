use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::names;

// ---------------------------------------------------------------------------
// Provider contract
// ---------------------------------------------------------------------------

/// Identity-provider failures, split so callers can log "provider down"
/// distinctly from "provider said no". Both deny access.
#[derive(Debug)]
pub enum ProviderError {
    /// The provider could not be reached at all.
    Unreachable(String),
    /// The provider answered and rejected the request.
    Rejected(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::Unreachable(m) => write!(f, "identity provider unreachable: {m}"),
            ProviderError::Rejected(m) => write!(f, "identity provider rejected request: {m}"),
        }
    }
}

impl std::error::Error for ProviderError {}

/// A validated provider session. `roles` mirrors the REST response field,
/// which the provider leaves empty on plain session validation; the
/// authoritative role list lives in the JWT claims (`roles_from_jwt`).
/// `user` is populated on OAuth exchange only.
#[derive(Debug, Clone)]
pub struct ProviderSession {
    pub session_token: String,
    pub session_jwt: String,
    pub roles: Vec<String>,
    pub user: Option<ProviderUser>,
}

/// The provider's account record, as returned by an OAuth exchange.
#[derive(Debug, Clone)]
pub struct ProviderUser {
    pub user_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub profile_picture_url: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
pub trait IdentityProvider: Send + Sync {
    fn authenticate_oauth(
        &self,
        token: &str,
        session_minutes: u32,
    ) -> impl std::future::Future<Output = Result<ProviderSession, ProviderError>> + Send;

    fn authenticate_session(
        &self,
        session_token: &str,
        session_minutes: u32,
    ) -> impl std::future::Future<Output = Result<ProviderSession, ProviderError>> + Send;

    fn revoke_session(
        &self,
        session_token: &str,
    ) -> impl std::future::Future<Output = Result<(), ProviderError>> + Send;
}

// ---------------------------------------------------------------------------
// Stytch HTTP client
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct StytchClient {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    secret: String,
}

#[derive(Serialize)]
struct OauthAuthenticateRequest<'a> {
    token: &'a str,
    session_duration_minutes: u32,
}

#[derive(Serialize)]
struct SessionAuthenticateRequest<'a> {
    session_token: &'a str,
    session_duration_minutes: u32,
}

#[derive(Serialize)]
struct RevokeRequest<'a> {
    session_token: &'a str,
}

#[derive(Deserialize)]
struct AuthenticateResponse {
    #[serde(default)]
    session_token: String,
    #[serde(default)]
    session_jwt: String,
    #[serde(default)]
    user_session: Option<UserSessionPayload>,
    #[serde(default)]
    user: Option<UserPayload>,
}

#[derive(Deserialize)]
struct UserSessionPayload {
    #[serde(default)]
    roles: Vec<String>,
}

#[derive(Deserialize)]
struct UserPayload {
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    emails: Vec<EmailPayload>,
    #[serde(default)]
    name: Option<NamePayload>,
    #[serde(default)]
    providers: Vec<OauthProviderPayload>,
}

#[derive(Deserialize)]
struct EmailPayload {
    #[serde(default)]
    email: String,
}

#[derive(Deserialize)]
struct NamePayload {
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
}

#[derive(Deserialize)]
struct OauthProviderPayload {
    #[serde(default)]
    profile_picture_url: Option<String>,
}

impl From<UserPayload> for ProviderUser {
    fn from(payload: UserPayload) -> Self {
        let name = payload.name.and_then(|n| {
            if n.first_name.is_empty() {
                None
            } else {
                Some(format!("{} {}", n.first_name, n.last_name).trim().to_string())
            }
        });
        let profile_picture_url = payload
            .providers
            .into_iter()
            .find_map(|p| p.profile_picture_url);

        ProviderUser {
            user_id: payload.user_id,
            email: payload
                .emails
                .into_iter()
                .next()
                .filter(|e| !e.email.is_empty())
                .map(|e| e.email),
            name,
            profile_picture_url,
        }
    }
}

impl StytchClient {
    pub fn new(project_id: String, secret: String) -> Self {
        // Test projects live on a separate host, keyed off the project id.
        let base_url = if project_id.contains("-test-") {
            names::STYTCH_TEST_API_URL
        } else {
            names::STYTCH_LIVE_API_URL
        };
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
            project_id,
            secret,
        }
    }

    async fn post_authenticate<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<AuthenticateResponse, ProviderError> {
        let resp = self
            .client
            .post(format!("{}{path}", self.base_url))
            .basic_auth(&self.project_id, Some(&self.secret))
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Unreachable(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Rejected(format!("{status}: {text}")));
        }

        resp.json::<AuthenticateResponse>()
            .await
            .map_err(|e| ProviderError::Rejected(e.to_string()))
    }
}

impl IdentityProvider for StytchClient {
    async fn authenticate_oauth(
        &self,
        token: &str,
        session_minutes: u32,
    ) -> Result<ProviderSession, ProviderError> {
        let resp = self
            .post_authenticate(
                "/v1/oauth/authenticate",
                &OauthAuthenticateRequest {
                    token,
                    session_duration_minutes: session_minutes,
                },
            )
            .await?;

        Ok(ProviderSession {
            session_token: resp.session_token,
            session_jwt: resp.session_jwt,
            roles: resp.user_session.map(|s| s.roles).unwrap_or_default(),
            user: resp.user.map(ProviderUser::from),
        })
    }

    async fn authenticate_session(
        &self,
        session_token: &str,
        session_minutes: u32,
    ) -> Result<ProviderSession, ProviderError> {
        let resp = self
            .post_authenticate(
                "/v1/sessions/authenticate",
                &SessionAuthenticateRequest {
                    session_token,
                    session_duration_minutes: session_minutes,
                },
            )
            .await?;

        Ok(ProviderSession {
            session_token: resp.session_token,
            session_jwt: resp.session_jwt,
            roles: Vec::new(),
            user: None,
        })
    }

    async fn revoke_session(&self, session_token: &str) -> Result<(), ProviderError> {
        let resp = self
            .client
            .post(format!("{}/v1/sessions/revoke", self.base_url))
            .basic_auth(&self.project_id, Some(&self.secret))
            .json(&RevokeRequest { session_token })
            .send()
            .await
            .map_err(|e| ProviderError::Unreachable(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(ProviderError::Rejected(status.to_string()));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JWT claim decoding
// ---------------------------------------------------------------------------

/// Read the role list out of a session JWT payload. The JWT has already been
/// validated by the provider's authenticate call; this only decodes claims.
/// Any decode failure means "no roles" — never a hard error, the gate fails
/// closed to unauthorized instead of crashing the request.
pub fn roles_from_jwt(jwt: &str) -> Vec<String> {
    let Some(payload) = jwt.split('.').nth(1) else {
        return Vec::new();
    };
    let Ok(bytes) = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(payload) else {
        return Vec::new();
    };
    let Ok(claims) = serde_json::from_slice::<serde_json::Value>(&bytes) else {
        return Vec::new();
    };
    claims[names::STYTCH_SESSION_CLAIM]["roles"]
        .as_array()
        .map(|roles| {
            roles
                .iter()
                .filter_map(|r| r.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
