//! The authoritative half of the admin gate.
//!
//! A cookie's mere presence only gets a request past the coarse
//! middleware check; this service asks the identity provider whether
//! the credential is still live and whether the account carries the
//! admin role.

use tracing::{debug, warn};

use crate::names;
use crate::rejections::AppError;
use crate::stytch::{
    roles_from_jwt, IdentityProvider, ProviderError, ProviderSession, ProviderUser, StytchClient,
};

/// Why the gate refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDenial {
    MissingCredential,
    InvalidOrExpiredCredential,
    UnauthorizedRole,
}

impl From<GateDenial> for AppError {
    fn from(denial: GateDenial) -> Self {
        match denial {
            GateDenial::MissingCredential => AppError::AuthRequired,
            GateDenial::InvalidOrExpiredCredential | GateDenial::UnauthorizedRole => {
                AppError::Unauthorized
            }
        }
    }
}

/// What the OAuth callback decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Credential exchanged and the account holds the admin role; set the
    /// session cookie and send them home.
    Granted { session_token: String },
    /// The provider rejected the exchange (bad token, wrong type, expired).
    AuthFailed,
    /// Exchange succeeded but the account lacks the admin role.
    NotAuthorized,
}

#[derive(Clone)]
pub struct AdminAuthService<P = StytchClient> {
    provider: P,
    admin_role: String,
}

impl<P> AdminAuthService<P>
where
    P: IdentityProvider,
{
    pub fn new(provider: P, admin_role: String) -> Self {
        Self {
            provider,
            admin_role,
        }
    }

    /// Authoritative per-request check: validate the session token with the
    /// provider and confirm the admin role is in the JWT's session claim.
    pub async fn authorize(&self, session_token: &str) -> Result<ProviderSession, GateDenial> {
        if session_token.is_empty() {
            return Err(GateDenial::MissingCredential);
        }

        let session = match self
            .provider
            .authenticate_session(session_token, names::ADMIN_SESSION_MINUTES)
            .await
        {
            Ok(session) => session,
            Err(ProviderError::Unreachable(e)) => {
                warn!("identity provider unreachable: {e}");
                return Err(GateDenial::InvalidOrExpiredCredential);
            }
            Err(ProviderError::Rejected(e)) => {
                debug!("session rejected by identity provider: {e}");
                return Err(GateDenial::InvalidOrExpiredCredential);
            }
        };

        if self.has_admin_role(&session) {
            Ok(session)
        } else {
            Err(GateDenial::UnauthorizedRole)
        }
    }

    /// Exchange an OAuth callback token for a session, then apply the same
    /// role check the per-request gate uses. An authenticated-but-unroled
    /// account gets its freshly minted session revoked on the way out.
    pub async fn oauth_callback(&self, token: &str, token_type: &str) -> CallbackOutcome {
        if token.is_empty() || token_type != names::OAUTH_TOKEN_TYPE {
            return CallbackOutcome::AuthFailed;
        }

        let session = match self
            .provider
            .authenticate_oauth(token, names::ADMIN_SESSION_MINUTES)
            .await
        {
            Ok(session) => session,
            Err(e) => {
                warn!("oauth exchange failed: {e}");
                return CallbackOutcome::AuthFailed;
            }
        };

        if self.has_admin_role(&session) {
            CallbackOutcome::Granted {
                session_token: session.session_token,
            }
        } else {
            if let Err(e) = self.provider.revoke_session(&session.session_token).await {
                warn!("failed to revoke session for unauthorized account: {e}");
            }
            CallbackOutcome::NotAuthorized
        }
    }

    /// Quiz-taker identity capture: exchange an OAuth token for the
    /// provider's user record. No role requirement, no cookie minted.
    pub async fn exchange_identity(&self, token: &str) -> Result<ProviderUser, ProviderError> {
        let session = self
            .provider
            .authenticate_oauth(token, names::TAKER_SESSION_MINUTES)
            .await?;

        session
            .user
            .ok_or_else(|| ProviderError::Rejected("no user record in response".into()))
    }

    /// Best effort: the cookie gets cleared regardless of what the provider
    /// says about the revocation.
    pub async fn logout(&self, session_token: &str) {
        if session_token.is_empty() {
            return;
        }
        if let Err(e) = self.provider.revoke_session(session_token).await {
            debug!("session revocation failed during logout: {e}");
        }
    }

    fn has_admin_role(&self, session: &ProviderSession) -> bool {
        if session.roles.iter().any(|r| r == &self.admin_role) {
            return true;
        }
        // The REST response may omit roles; the JWT's session claim is the
        // fallback source of truth.
        roles_from_jwt(&session.session_jwt)
            .iter()
            .any(|r| r == &self.admin_role)
    }
}
