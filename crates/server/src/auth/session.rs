//! Register / login / refresh / profile / logout orchestration.

use std::sync::Arc;

use axum_extra::extract::cookie::CookieJar;

use super::codec::{CredentialCodec, CredentialError, CredentialPair};
use super::cookies::CookiePolicy;
use crate::config::AuthConfig;
use crate::error::ApiError;
use crate::identity::{Identity, IdentityError, IdentityProvider};

/// Outcome of a successful register, login or refresh.
#[derive(Clone, Debug)]
pub struct Session {
    pub identity: Identity,
    pub credentials: CredentialPair,
}

pub struct SessionManager {
    codec: CredentialCodec,
    identity: Arc<dyn IdentityProvider>,
    cookies: CookiePolicy,
}

impl SessionManager {
    pub fn new(
        codec: CredentialCodec,
        identity: Arc<dyn IdentityProvider>,
        cookies: CookiePolicy,
    ) -> Self {
        Self {
            codec,
            identity,
            cookies,
        }
    }

    pub fn from_config(
        config: &AuthConfig,
        identity: Arc<dyn IdentityProvider>,
    ) -> Result<Self, CredentialError> {
        Ok(Self::new(
            CredentialCodec::new(config)?,
            identity,
            CookiePolicy::from_config(config),
        ))
    }

    pub fn codec(&self) -> &CredentialCodec {
        &self.codec
    }

    pub fn cookies(&self) -> &CookiePolicy {
        &self.cookies
    }

    #[tracing::instrument(skip(self, password), fields(email_len = email.len()))]
    pub async fn register(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        require_fields(email, password)?;

        let identity = self
            .identity
            .create_account(email, password)
            .await
            .map_err(|e| match e {
                IdentityError::EmailTaken
                | IdentityError::WeakPassword
                | IdentityError::Rejected(_)
                | IdentityError::InvalidCredentials(_) => {
                    ApiError::RegistrationFailed(e.to_string())
                }
                other => other.into(),
            })?;

        tracing::info!(user_id = %identity.id, "Registered account");
        self.open(identity)
    }

    #[tracing::instrument(skip(self, password), fields(email_len = email.len()))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        require_fields(email, password)?;

        let identity = self
            .identity
            .verify_password(email, password)
            .await
            .map_err(|e| match e {
                IdentityError::InvalidCredentials(_)
                | IdentityError::UnknownUser
                | IdentityError::Rejected(_) => ApiError::LoginFailed(e.to_string()),
                other => other.into(),
            })?;

        tracing::debug!(user_id = %identity.id, "Login succeeded");
        self.open(identity)
    }

    /// Re-mint both credentials from a refresh credential.
    ///
    /// The presented refresh credential is not invalidated; it stays usable until it expires.
    #[tracing::instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<Session, ApiError> {
        let token = refresh_token
            .filter(|t| !t.is_empty())
            .ok_or(ApiError::MissingCredential)?;

        let claims = self.codec.decode_refresh(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected refresh credential");
            ApiError::from(e)
        })?;
        self.open(claims.identity())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_profile(&self, id: &str) -> Result<Identity, ApiError> {
        self.identity.get_user(id).await.map_err(|e| match e {
            IdentityError::UnknownUser | IdentityError::Rejected(_) => {
                ApiError::ProfileLookupFailed(e.to_string())
            }
            other => other.into(),
        })
    }

    /// Expire both credential cookies. Nothing is revoked server-side.
    pub fn logout(&self, jar: CookieJar) -> CookieJar {
        self.cookies.clear_credentials(jar)
    }

    /// Attach the session's credentials to the response jar.
    pub fn attach(&self, jar: CookieJar, session: &Session) -> CookieJar {
        self.cookies.set_credentials(jar, &session.credentials)
    }

    /// Decode and cryptographically verify an access credential.
    pub fn verify_access(&self, token: &str) -> Result<Identity, CredentialError> {
        self.codec
            .decode_access(token)
            .map(|claims| claims.identity())
    }

    fn open(&self, identity: Identity) -> Result<Session, ApiError> {
        let credentials = self.codec.issue(&identity)?;
        Ok(Session {
            identity,
            credentials,
        })
    }
}

fn require_fields(email: &str, password: &str) -> Result<(), ApiError> {
    if email.trim().is_empty() {
        return Err(ApiError::MissingField("email"));
    }
    if password.is_empty() {
        return Err(ApiError::MissingField("password"));
    }
    Ok(())
}
