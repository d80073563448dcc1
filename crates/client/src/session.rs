//! The client's single source of truth for "who is signed in".

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use time::OffsetDateTime;
use tokio::sync::watch;

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::model::Identity;
use crate::{ACCESS_COOKIE, REFRESH_COOKIE};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    pub identity: Option<Identity>,
    /// True until the first [`SessionStore::initialize`] has resolved.
    pub loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            identity: None,
            loading: true,
        }
    }
}

impl SessionState {
    pub fn anonymous() -> Self {
        Self {
            identity: None,
            loading: false,
        }
    }

    pub fn signed_in(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
            loading: false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

#[derive(Deserialize)]
struct ExpiryClaim {
    exp: i64,
}

/// Read `exp` from an access credential without verifying its signature.
///
/// Only used to decide whether a network round-trip is worth making; the
/// service always verifies.
pub fn access_expiry(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice::<ExpiryClaim>(&bytes)
        .ok()
        .map(|claim| claim.exp)
}

/// Owns every transition of the [`SessionState`].
#[derive(Clone)]
pub struct SessionStore {
    api: ApiClient,
}

impl SessionStore {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.api.state().subscribe()
    }

    pub fn current(&self) -> SessionState {
        self.api.state().borrow().clone()
    }

    /// Resolve the startup state from whatever cookies the vault holds.
    ///
    /// - live access credential: fetch the profile
    /// - stale or missing access credential with a refresh cookie: refresh once, then fetch
    /// - neither: anonymous, without touching the network
    #[tracing::instrument(skip(self))]
    pub async fn initialize(&self) -> SessionState {
        let vault = self.api.vault();
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let access_live = vault
            .get(ACCESS_COOKIE)
            .as_deref()
            .and_then(access_expiry)
            .is_some_and(|exp| now < exp);
        let has_refresh = vault.get(REFRESH_COOKIE).is_some();

        let outcome = if access_live {
            self.fetch_profile().await
        } else if has_refresh {
            match self.api.refresh().await {
                Ok(()) => self.fetch_profile().await,
                Err(e) => Err(e),
            }
        } else {
            self.api.state().send_replace(SessionState::anonymous());
            return self.current();
        };

        match outcome {
            Ok(identity) => {
                self.api
                    .state()
                    .send_replace(SessionState::signed_in(identity));
            }
            Err(e) => {
                tracing::debug!(error = %e, "No usable session at startup");
                vault.clear();
                self.api.state().send_replace(SessionState::anonymous());
            }
        }
        self.current()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, ClientError> {
        self.authenticate("/api/login", email, password).await
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<Identity, ClientError> {
        self.authenticate("/api/register", email, password).await
    }

    #[tracing::instrument(skip(self, password), fields(email_len = email.len()))]
    async fn authenticate(
        &self,
        path: &str,
        email: &str,
        password: &str,
    ) -> Result<Identity, ClientError> {
        let builder = self
            .api
            .request(Method::POST, path)?
            .json(&json!({ "email": email, "password": password }));

        let result = match self
            .api
            .send_unintercepted::<serde_json::Value>(builder)
            .await
        {
            Ok(_) => self.fetch_profile().await,
            Err(e) => Err(e),
        };

        match result {
            Ok(identity) => {
                self.api
                    .state()
                    .send_replace(SessionState::signed_in(identity.clone()));
                Ok(identity)
            }
            Err(e) => {
                self.api.state().send_modify(|state| state.loading = false);
                Err(e)
            }
        }
    }

    /// Forget local credentials; the service is told on a best-effort basis.
    pub fn logout(&self) {
        self.api.end_session();
    }

    /// Refresh explicitly. A failure ends the session.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        self.api
            .refresh()
            .await
            .inspect_err(|_| self.api.end_session())
    }

    pub async fn fetch_profile(&self) -> Result<Identity, ClientError> {
        self.api
            .send_json(self.api.request(Method::GET, "/api/profile")?)
            .await
    }
}
