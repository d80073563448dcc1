//! Adapter for a hosted identity-toolkit REST API.
//!
//! - register: `accounts:signUp`
//! - login: `accounts:signInWithPassword` yields a provider id token, which is
//!   then resolved to an account with `accounts:lookup`
//! - profile: `accounts:lookup` by `localId` (needs an admin bearer token)

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};

use super::{Identity, IdentityError, IdentityProvider, normalize_email};
use crate::config::IdentityConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<AccountInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountInfo {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    message: String,
}

pub struct RemoteIdentityProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    service_token: Option<String>,
}

impl RemoteIdentityProvider {
    pub fn new(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| IdentityError::Rejected("identity.api_key is not configured".into()))?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            service_token: config.service_token.clone(),
        })
    }

    #[tracing::instrument(skip(self, body, bearer))]
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: Value,
        bearer: Option<&str>,
    ) -> Result<T, IdentityError> {
        let url = format!("{}/v1/accounts:{method}", self.base_url);
        let mut request = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, method, "Identity provider request failed");
            IdentityError::Unavailable(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(|e| {
                IdentityError::Unavailable(format!("invalid provider response: {e}"))
            });
        }
        if status.is_server_error() {
            return Err(IdentityError::Unavailable(format!(
                "identity provider returned {status}"
            )));
        }

        let message = response
            .json::<ProviderErrorBody>()
            .await
            .map(|b| b.error.message)
            .unwrap_or_else(|_| status.to_string());
        Err(classify_provider_error(message))
    }
}

/// Map provider error messages onto the adapter's error variants.
fn classify_provider_error(message: String) -> IdentityError {
    match message.as_str() {
        "EMAIL_EXISTS" => IdentityError::EmailTaken,
        m if m.starts_with("WEAK_PASSWORD") => IdentityError::WeakPassword,
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "USER_DISABLED"
        | "INVALID_EMAIL" => IdentityError::InvalidCredentials(message),
        "USER_NOT_FOUND" => IdentityError::UnknownUser,
        _ => IdentityError::Rejected(message),
    }
}

#[async_trait]
impl IdentityProvider for RemoteIdentityProvider {
    #[tracing::instrument(skip(self, password), fields(email_len = email.len()))]
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        let email = normalize_email(email);
        let created: AuthResponse = self
            .call(
                "signUp",
                json!({ "email": email, "password": password, "returnSecureToken": true }),
                None,
            )
            .await?;
        Ok(Identity {
            id: created.local_id,
            email: created.email.unwrap_or(email),
        })
    }

    #[tracing::instrument(skip(self, password), fields(email_len = email.len()))]
    async fn verify_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, IdentityError> {
        let email = normalize_email(email);
        let signed_in: AuthResponse = self
            .call(
                "signInWithPassword",
                json!({ "email": email, "password": password, "returnSecureToken": true }),
                None,
            )
            .await?;

        let lookup: LookupResponse = self
            .call("lookup", json!({ "idToken": signed_in.id_token }), None)
            .await?;
        let account = lookup
            .users
            .into_iter()
            .find(|u| u.local_id == signed_in.local_id)
            .ok_or_else(|| IdentityError::InvalidCredentials("INVALID_ID_TOKEN".into()))?;

        Ok(Identity {
            id: account.local_id,
            email: account.email.unwrap_or(email),
        })
    }

    #[tracing::instrument(skip(self))]
    async fn get_user(&self, id: &str) -> Result<Identity, IdentityError> {
        let lookup: LookupResponse = self
            .call(
                "lookup",
                json!({ "localId": [id] }),
                self.service_token.as_deref(),
            )
            .await?;
        let account = lookup
            .users
            .into_iter()
            .next()
            .ok_or(IdentityError::UnknownUser)?;
        Ok(Identity {
            id: account.local_id,
            email: account.email.unwrap_or_default(),
        })
    }
}
