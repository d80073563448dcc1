//! Identity oracle adapters.
//!
//! The identity provider verifies passwords and owns the stable user identifiers.
//! The session layer only ever talks to it through [`IdentityProvider`]; one
//! instance is built at startup and injected into the
//! [`SessionManager`](crate::auth::SessionManager).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub mod local;
pub mod remote;

pub use local::LocalIdentityProvider;
pub use remote::RemoteIdentityProvider;

/// Passwords shorter than this are refused at registration.
pub const MIN_PASSWORD_LEN: usize = 6;

/// A resolved, provider-issued identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Identity {
    /// Stable user identifier issued by the identity provider
    pub id: String,
    /// Email address the account was registered with
    pub email: String,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("EMAIL_EXISTS")]
    EmailTaken,
    #[error("WEAK_PASSWORD : Password should be at least {MIN_PASSWORD_LEN} characters")]
    WeakPassword,
    #[error("{0}")]
    InvalidCredentials(String),
    #[error("USER_NOT_FOUND")]
    UnknownUser,
    #[error("{0}")]
    Rejected(String),
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create a new account and return its identity.
    async fn create_account(&self, email: &str, password: &str)
    -> Result<Identity, IdentityError>;

    /// Check a password and resolve the identity it belongs to.
    async fn verify_password(&self, email: &str, password: &str)
    -> Result<Identity, IdentityError>;

    /// Fetch the current identity record by id.
    async fn get_user(&self, id: &str) -> Result<Identity, IdentityError>;
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
