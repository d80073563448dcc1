use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::auth::CredentialError;
use crate::identity::IdentityError;
use crate::notes::NoteStoreError;

/// Errors surfaced at the HTTP boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
    #[error("Registration failed: {0}")]
    RegistrationFailed(String),
    #[error("Login failed: {0}")]
    LoginFailed(String),
    #[error("Refresh token is missing")]
    MissingCredential,
    #[error("Credential has expired")]
    ExpiredCredential,
    #[error("Credential signature is invalid")]
    InvalidSignature,
    #[error("Credential is malformed: {0}")]
    MalformedCredential(String),
    #[error("No token provided")]
    NoCredential,
    #[error("Invalid token")]
    InvalidCredential,
    #[error("Failed to get user profile: {0}")]
    ProfileLookupFailed(String),
    #[error("Note not found")]
    NoteNotFound,
    #[error("Upstream service unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingField(_)
            | ApiError::InvalidBody(_)
            | ApiError::RegistrationFailed(_)
            | ApiError::ProfileLookupFailed(_) => StatusCode::BAD_REQUEST,
            ApiError::LoginFailed(_)
            | ApiError::MissingCredential
            | ApiError::ExpiredCredential
            | ApiError::InvalidSignature
            | ApiError::MalformedCredential(_)
            | ApiError::NoCredential
            | ApiError::InvalidCredential => StatusCode::UNAUTHORIZED,
            ApiError::NoteNotFound => StatusCode::NOT_FOUND,
            ApiError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code used as the `error` field of the body.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::MissingField(_) => "missing_field",
            ApiError::InvalidBody(_) => "invalid_body",
            ApiError::RegistrationFailed(_) => "registration_failed",
            ApiError::LoginFailed(_) => "login_failed",
            ApiError::MissingCredential => "missing_credential",
            ApiError::ExpiredCredential => "expired_credential",
            ApiError::InvalidSignature => "invalid_signature",
            ApiError::MalformedCredential(_) => "malformed_credential",
            ApiError::NoCredential => "no_credential",
            ApiError::InvalidCredential => "invalid_credential",
            ApiError::ProfileLookupFailed(_) => "profile_lookup_failed",
            ApiError::NoteNotFound => "not_found",
            ApiError::UpstreamUnavailable(_) => "upstream_unavailable",
            ApiError::Internal(_) => "server_error",
        }
    }
}

/// JSON error body returned by every endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Error code (e.g., "no_credential", "not_found")
    pub error: String,
    /// Human-readable error description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_description = match &self {
            ApiError::Internal(detail) => {
                tracing::error!(
                    name = "api.internal_error",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    error = %detail,
                    message = "Request failed with an internal error"
                );
                None
            }
            ApiError::UpstreamUnavailable(detail) => {
                tracing::warn!(error = %detail, "Upstream provider unavailable");
                Some("Upstream service unavailable".to_string())
            }
            other => Some(other.to_string()),
        };
        let body = ErrorBody {
            error: self.code().to_string(),
            error_description,
        };
        (status, Json(body)).into_response()
    }
}

/// Malformed JSON, a wrong content type or mistyped fields all become a 400.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::Expired => ApiError::ExpiredCredential,
            CredentialError::InvalidSignature => ApiError::InvalidSignature,
            CredentialError::Malformed(reason) => ApiError::MalformedCredential(reason),
            CredentialError::Signing(reason) => ApiError::Internal(reason),
            CredentialError::Crypto => ApiError::Internal("cryptographic failure".into()),
        }
    }
}

impl From<NoteStoreError> for ApiError {
    fn from(err: NoteStoreError) -> Self {
        match err {
            NoteStoreError::NotFound => ApiError::NoteNotFound,
            NoteStoreError::Database(e) => ApiError::Internal(format!("DB error: {e}")),
        }
    }
}

impl From<IdentityError> for ApiError {
    /// Fallback mapping; the session manager maps oracle errors per operation.
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Unavailable(reason) => ApiError::UpstreamUnavailable(reason),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
