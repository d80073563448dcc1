//! Request guard for protected routes.

use axum::{
    Extension,
    extract::Request,
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use super::cookies::ACCESS_COOKIE;
use crate::AppResources;
use crate::error::ApiError;

/// Verify the access credential and attach the resolved
/// [`Identity`](crate::identity::Identity) to the request extensions.
///
/// The `_access_token` cookie is preferred; an `Authorization: Bearer` header is
/// accepted for non-browser callers. The identity provider is never consulted.
pub async fn require_identity(
    Extension(resources): Extension<AppResources>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = jar
        .get(ACCESS_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| bearer_token(request.headers()))
        .ok_or(ApiError::NoCredential)?;

    let identity = resources.sessions.verify_access(&token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected access credential");
        ApiError::InvalidCredential
    })?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
