//! Session endpoints: register, login, profile, refresh-token, logout.

use axum::{Extension, Json, http::StatusCode, response::IntoResponse};
use axum_extra::extract::{WithRejection, cookie::CookieJar};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::AppResources;
use crate::auth::{AUTH_TAG, REFRESH_COOKIE, Session, require_identity};
use crate::error::{ApiError, ErrorBody};
use crate::identity::Identity;

#[derive(Debug, Deserialize, ToSchema)]
pub struct Credentials {
    /// Account email address
    #[serde(default)]
    pub email: String,
    /// Account password
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    /// The access credential also set in the `_access_token` cookie
    pub access_token: String,
}

impl From<&Session> for TokenResponse {
    fn from(session: &Session) -> Self {
        Self {
            access_token: session.credentials.access_token.clone(),
        }
    }
}

pub fn router() -> OpenApiRouter {
    let protected = OpenApiRouter::new()
        .routes(routes!(profile))
        .route_layer(axum::middleware::from_fn(require_identity));

    OpenApiRouter::new()
        .routes(routes!(register))
        .routes(routes!(login))
        .routes(routes!(refresh_token))
        .routes(routes!(logout))
        .merge(protected)
}

#[tracing::instrument(skip(resources, jar, payload), fields(email_len = payload.email.len()))]
#[utoipa::path(
    post,
    path = "/register",
    tag = AUTH_TAG,
    operation_id = "Register",
    summary = "Create an account and start a session",
    description = "Creates an account with the identity provider and sets both credential cookies.",
    request_body(content = Credentials, description = "Email and password for the new account"),
    responses(
        (status = 201, description = "Account created", body = TokenResponse),
        (status = 400, description = "Missing field or registration rejected", body = ErrorBody),
        (status = 503, description = "Identity provider unreachable", body = ErrorBody)
    )
)]
async fn register(
    Extension(resources): Extension<AppResources>,
    jar: CookieJar,
    WithRejection(Json(payload), _): WithRejection<Json<Credentials>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let session = resources
        .sessions
        .register(&payload.email, &payload.password)
        .await?;
    let jar = resources.sessions.attach(jar, &session);
    Ok((
        StatusCode::CREATED,
        jar,
        Json(TokenResponse::from(&session)),
    ))
}

#[tracing::instrument(skip(resources, jar, payload), fields(email_len = payload.email.len()))]
#[utoipa::path(
    post,
    path = "/login",
    tag = AUTH_TAG,
    operation_id = "Login",
    summary = "Start a session with email and password",
    request_body(content = Credentials, description = "Account email and password"),
    responses(
        (status = 200, description = "Logged in", body = TokenResponse),
        (status = 400, description = "Missing field", body = ErrorBody),
        (status = 401, description = "Bad email or password", body = ErrorBody),
        (status = 503, description = "Identity provider unreachable", body = ErrorBody)
    )
)]
async fn login(
    Extension(resources): Extension<AppResources>,
    jar: CookieJar,
    WithRejection(Json(payload), _): WithRejection<Json<Credentials>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let session = resources
        .sessions
        .login(&payload.email, &payload.password)
        .await?;
    let jar = resources.sessions.attach(jar, &session);
    Ok((jar, Json(TokenResponse::from(&session))))
}

#[tracing::instrument(skip(resources, identity), fields(user_id = %identity.id))]
#[utoipa::path(
    get,
    path = "/profile",
    tag = AUTH_TAG,
    operation_id = "Get Profile",
    summary = "Current user's identity record",
    security(("access_cookie" = [])),
    responses(
        (status = 200, description = "Identity record", body = Identity),
        (status = 400, description = "Identity provider does not know this user", body = ErrorBody),
        (status = 401, description = "Missing or invalid access credential", body = ErrorBody)
    )
)]
async fn profile(
    Extension(resources): Extension<AppResources>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Identity>, ApiError> {
    let profile = resources.sessions.get_profile(&identity.id).await?;
    Ok(Json(profile))
}

#[tracing::instrument(skip_all)]
#[utoipa::path(
    post,
    path = "/refresh-token",
    tag = AUTH_TAG,
    operation_id = "Refresh Token",
    summary = "Mint a new credential pair from the refresh cookie",
    description = "Only the `_refresh_token` cookie is required. Both cookies are replaced on success.",
    responses(
        (status = 200, description = "Credentials rotated", body = TokenResponse),
        (status = 401, description = "Refresh credential missing, expired or invalid", body = ErrorBody)
    )
)]
async fn refresh_token(
    Extension(resources): Extension<AppResources>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let presented = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string());
    let session = resources.sessions.refresh(presented.as_deref()).await?;
    let jar = resources.sessions.attach(jar, &session);
    Ok((jar, Json(TokenResponse::from(&session))))
}

#[tracing::instrument(skip_all)]
#[utoipa::path(
    post,
    path = "/logout",
    tag = AUTH_TAG,
    operation_id = "Logout",
    summary = "Expire both credential cookies",
    description = "Best-effort notification. Issued credentials stay valid until they expire.",
    responses(
        (status = 204, description = "Cookies cleared")
    )
)]
async fn logout(
    Extension(resources): Extension<AppResources>,
    jar: CookieJar,
) -> impl IntoResponse {
    (StatusCode::NO_CONTENT, resources.sessions.logout(jar))
}
