//! OpenAPI/Utoipa configuration.

use crate::api::health::MISC_TAG;
use crate::auth::{ACCESS_COOKIE, AUTH_TAG};
use crate::notes::NOTES_TAG;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
};

/// Security addon for OpenAPI documentation.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "access_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                ACCESS_COOKIE,
                "Access credential set by `/api/login`, `/api/register` and `/api/refresh-token`.",
            ))),
        );

        // Non-browser callers may send the same credential as a bearer token
        let bearer = HttpBuilder::new()
            .scheme(HttpAuthScheme::Bearer)
            .bearer_format("JWT")
            .description(Some("The `accessToken` returned by login or register."))
            .build();
        components.add_security_scheme("Authorization", SecurityScheme::Http(bearer));
    }
}

/// OpenAPI documentation configuration.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Notes API",
        version = "1.0.0",
        description = "Notes service with stateless cookie sessions."
    ),
    tags(
        (name = MISC_TAG, description = "Miscellaneous endpoints"),
        (name = AUTH_TAG, description = "Account and session endpoints"),
        (name = NOTES_TAG, description = "Per-user notes")
    )
)]
pub struct ApiDoc;
