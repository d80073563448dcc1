use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use super::codec::CredentialPair;
use crate::config::{AuthConfig, SameSitePolicy};

pub const ACCESS_COOKIE: &str = "_access_token";
pub const REFRESH_COOKIE: &str = "_refresh_token";

/// Attributes shared by both credential cookies.
#[derive(Clone, Debug)]
pub struct CookiePolicy {
    pub secure: bool,
    pub same_site: SameSite,
    /// Never longer than the access credential lifetime.
    pub access_max_age: Duration,
    pub refresh_max_age: Duration,
}

impl CookiePolicy {
    pub fn from_config(config: &AuthConfig) -> Self {
        let same_site = match config.same_site {
            SameSitePolicy::Strict => SameSite::Strict,
            SameSitePolicy::Lax => SameSite::Lax,
            SameSitePolicy::None => SameSite::None,
        };
        Self {
            secure: config.secure_cookies,
            same_site,
            access_max_age: Duration::seconds(config.access_token_lifetime),
            refresh_max_age: Duration::seconds(config.refresh_token_lifetime),
        }
    }

    fn cookie(&self, name: &'static str, value: String, max_age: Duration) -> Cookie<'static> {
        Cookie::build((name, value))
            .http_only(true)
            .secure(self.secure)
            .same_site(self.same_site)
            .path("/")
            .max_age(max_age)
            .build()
    }

    pub fn access_cookie(&self, token: &str) -> Cookie<'static> {
        self.cookie(ACCESS_COOKIE, token.to_string(), self.access_max_age)
    }

    pub fn refresh_cookie(&self, token: &str) -> Cookie<'static> {
        self.cookie(REFRESH_COOKIE, token.to_string(), self.refresh_max_age)
    }

    /// Add both credential cookies to the response jar.
    pub fn set_credentials(&self, jar: CookieJar, pair: &CredentialPair) -> CookieJar {
        jar.add(self.refresh_cookie(&pair.refresh_token))
            .add(self.access_cookie(&pair.access_token))
    }

    /// Expire both credential cookies, whether or not the request carried them.
    pub fn clear_credentials(&self, jar: CookieJar) -> CookieJar {
        jar.add(self.cookie(REFRESH_COOKIE, String::new(), Duration::ZERO))
            .add(self.cookie(ACCESS_COOKIE, String::new(), Duration::ZERO))
    }
}
