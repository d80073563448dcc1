//! In-memory cookie jar standing in for the browser's.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use cookie::Cookie;
use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use time::OffsetDateTime;
use url::Url;

#[derive(Clone, Debug)]
struct StoredCookie {
    value: String,
    path: String,
    secure: bool,
    expires_at: Option<OffsetDateTime>,
}

impl StoredCookie {
    fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    fn applies_to(&self, url: &Url) -> bool {
        if self.secure && url.scheme() != "https" && !is_loopback(url) {
            return false;
        }
        url.path().starts_with(&self.path)
    }
}

fn is_loopback(url: &Url) -> bool {
    matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"))
}

/// Cookie jar for a single service origin.
///
/// `Domain` attributes are ignored: every cookie belongs to the one origin the client talks to.
///
/// `Max-Age` takes precedence over `Expires`; `Max-Age=0` (or a past expiry)
/// removes the cookie, the way the service clears credentials on logout.
#[derive(Debug, Default)]
pub struct CookieVault {
    cookies: RwLock<HashMap<String, StoredCookie>>,
}

impl CookieVault {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, StoredCookie>> {
        self.cookies.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, StoredCookie>> {
        self.cookies.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Store a cookie as if it arrived in a `Set-Cookie` header.
    pub fn insert(&self, cookie: &Cookie<'_>) {
        self.insert_at(cookie, OffsetDateTime::now_utc());
    }

    fn insert_at(&self, cookie: &Cookie<'_>, now: OffsetDateTime) {
        let expires_at = match (cookie.max_age(), cookie.expires_datetime()) {
            (Some(max_age), _) => Some(now + max_age),
            (None, Some(at)) => Some(at),
            (None, None) => None,
        };
        let name = cookie.name().to_string();
        if expires_at.is_some_and(|at| at <= now) {
            self.write().remove(&name);
            return;
        }
        self.write().insert(
            name,
            StoredCookie {
                value: cookie.value().to_string(),
                path: cookie.path().unwrap_or("/").to_string(),
                secure: cookie.secure().unwrap_or(false),
                expires_at,
            },
        );
    }

    /// Current value of a live cookie.
    pub fn get(&self, name: &str) -> Option<String> {
        let now = OffsetDateTime::now_utc();
        self.read()
            .get(name)
            .filter(|c| !c.is_expired(now))
            .map(|c| c.value.clone())
    }

    pub fn remove(&self, name: &str) {
        self.write().remove(name);
    }

    pub fn clear(&self) {
        self.write().clear();
    }
}

impl CookieStore for CookieVault {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, _url: &Url) {
        let now = OffsetDateTime::now_utc();
        for header in cookie_headers {
            let Ok(raw) = header.to_str() else {
                continue;
            };
            match Cookie::parse(raw) {
                Ok(cookie) => self.insert_at(&cookie, now),
                Err(e) => tracing::debug!(error = %e, "Ignoring unparseable Set-Cookie header"),
            }
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let now = OffsetDateTime::now_utc();
        let header = self
            .read()
            .iter()
            .filter(|(_, c)| !c.is_expired(now) && c.applies_to(url))
            .map(|(name, c)| format!("{name}={}", c.value))
            .collect::<Vec<_>>()
            .join("; ");
        if header.is_empty() {
            return None;
        }
        HeaderValue::from_str(&header).ok()
    }
}
