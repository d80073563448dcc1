//! Stateless cookie sessions.
//!
//! A successful register, login or refresh mints a fresh credential pair:
//! - a short-lived signed access credential, sent as the `_access_token` cookie
//! - a long-lived signed *and encrypted* refresh credential, sent as `_refresh_token`
//!
//! There is no server-side session table. Validity is entirely determined by the
//! signature and expiry embedded in each credential, so any worker can verify any
//! request without coordination.

pub mod cipher;
pub mod codec;
pub mod cookies;
pub mod middleware;
pub mod session;

pub use cipher::RefreshCipher;
pub use codec::{Claims, CredentialCodec, CredentialError, CredentialKind, CredentialPair};
pub use cookies::{ACCESS_COOKIE, CookiePolicy, REFRESH_COOKIE};
pub use middleware::require_identity;
pub use session::{Session, SessionManager};

/// OpenAPI tag for authentication endpoints
pub const AUTH_TAG: &str = "Auth";
