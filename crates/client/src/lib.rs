//! Client SDK for the notes service.
//!
//! [`ApiClient`] owns the HTTP client and the [`CookieVault`] that plays the
//! role of the browser cookie jar. Every protected call goes through
//! [`ApiClient::execute`], which on a 401 refreshes the session once and
//! replays the request once. [`SessionStore`] holds the single
//! [`SessionState`] and is the only place that mutates it.

pub mod api;
pub mod cookies;
pub mod error;
pub mod model;
pub mod notes;
pub mod session;

pub use api::ApiClient;
pub use cookies::CookieVault;
pub use error::ClientError;
pub use model::{Identity, Note, NoteUpdate};
pub use notes::NotesApi;
pub use session::{SessionState, SessionStore};

pub const ACCESS_COOKIE: &str = "_access_token";
pub const REFRESH_COOKIE: &str = "_refresh_token";
