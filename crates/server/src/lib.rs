//! A notes service with stateless cookie sessions.
//!
//! Register/login mint a short-lived access credential and a long-lived,
//! encrypted refresh credential, both delivered as httpOnly cookies. Protected
//! routes are gated by [`auth::require_identity`], which verifies the access
//! credential without any server-side session lookup.

use std::sync::Arc;

use crate::auth::SessionManager;
use crate::config::AppConfig;
use crate::notes::NoteStore;

pub mod api;
pub mod auth;
pub mod config;
pub mod entity;
pub mod error;
pub mod identity;
pub mod notes;

/// Shared, immutable per-process resources handed to every request.
#[derive(Clone)]
pub struct AppResources {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<SessionManager>,
    pub notes: Arc<dyn NoteStore>,
}
