//! Shared fixtures for the HTTP integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum_test::TestServer;
use axum_extra::extract::cookie::Cookie;
use migration::{Migrator, MigratorTrait};
use notes_server::AppResources;
use notes_server::auth::{ACCESS_COOKIE, REFRESH_COOKIE, SessionManager};
use notes_server::config::{AppConfig, AuthConfig, IdentityConfig, SameSitePolicy};
use notes_server::identity::{Identity, IdentityError, IdentityProvider, LocalIdentityProvider};
use notes_server::notes::{Note, NoteStore, NoteStoreError, NoteUpdate, SeaOrmNoteStore};
use sea_orm::{Database, DatabaseConnection};
use serde_json::json;

pub const JWT_SECRET: &str = "test-signing-secret-0123456789abcdef";
pub const ENCRYPT_SECRET: &str = "test-encryption-secret-0123456789abc";

pub fn test_config() -> AppConfig {
    let config = AppConfig {
        database_url: "sqlite::memory:".into(),
        bind_address: "127.0.0.1".parse().unwrap(),
        port: 3000,
        allowed_origins: vec!["http://localhost:5173".into()],
        run_migrations: true,
        auth: AuthConfig {
            jwt_secret: JWT_SECRET.into(),
            encrypt_key_secret: ENCRYPT_SECRET.into(),
            access_token_lifetime: 900,
            refresh_token_lifetime: 604_800,
            secure_cookies: false,
            same_site: SameSitePolicy::Lax,
        },
        identity: IdentityConfig::default(),
    };
    config.validate().expect("test config is valid");
    config
}

/// In-memory SQLite database with the real schema applied.
pub async fn test_db() -> Arc<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    Arc::new(db)
}

/// Counts calls before delegating to the real provider.
pub struct CountingIdentity {
    inner: LocalIdentityProvider,
    pub calls: AtomicUsize,
}

#[async_trait]
impl IdentityProvider for CountingIdentity {
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.create_account(email, password).await
    }

    async fn verify_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, IdentityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.verify_password(email, password).await
    }

    async fn get_user(&self, id: &str) -> Result<Identity, IdentityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get_user(id).await
    }
}

/// Counts calls before delegating to the real store.
pub struct CountingNotes {
    inner: SeaOrmNoteStore,
    pub calls: AtomicUsize,
}

#[async_trait]
impl NoteStore for CountingNotes {
    async fn list(&self, user_id: &str, query: Option<&str>) -> Result<Vec<Note>, NoteStoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list(user_id, query).await
    }

    async fn get(&self, id: &str, user_id: &str) -> Result<Note, NoteStoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get(id, user_id).await
    }

    async fn create(
        &self,
        user_id: &str,
        title: &str,
        content: &str,
    ) -> Result<Note, NoteStoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.create(user_id, title, content).await
    }

    async fn update(
        &self,
        id: &str,
        user_id: &str,
        update: NoteUpdate,
    ) -> Result<Note, NoteStoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.update(id, user_id, update).await
    }

    async fn delete(&self, id: &str, user_id: &str) -> Result<(), NoteStoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(id, user_id).await
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub resources: AppResources,
    pub identity: Arc<CountingIdentity>,
    pub notes: Arc<CountingNotes>,
}

impl TestApp {
    pub fn identity_calls(&self) -> usize {
        self.identity.calls.load(Ordering::SeqCst)
    }

    pub fn note_calls(&self) -> usize {
        self.notes.calls.load(Ordering::SeqCst)
    }

    /// Register an account and return its (access, refresh) cookies.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
    ) -> (Cookie<'static>, Cookie<'static>) {
        let response = self
            .server
            .post("/api/register")
            .json(&json!({ "email": email, "password": password }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        (response.cookie(ACCESS_COOKIE), response.cookie(REFRESH_COOKIE))
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config()).await
}

pub async fn spawn_app_with(config: AppConfig) -> TestApp {
    let db = test_db().await;
    let identity = Arc::new(CountingIdentity {
        inner: LocalIdentityProvider::new(db.clone()),
        calls: AtomicUsize::new(0),
    });
    let notes = Arc::new(CountingNotes {
        inner: SeaOrmNoteStore::new(db),
        calls: AtomicUsize::new(0),
    });

    let sessions = SessionManager::from_config(&config.auth, identity.clone())
        .expect("Failed to build session manager");
    let resources = AppResources {
        config: Arc::new(config),
        sessions: Arc::new(sessions),
        notes: notes.clone(),
    };

    let server = TestServer::new(notes_server::api::router(resources.clone()))
        .expect("create test server");
    TestApp {
        server,
        resources,
        identity,
        notes,
    }
}

/// A cookie carrying only name and value, as a browser would send it back.
pub fn request_cookie(name: &str, value: &str) -> Cookie<'static> {
    Cookie::new(name.to_string(), value.to_string())
}
