//! Identity provider backed by the service's own database.
//!
//! Passwords are hashed with Argon2id. Hashing runs on the blocking pool so a
//! burst of logins cannot stall the request executor.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, SqlErr,
};
use time::OffsetDateTime;

use super::{Identity, IdentityError, IdentityProvider, MIN_PASSWORD_LEN, normalize_email};
use crate::entity::user_account;

/// Deliberately the same for unknown email and wrong password.
const INVALID_LOGIN: &str = "INVALID_LOGIN_CREDENTIALS";

pub struct LocalIdentityProvider {
    db: Arc<DatabaseConnection>,
}

impl LocalIdentityProvider {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<user_account::Model>, IdentityError> {
        Ok(user_account::Entity::find()
            .filter(user_account::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await?)
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    #[tracing::instrument(skip(self, password), fields(email_len = email.len()))]
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(IdentityError::WeakPassword);
        }
        let email = normalize_email(email);
        if self.find_by_email(&email).await?.is_some() {
            return Err(IdentityError::EmailTaken);
        }

        let password = password.to_owned();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| IdentityError::Hashing(e.to_string()))??;

        let account = user_account::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            email: Set(email),
            password_hash: Set(password_hash),
            created_at: Set(OffsetDateTime::now_utc()),
        };
        // A concurrent registration can claim the email while we hash.
        let account = account.insert(self.db.as_ref()).await.map_err(|e| {
            if is_unique_violation(&e) {
                IdentityError::EmailTaken
            } else {
                e.into()
            }
        })?;
        tracing::info!(user_id = %account.id, "Created local account");
        Ok(account.into())
    }

    #[tracing::instrument(skip(self, password), fields(email_len = email.len()))]
    async fn verify_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, IdentityError> {
        let email = normalize_email(email);
        let Some(account) = self.find_by_email(&email).await? else {
            return Err(IdentityError::InvalidCredentials(INVALID_LOGIN.into()));
        };

        let password = password.to_owned();
        let hash = account.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| IdentityError::Hashing(e.to_string()))?;
        if !matches {
            return Err(IdentityError::InvalidCredentials(INVALID_LOGIN.into()));
        }
        Ok(account.into())
    }

    #[tracing::instrument(skip(self))]
    async fn get_user(&self, id: &str) -> Result<Identity, IdentityError> {
        user_account::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .map(Identity::from)
            .ok_or(IdentityError::UnknownUser)
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Hash a password using Argon2id, returning the PHC string.
fn hash_password(password: &str) -> Result<String, IdentityError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| IdentityError::Hashing(e.to_string()))
}

/// Unparseable stored hashes never verify.
fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
