//! Credential issuance and verification.

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};

use super::cipher::RefreshCipher;
use crate::config::AuthConfig;
use crate::identity::Identity;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential has expired")]
    Expired,
    #[error("credential signature is invalid")]
    InvalidSignature,
    #[error("malformed credential: {0}")]
    Malformed(String),
    #[error("failed to sign credential: {0}")]
    Signing(String),
    #[error("cryptographic operation failed")]
    Crypto,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialKind {
    Access,
    Refresh,
}

/// Claims embedded in both credentials of a pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub uid: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
    pub typ: CredentialKind,
}

impl Claims {
    pub fn new(
        identity: &Identity,
        kind: CredentialKind,
        now: OffsetDateTime,
        ttl: Duration,
    ) -> Self {
        Self {
            uid: identity.id.clone(),
            email: identity.email.clone(),
            iat: now.unix_timestamp(),
            exp: (now + ttl).unix_timestamp(),
            typ: kind,
        }
    }

    pub fn identity(&self) -> Identity {
        Identity {
            id: self.uid.clone(),
            email: self.email.clone(),
        }
    }

    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now.unix_timestamp() >= self.exp
    }
}

#[derive(Clone, Debug)]
pub struct CredentialPair {
    pub access_token: String,
    /// Signed and encrypted; opaque to clients.
    pub refresh_token: String,
}

pub struct CredentialCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    cipher: RefreshCipher,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl CredentialCodec {
    pub fn new(config: &AuthConfig) -> Result<Self, CredentialError> {
        if config.jwt_secret.is_empty() {
            return Err(CredentialError::Signing(
                "signing secret must not be empty".into(),
            ));
        }
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the caller-supplied clock in `verify_at`.
        validation.validate_exp = false;

        Ok(Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            cipher: RefreshCipher::new(&config.encrypt_key_secret)?,
            access_ttl: Duration::seconds(config.access_token_lifetime),
            refresh_ttl: Duration::seconds(config.refresh_token_lifetime),
        })
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Mint a fresh pair for `identity`, both credentials carrying the same identity claims.
    pub fn issue(&self, identity: &Identity) -> Result<CredentialPair, CredentialError> {
        self.issue_at(identity, OffsetDateTime::now_utc())
    }

    pub fn issue_at(
        &self,
        identity: &Identity,
        now: OffsetDateTime,
    ) -> Result<CredentialPair, CredentialError> {
        let access = Claims::new(identity, CredentialKind::Access, now, self.access_ttl);
        let refresh = Claims::new(identity, CredentialKind::Refresh, now, self.refresh_ttl);
        Ok(CredentialPair {
            access_token: self.sign(&access)?,
            refresh_token: self.encode_refresh(&refresh)?,
        })
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, CredentialError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| CredentialError::Signing(e.to_string()))
    }

    /// Sign the refresh claims and encrypt the resulting token.
    pub fn encode_refresh(&self, claims: &Claims) -> Result<String, CredentialError> {
        let signed = self.sign(claims)?;
        self.cipher.encrypt(&signed)
    }

    pub fn decode_access(&self, token: &str) -> Result<Claims, CredentialError> {
        self.decode_access_at(token, OffsetDateTime::now_utc())
    }

    pub fn decode_access_at(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> Result<Claims, CredentialError> {
        self.verify_at(token, CredentialKind::Access, now)
    }

    pub fn decode_refresh(&self, token: &str) -> Result<Claims, CredentialError> {
        self.decode_refresh_at(token, OffsetDateTime::now_utc())
    }

    pub fn decode_refresh_at(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> Result<Claims, CredentialError> {
        let signed = self.cipher.decrypt(token)?;
        self.verify_at(&signed, CredentialKind::Refresh, now)
    }

    /// Verify signature, credential kind and expiry, in that order.
    pub fn verify_at(
        &self,
        token: &str,
        expected: CredentialKind,
        now: OffsetDateTime,
    ) -> Result<Claims, CredentialError> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => CredentialError::InvalidSignature,
                ErrorKind::ExpiredSignature => CredentialError::Expired,
                _ => CredentialError::Malformed(e.to_string()),
            })?
            .claims;

        if claims.typ != expected {
            return Err(CredentialError::Malformed(format!(
                "expected {expected:?} credential, got {:?}",
                claims.typ
            )));
        }
        if claims.is_expired_at(now) {
            return Err(CredentialError::Expired);
        }
        Ok(claims)
    }
}
