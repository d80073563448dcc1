//! Symmetric encryption of refresh credentials.
//!
//! The key is derived once from the configured secret with PBKDF2-HMAC-SHA256.
//! Every call to [`RefreshCipher::encrypt`] draws a fresh random nonce, so the
//! same plaintext never produces the same ciphertext twice. The wire form is
//! `hex(nonce):hex(ciphertext || tag)`.

use std::num::NonZeroU32;

use ring::aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};

use super::codec::CredentialError;

const PBKDF2_ROUNDS: NonZeroU32 = NonZeroU32::new(100_000).unwrap();
const KEY_SALT: &[u8] = b"notes-server/refresh-credential/v1";

pub struct RefreshCipher {
    key: LessSafeKey,
    rng: SystemRandom,
}

impl RefreshCipher {
    pub fn new(secret: &str) -> Result<Self, CredentialError> {
        if secret.is_empty() {
            return Err(CredentialError::Signing(
                "encryption secret must not be empty".into(),
            ));
        }
        let mut key_bytes = [0u8; 32];
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            PBKDF2_ROUNDS,
            KEY_SALT,
            secret.as_bytes(),
            &mut key_bytes,
        );
        let unbound =
            UnboundKey::new(&AES_256_GCM, &key_bytes).map_err(|_| CredentialError::Crypto)?;
        Ok(Self {
            key: LessSafeKey::new(unbound),
            rng: SystemRandom::new(),
        })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CredentialError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| CredentialError::Crypto)?;

        let mut in_out = plaintext.as_bytes().to_vec();
        self.key
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut in_out,
            )
            .map_err(|_| CredentialError::Crypto)?;

        Ok(format!(
            "{}:{}",
            hex::encode(nonce_bytes),
            hex::encode(in_out)
        ))
    }

    /// Decrypt a value produced by [`encrypt`](Self::encrypt).
    ///
    /// Structural problems are `Malformed`; a ciphertext that fails
    /// authentication (tampered, or encrypted under another key) is `InvalidSignature`.
    pub fn decrypt(&self, value: &str) -> Result<String, CredentialError> {
        let (nonce_hex, ciphertext_hex) = value
            .split_once(':')
            .ok_or_else(|| CredentialError::Malformed("missing nonce separator".into()))?;

        let nonce_bytes: [u8; NONCE_LEN] = hex::decode(nonce_hex)
            .map_err(|e| CredentialError::Malformed(format!("invalid nonce: {e}")))?
            .try_into()
            .map_err(|_| CredentialError::Malformed("invalid nonce length".into()))?;
        let mut in_out = hex::decode(ciphertext_hex)
            .map_err(|e| CredentialError::Malformed(format!("invalid ciphertext: {e}")))?;
        if in_out.len() < AES_256_GCM.tag_len() {
            return Err(CredentialError::Malformed("ciphertext too short".into()));
        }

        let plaintext = self
            .key
            .open_in_place(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut in_out,
            )
            .map_err(|_| CredentialError::InvalidSignature)?;

        String::from_utf8(plaintext.to_vec())
            .map_err(|_| CredentialError::Malformed("plaintext is not UTF-8".into()))
    }
}
