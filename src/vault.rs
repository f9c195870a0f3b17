//! Credential vault: symmetric encryption of WordPress Application Passwords.
//!
//! Stored blob layout: `base64( base64(ciphertext) + "::" + base64(nonce) )`.
//! The cipher is AES-256-GCM, so a tampered ciphertext fails the tag check
//! instead of decrypting to garbage.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngCore;
use thiserror::Error;

/// AES-256-GCM nonce size (96 bits).
const NONCE_SIZE: usize = 12;

/// Minimum length of the configuration-supplied key material.
pub const MIN_KEY_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("encryption key must be at least {MIN_KEY_BYTES} bytes")]
    KeyTooShort,

    #[error("ciphertext blob is not valid base64")]
    BadEncoding,

    #[error("ciphertext blob is missing the `::` separator")]
    MissingSeparator,

    #[error("nonce has the wrong length")]
    BadNonce,

    #[error("cipher operation failed")]
    CipherFailure,

    #[error("decrypted credential is not valid UTF-8")]
    BadPlaintext,
}

/// Owns the encryption key; no caller ever sees key material.
#[derive(Clone)]
pub struct CredentialVault {
    key: [u8; 32],
}

impl CredentialVault {
    /// Derive the vault key from configured secret material.
    /// The first 32 bytes are used; shorter secrets are rejected at startup.
    pub fn new(secret: &str) -> Result<Self, VaultError> {
        let bytes = secret.as_bytes();
        if bytes.len() < MIN_KEY_BYTES {
            return Err(VaultError::KeyTooShort);
        }
        let mut key = [0u8; 32];
        key.copy_from_slice(&bytes[..MIN_KEY_BYTES]);
        Ok(Self { key })
    }

    /// Encrypt a credential with a fresh random nonce.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, VaultError> {
        let cipher = Aes256Gcm::new(&self.key.into());

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| VaultError::CipherFailure)?;

        let inner = format!("{}::{}", BASE64.encode(&ciphertext), BASE64.encode(nonce_bytes));
        Ok(BASE64.encode(inner))
    }

    /// Decrypt a stored blob. Fails closed: every malformed input maps to a
    /// distinct `VaultError`, never to plaintext-looking garbage.
    pub fn decrypt(&self, blob: &str) -> Result<String, VaultError> {
        let inner = BASE64
            .decode(blob.trim())
            .map_err(|_| VaultError::BadEncoding)?;
        let inner = String::from_utf8(inner).map_err(|_| VaultError::BadEncoding)?;

        let (ct_b64, nonce_b64) = inner
            .split_once("::")
            .ok_or(VaultError::MissingSeparator)?;

        let ciphertext = BASE64.decode(ct_b64).map_err(|_| VaultError::BadEncoding)?;
        let nonce_bytes = BASE64
            .decode(nonce_b64)
            .map_err(|_| VaultError::BadEncoding)?;
        if nonce_bytes.len() != NONCE_SIZE {
            return Err(VaultError::BadNonce);
        }

        let cipher = Aes256Gcm::new(&self.key.into());
        let plaintext = cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_slice())
            .map_err(|_| VaultError::CipherFailure)?;

        String::from_utf8(plaintext).map_err(|_| VaultError::BadPlaintext)
    }
}
