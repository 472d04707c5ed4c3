//! AES-256-GCM backend with a key-store resident key.
//!
//! # Wire Format
//!
//! ```text
//! [1 byte iv length = 12][12 bytes iv][N bytes ciphertext][16 bytes tag]
//! ```

use std::sync::Arc;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::rngs::OsRng;
use rand::RngCore;

use super::Securable;
use crate::clock::Clock;
use crate::config::SecurityConfig;
use crate::keyspec::{validity_window, KeySpecBuilder};
use crate::keystore::{KeyEntry, KeyStore};
use crate::payload;
use crate::{PrefsafeError, Result};

/// Size of the nonce in bytes (96 bits for GCM).
pub const NONCE_SIZE: usize = 12;

/// Size of the authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Encrypts with a symmetric key that never leaves the key store.
pub struct AesGcmSecurable {
    key_store: Arc<dyn KeyStore>,
    alias: String,
}

impl AesGcmSecurable {
    /// Bind to `config.key_alias`, generating the key if the alias is free.
    pub fn new(
        key_store: Arc<dyn KeyStore>,
        clock: &dyn Clock,
        config: &SecurityConfig,
    ) -> Result<Self> {
        let alias = config.key_alias.clone();
        if !key_store.contains_alias(&alias)? {
            let (not_before, not_after) = validity_window(clock, config.validity_years)?;
            let spec = KeySpecBuilder::new().key_gen_spec(
                &alias,
                config.serial_number,
                not_before,
                not_after,
            );
            key_store.generate_secret_key(&spec)?;
        }
        Ok(Self { key_store, alias })
    }

    /// Key-store alias in use.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    fn cipher(&self) -> Result<Aes256Gcm> {
        let entry = self
            .key_store
            .entry(&self.alias)?
            .ok_or_else(|| PrefsafeError::invalid_key(&self.alias, "no entry in key store"))?;
        match entry.as_ref() {
            KeyEntry::Secret(key) => Aes256Gcm::new_from_slice(key.material())
                .map_err(|e| PrefsafeError::invalid_key(&self.alias, e.to_string())),
            other => Err(PrefsafeError::invalid_key(
                &self.alias,
                format!("expected secret key, found {}", other.kind()),
            )),
        }
    }
}

impl Securable for AesGcmSecurable {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let cipher = self.cipher()?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| PrefsafeError::Cipher(format!("AES-GCM encryption failed: {}", e)))?;

        payload::frame(&nonce_bytes, &ciphertext)
    }

    fn decrypt(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let framed = payload::parse(payload)?;
        if framed.iv.len() != NONCE_SIZE {
            return Err(PrefsafeError::malformed(NONCE_SIZE, framed.iv.len()));
        }
        let cipher = self.cipher()?;

        cipher
            .decrypt(Nonce::from_slice(framed.iv), framed.ciphertext)
            .map_err(|_| PrefsafeError::Cipher("authentication failed".to_string()))
    }
}
