//! Legacy hybrid backend: RSA-wrapped AES-128 master key, ECB bulk cipher.
//!
//! For hosts whose key store cannot hold symmetric keys. A 16-byte master
//! key is generated once, wrapped with the RSA pair and persisted in a side
//! store as base64 text. Every operation unwraps it into a transient buffer
//! that is zeroized after use; the unwrapped key is never cached.
//!
//! ECB with PKCS#7 padding and no IV is weaker than the AES-GCM backend:
//! equal plaintexts produce equal ciphertexts and nothing is authenticated.

use std::sync::{Arc, Mutex};

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyInit};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use super::rsa_ecb::RsaEcbSecurable;
use super::Securable;
use crate::payload;
use crate::prefs::Preferences;
use crate::{PrefsafeError, Result};

type Aes128EcbEnc = ecb::Encryptor<aes::Aes128>;
type Aes128EcbDec = ecb::Decryptor<aes::Aes128>;

/// Size of the wrapped master key in bytes.
pub const MASTER_KEY_SIZE: usize = 16;

/// Serializes master-key creation so concurrent first opens of the same side
/// store converge on one wrapped key.
static MASTER_KEY_INIT: Mutex<()> = Mutex::new(());

/// AES-128/ECB/PKCS#7 with an RSA-wrapped master key.
pub struct HybridRsaAesSecurable {
    rsa: RsaEcbSecurable,
    side_store: Arc<dyn Preferences>,
    master_key_entry: String,
}

impl HybridRsaAesSecurable {
    /// Wrap and persist a fresh master key under `master_key_entry` unless
    /// the side store already holds one.
    pub fn new(
        rsa: RsaEcbSecurable,
        side_store: Arc<dyn Preferences>,
        master_key_entry: impl Into<String>,
    ) -> Result<Self> {
        let master_key_entry = master_key_entry.into();
        if !side_store.contains(&master_key_entry) {
            let _guard = MASTER_KEY_INIT.lock().map_err(|_| {
                PrefsafeError::Storage("master key lock poisoned".to_string())
            })?;
            if side_store.contains(&master_key_entry) {
                return Ok(Self {
                    rsa,
                    side_store,
                    master_key_entry,
                });
            }

            let mut master_key = Zeroizing::new([0u8; MASTER_KEY_SIZE]);
            OsRng.fill_bytes(&mut master_key[..]);
            let wrapped = payload::to_text(&rsa.encrypt(&master_key[..])?);

            let mut editor = side_store.edit();
            editor.put_string(&master_key_entry, Some(wrapped.as_str()))?;
            if !editor.commit() {
                return Err(PrefsafeError::Storage(format!(
                    "cannot persist master key entry {}",
                    master_key_entry
                )));
            }
            tracing::info!(entry = %master_key_entry, "generated wrapped master key");
        }
        Ok(Self {
            rsa,
            side_store,
            master_key_entry,
        })
    }

    fn master_key(&self) -> Result<Zeroizing<Vec<u8>>> {
        let wrapped = self
            .side_store
            .get_string(&self.master_key_entry, None)
            .ok_or_else(|| {
                PrefsafeError::invalid_key(self.rsa.alias(), "wrapped master key is missing")
            })?;
        let key = Zeroizing::new(self.rsa.decrypt(&payload::from_text(&wrapped)?)?);
        if key.len() != MASTER_KEY_SIZE {
            return Err(PrefsafeError::invalid_key(
                self.rsa.alias(),
                format!("master key has {} bytes", key.len()),
            ));
        }
        Ok(key)
    }
}

impl Securable for HybridRsaAesSecurable {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let key = self.master_key()?;
        let cipher = Aes128EcbEnc::new_from_slice(&key)
            .map_err(|e| PrefsafeError::invalid_key(self.rsa.alias(), e.to_string()))?;
        Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
    }

    fn decrypt(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let key = self.master_key()?;
        let cipher = Aes128EcbDec::new_from_slice(&key)
            .map_err(|e| PrefsafeError::invalid_key(self.rsa.alias(), e.to_string()))?;
        cipher
            .decrypt_padded_vec_mut::<Pkcs7>(payload)
            .map_err(|_| PrefsafeError::Cipher("invalid PKCS#7 padding".to_string()))
    }
}
