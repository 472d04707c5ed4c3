//! In-memory software key store.
//!
//! Stands in for a hardware-backed platform key store in tests and on hosts
//! without one. Entries live only as long as the process.
//!
//! # Thread Safety
//!
//! Entries sit behind an `RwLock`. Lock poisoning is reported as an error
//! rather than a panic. Key material is generated outside the lock and
//! inserted only if the alias is still free.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use rand::rngs::OsRng;
use rand::RngCore;
use rsa::RsaPrivateKey;

use super::traits::{Certificate, KeyAlgorithm, KeyEntry, KeyStore, PrivateKeyEntry, SecretKey};
use crate::keyspec::{KeyGenParameterSpec, KeyPairGeneratorSpec};
use crate::{PrefsafeError, Result};

const AES_KEY_SIZES: [usize; 3] = [128, 192, 256];

/// In-memory implementation of [`KeyStore`].
pub struct SoftwareKeyStore {
    entries: RwLock<HashMap<String, Arc<KeyEntry>>>,
}

fn lock_error(context: &str) -> PrefsafeError {
    PrefsafeError::KeyStore(format!(
        "SoftwareKeyStore: lock poisoned during {}",
        context
    ))
}

impl SoftwareKeyStore {
    /// Create an empty key store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of entries.
    ///
    /// Returns 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Check if the key store is empty.
    ///
    /// Returns true if the lock is poisoned.
    pub fn is_empty(&self) -> bool {
        self.entries.read().map(|e| e.is_empty()).unwrap_or(true)
    }

    fn insert_if_absent(&self, alias: &str, entry: KeyEntry, context: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| lock_error(context))?;
        if entries.contains_key(alias) {
            tracing::debug!(alias, "key already generated by a concurrent caller");
            return Ok(());
        }
        entries.insert(alias.to_string(), Arc::new(entry));
        tracing::info!(alias, "generated {}", context);
        Ok(())
    }
}

impl Default for SoftwareKeyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyStore for SoftwareKeyStore {
    fn contains_alias(&self, alias: &str) -> Result<bool> {
        let entries = self.entries.read().map_err(|_| lock_error("contains_alias"))?;
        Ok(entries.contains_key(alias))
    }

    fn entry(&self, alias: &str) -> Result<Option<Arc<KeyEntry>>> {
        let entries = self.entries.read().map_err(|_| lock_error("entry"))?;
        Ok(entries.get(alias).cloned())
    }

    fn generate_secret_key(&self, spec: &KeyGenParameterSpec) -> Result<()> {
        if !AES_KEY_SIZES.contains(&spec.key_size) {
            return Err(PrefsafeError::KeyStore(format!(
                "unsupported AES key size {}",
                spec.key_size
            )));
        }
        if spec.certificate_not_after <= spec.certificate_not_before {
            return Err(PrefsafeError::KeyStore(
                "validity window ends before it starts".to_string(),
            ));
        }
        if self.contains_alias(&spec.alias)? {
            return Ok(());
        }

        let mut material = vec![0u8; spec.key_size / 8];
        OsRng.fill_bytes(&mut material);
        let key = SecretKey::new(KeyAlgorithm::Aes, spec.purposes, material);

        self.insert_if_absent(&spec.alias, KeyEntry::Secret(key), "secret key")
    }

    fn generate_key_pair(&self, spec: &KeyPairGeneratorSpec) -> Result<()> {
        if spec.end_date <= spec.start_date {
            return Err(PrefsafeError::KeyStore(
                "validity window ends before it starts".to_string(),
            ));
        }
        if self.contains_alias(&spec.alias)? {
            return Ok(());
        }

        let private_key = RsaPrivateKey::new(&mut OsRng, spec.key_size)
            .map_err(|e| PrefsafeError::KeyStore(format!("RSA key generation failed: {}", e)))?;
        let certificate = Certificate {
            subject: spec.subject.clone(),
            serial_number: spec.serial_number,
            not_before: spec.start_date,
            not_after: spec.end_date,
            public_key: private_key.to_public_key(),
        };
        let entry = PrivateKeyEntry::new(private_key, certificate);

        self.insert_if_absent(&spec.alias, KeyEntry::PrivateKey(entry), "key pair")
    }

    fn delete_entry(&self, alias: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| lock_error("delete_entry"))?;
        entries.remove(alias);
        Ok(())
    }

    fn aliases(&self) -> Result<Vec<String>> {
        let entries = self.entries.read().map_err(|_| lock_error("aliases"))?;
        Ok(entries.keys().cloned().collect())
    }
}
