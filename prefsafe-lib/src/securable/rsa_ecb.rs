//! RSA with PKCS#1 v1.5 padding.
//!
//! Only wraps short secrets: plaintext is limited to the modulus size minus
//! 11 bytes and there is no chaining across blocks.

use std::sync::Arc;

use rand::rngs::OsRng;
use rsa::Pkcs1v15Encrypt;

use super::Securable;
use crate::clock::Clock;
use crate::config::SecurityConfig;
use crate::keyspec::{validity_window, KeySpecBuilder};
use crate::keystore::{KeyEntry, KeyStore, PrivateKeyEntry};
use crate::{PrefsafeError, Result};

/// PKCS#1 v1.5 padding overhead in bytes.
pub const PKCS1_OVERHEAD: usize = 11;

/// Encrypts with the public half of a key-store resident RSA pair.
pub struct RsaEcbSecurable {
    key_store: Arc<dyn KeyStore>,
    alias: String,
}

impl RsaEcbSecurable {
    /// Bind to `config.key_alias`, generating a key pair bound to `context`
    /// if the alias is free.
    pub fn new(
        key_store: Arc<dyn KeyStore>,
        clock: &dyn Clock,
        context: &str,
        config: &SecurityConfig,
    ) -> Result<Self> {
        let alias = config.key_alias.clone();
        if !key_store.contains_alias(&alias)? {
            let (start, end) = validity_window(clock, config.validity_years)?;
            let spec = KeySpecBuilder::new()
                .with_rsa_key_size(config.rsa_key_size)
                .key_pair_spec(context, &alias, config.serial_number, start, end);
            key_store.generate_key_pair(&spec)?;
        }
        Ok(Self { key_store, alias })
    }

    /// Key-store alias in use.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    fn with_entry<T>(&self, f: impl FnOnce(&PrivateKeyEntry) -> Result<T>) -> Result<T> {
        let entry = self
            .key_store
            .entry(&self.alias)?
            .ok_or_else(|| PrefsafeError::invalid_key(&self.alias, "no entry in key store"))?;
        match entry.as_ref() {
            KeyEntry::PrivateKey(pair) => f(pair),
            other => Err(PrefsafeError::invalid_key(
                &self.alias,
                format!("expected private key, found {}", other.kind()),
            )),
        }
    }
}

impl Securable for RsaEcbSecurable {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.with_entry(|pair| {
            pair.certificate()
                .public_key
                .encrypt(&mut OsRng, Pkcs1v15Encrypt, plaintext)
                .map_err(|e| PrefsafeError::Cipher(format!("RSA encryption failed: {}", e)))
        })
    }

    fn decrypt(&self, payload: &[u8]) -> Result<Vec<u8>> {
        self.with_entry(|pair| {
            pair.private_key()
                .decrypt(Pkcs1v15Encrypt, payload)
                .map_err(|e| PrefsafeError::Cipher(format!("RSA decryption failed: {}", e)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::keystore::SoftwareKeyStore;
    use rsa::traits::PublicKeyParts;

    fn config() -> SecurityConfig {
        SecurityConfig::default().with_rsa_key_size(1024)
    }

    #[test]
    fn test_round_trip_and_certificate() {
        let key_store = Arc::new(SoftwareKeyStore::new());
        let securable =
            RsaEcbSecurable::new(key_store.clone(), &SystemClock, "app", &config()).unwrap();

        let secret = [7u8; 16];
        let wrapped = securable.encrypt(&secret).unwrap();
        assert_eq!(wrapped.len(), 128);
        assert_eq!(securable.decrypt(&wrapped).unwrap(), secret);

        match key_store.entry("SecurityModuleAlias").unwrap().as_deref() {
            Some(KeyEntry::PrivateKey(pair)) => {
                assert_eq!(pair.certificate().subject, "CN=SecurityModuleAlias");
                assert_eq!(pair.certificate().public_key.size(), 128);
            }
            other => panic!("unexpected entry {:?}", other),
        }
    }

    #[test]
    fn test_plaintext_bounded_by_modulus() {
        let key_store = Arc::new(SoftwareKeyStore::new());
        let securable = RsaEcbSecurable::new(key_store, &SystemClock, "app", &config()).unwrap();

        assert!(securable.encrypt(&[0u8; 128 - PKCS1_OVERHEAD]).is_ok());
        let err = securable.encrypt(&[0u8; 128 - PKCS1_OVERHEAD + 1]).unwrap_err();
        assert!(matches!(err, PrefsafeError::Cipher(_)));
    }

    #[test]
    fn test_wrong_entry_type_is_invalid_key() {
        let key_store = Arc::new(SoftwareKeyStore::new());
        let now = chrono::Utc::now();
        let spec = KeySpecBuilder::new().key_gen_spec(
            "SecurityModuleAlias",
            1,
            now,
            now + chrono::Duration::days(1),
        );
        key_store.generate_secret_key(&spec).unwrap();

        let securable = RsaEcbSecurable::new(key_store, &SystemClock, "app", &config()).unwrap();
        let err = securable.encrypt(b"x").unwrap_err();
        assert!(matches!(err, PrefsafeError::InvalidKey { .. }));
    }
}
