//! Core traits for key-store backed key material.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rsa::{RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroizing;

use crate::keyspec::{KeyGenParameterSpec, KeyPairGeneratorSpec, KeyPurposes};
use crate::Result;

/// Algorithm of a secret key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    /// AES.
    Aes,
}

/// Symmetric key material held by a key store.
///
/// The raw bytes are only reachable from inside this crate and are zeroized
/// when the last handle is dropped.
#[derive(Clone)]
pub struct SecretKey {
    algorithm: KeyAlgorithm,
    purposes: KeyPurposes,
    material: Zeroizing<Vec<u8>>,
}

impl SecretKey {
    /// Wrap raw key material.
    pub fn new(algorithm: KeyAlgorithm, purposes: KeyPurposes, material: Vec<u8>) -> Self {
        Self {
            algorithm,
            purposes,
            material: Zeroizing::new(material),
        }
    }

    /// Key algorithm.
    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    /// Operations this key was generated for.
    pub fn purposes(&self) -> KeyPurposes {
        self.purposes
    }

    /// Key size in bits.
    pub fn size_bits(&self) -> usize {
        self.material.len() * 8
    }

    pub(crate) fn material(&self) -> &[u8] {
        &self.material
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("algorithm", &self.algorithm)
            .field("size_bits", &self.size_bits())
            .finish_non_exhaustive()
    }
}

/// Self-signed certificate describing a generated key pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Certificate {
    /// Subject, `CN=<alias>`.
    pub subject: String,
    /// Serial number.
    pub serial_number: u64,
    /// Start of validity.
    pub not_before: DateTime<Utc>,
    /// End of validity.
    pub not_after: DateTime<Utc>,
    /// Public half of the pair.
    pub public_key: RsaPublicKey,
}

/// RSA private key together with its certificate.
#[derive(Clone)]
pub struct PrivateKeyEntry {
    private_key: RsaPrivateKey,
    certificate: Certificate,
}

impl PrivateKeyEntry {
    /// Pair a private key with its certificate.
    pub fn new(private_key: RsaPrivateKey, certificate: Certificate) -> Self {
        Self {
            private_key,
            certificate,
        }
    }

    /// The certificate, including the public key.
    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    pub(crate) fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }
}

impl fmt::Debug for PrivateKeyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKeyEntry")
            .field("subject", &self.certificate.subject)
            .field("serial_number", &self.certificate.serial_number)
            .finish_non_exhaustive()
    }
}

/// An entry stored under one alias.
#[derive(Debug, Clone)]
pub enum KeyEntry {
    /// Symmetric key.
    Secret(SecretKey),
    /// Asymmetric key pair.
    PrivateKey(PrivateKeyEntry),
}

impl KeyEntry {
    /// Human-readable kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Secret(_) => "secret key",
            Self::PrivateKey(_) => "private key",
        }
    }
}

/// Platform key store.
///
/// Implementations must keep at most one entry per alias: both generate
/// methods are insert-if-absent, so concurrent first-use generation against
/// the same alias converges on a single entry.
pub trait KeyStore: Send + Sync {
    /// Check whether an entry exists under `alias`.
    fn contains_alias(&self, alias: &str) -> Result<bool>;

    /// Fetch the entry stored under `alias`.
    fn entry(&self, alias: &str) -> Result<Option<Arc<KeyEntry>>>;

    /// Generate a symmetric key under `spec.alias` unless one exists.
    fn generate_secret_key(&self, spec: &KeyGenParameterSpec) -> Result<()>;

    /// Generate a key pair under `spec.alias` unless one exists.
    fn generate_key_pair(&self, spec: &KeyPairGeneratorSpec) -> Result<()>;

    /// Remove the entry under `alias`. Missing aliases are not an error.
    fn delete_entry(&self, alias: &str) -> Result<()>;

    /// All aliases currently held.
    fn aliases(&self) -> Result<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_key_debug_hides_material() {
        let key = SecretKey::new(KeyAlgorithm::Aes, KeyPurposes::ENCRYPT, vec![0xAB; 16]);
        let debug = format!("{:?}", key);
        assert!(debug.contains("size_bits: 128"));
        assert!(!debug.contains("171"));
        assert_eq!(key.material().len(), 16);
    }

    #[test]
    fn test_entry_kind() {
        let key = SecretKey::new(KeyAlgorithm::Aes, KeyPurposes::DECRYPT, vec![1; 32]);
        assert_eq!(KeyEntry::Secret(key).kind(), "secret key");
    }
}
