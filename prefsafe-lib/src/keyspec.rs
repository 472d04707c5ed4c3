//! Key-generation parameter builder.
//!
//! Two generations of key-store APIs take different parameter shapes: the
//! legacy key-pair generator wants a self-signed certificate description
//! bound to a host context, the modern generator wants purposes, block modes,
//! digests and paddings on top of the certificate fields. [`KeySpecBuilder`]
//! is the only place either shape is assembled.

use std::ops::BitOr;

use chrono::{DateTime, Utc};

use crate::clock::{add_years, Clock};
use crate::{PrefsafeError, Result};

/// Operations a generated key may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyPurposes(u8);

impl KeyPurposes {
    /// Encryption.
    pub const ENCRYPT: Self = Self(1);
    /// Decryption.
    pub const DECRYPT: Self = Self(1 << 1);

    /// Returns true if every purpose in `other` is allowed.
    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for KeyPurposes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Block cipher mode a key is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockMode {
    /// Galois/Counter Mode.
    Gcm,
}

/// Digest a key may be combined with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Digest {
    /// SHA-256.
    Sha256,
    /// SHA-512.
    Sha512,
}

/// Padding scheme a key may be used with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncryptionPadding {
    /// No padding.
    None,
}

/// Parameters for generating a key pair through the legacy API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPairGeneratorSpec {
    /// Host context token the key pair is bound to.
    pub context: String,
    /// Alias the pair is stored under.
    pub alias: String,
    /// Subject of the self-signed certificate.
    pub subject: String,
    /// Serial number of the self-signed certificate.
    pub serial_number: u64,
    /// Start of validity.
    pub start_date: DateTime<Utc>,
    /// End of validity.
    pub end_date: DateTime<Utc>,
    /// Modulus size in bits.
    pub key_size: usize,
}

/// Parameters for generating a key through the modern API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyGenParameterSpec {
    /// Alias the key is stored under.
    pub alias: String,
    /// Allowed operations.
    pub purposes: KeyPurposes,
    /// Certificate subject.
    pub certificate_subject: String,
    /// Certificate serial number.
    pub certificate_serial_number: u64,
    /// Start of validity.
    pub certificate_not_before: DateTime<Utc>,
    /// End of validity.
    pub certificate_not_after: DateTime<Utc>,
    /// Allowed block modes.
    pub block_modes: Vec<BlockMode>,
    /// Allowed digests.
    pub digests: Vec<Digest>,
    /// Allowed paddings.
    pub encryption_paddings: Vec<EncryptionPadding>,
    /// Key size in bits.
    pub key_size: usize,
}

/// Certificate subject for an alias.
pub fn subject_for(alias: &str) -> String {
    format!("CN={}", alias)
}

/// Validity window starting now and lasting `years`.
pub fn validity_window(clock: &dyn Clock, years: u32) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let not_before = clock.now();
    let not_after = add_years(not_before, years).ok_or_else(|| {
        PrefsafeError::KeyStore(format!("validity of {} years is out of range", years))
    })?;
    Ok((not_before, not_after))
}

/// Builds key-generation parameters for both key-store generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySpecBuilder {
    aes_key_size: usize,
    rsa_key_size: usize,
}

impl Default for KeySpecBuilder {
    fn default() -> Self {
        Self {
            aes_key_size: 256,
            rsa_key_size: 2048,
        }
    }
}

impl KeySpecBuilder {
    /// Builder with 256-bit AES keys and 2048-bit RSA pairs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different RSA modulus size.
    pub fn with_rsa_key_size(mut self, bits: usize) -> Self {
        self.rsa_key_size = bits;
        self
    }

    /// Legacy key-pair parameters.
    pub fn key_pair_spec(
        &self,
        context: &str,
        alias: &str,
        serial_number: u64,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> KeyPairGeneratorSpec {
        KeyPairGeneratorSpec {
            context: context.to_string(),
            alias: alias.to_string(),
            subject: subject_for(alias),
            serial_number,
            start_date,
            end_date,
            key_size: self.rsa_key_size,
        }
    }

    /// Modern symmetric-key parameters: encrypt and decrypt, GCM only,
    /// SHA-256/SHA-512 digests, no padding.
    pub fn key_gen_spec(
        &self,
        alias: &str,
        serial_number: u64,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> KeyGenParameterSpec {
        KeyGenParameterSpec {
            alias: alias.to_string(),
            purposes: KeyPurposes::ENCRYPT | KeyPurposes::DECRYPT,
            certificate_subject: subject_for(alias),
            certificate_serial_number: serial_number,
            certificate_not_before: start_date,
            certificate_not_after: end_date,
            block_modes: vec![BlockMode::Gcm],
            digests: vec![Digest::Sha256, Digest::Sha512],
            encryption_paddings: vec![EncryptionPadding::None],
            key_size: self.aes_key_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;

    fn dates() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            Utc.with_ymd_and_hms(2019, 1, 10, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2059, 1, 10, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_key_pair_spec() {
        let (start, end) = dates();
        let spec = KeySpecBuilder::new().key_pair_spec("com.example.app", "alias", 1, start, end);

        assert_eq!(spec.context, "com.example.app");
        assert_eq!(spec.alias, "alias");
        assert_eq!(spec.subject, "CN=alias");
        assert_eq!(spec.serial_number, 1);
        assert_eq!(spec.start_date, start);
        assert_eq!(spec.end_date, end);
        assert_eq!(spec.key_size, 2048);
    }

    #[test]
    fn test_key_gen_spec() {
        let (start, end) = dates();
        let spec = KeySpecBuilder::new().key_gen_spec("alias", 1, start, end);

        assert!(spec.purposes.contains(KeyPurposes::ENCRYPT));
        assert!(spec.purposes.contains(KeyPurposes::DECRYPT));
        assert_eq!(spec.certificate_subject, "CN=alias");
        assert_eq!(spec.certificate_serial_number, 1);
        assert_eq!(spec.certificate_not_before, start);
        assert_eq!(spec.certificate_not_after, end);
        assert_eq!(spec.block_modes, vec![BlockMode::Gcm]);
        assert_eq!(spec.digests, vec![Digest::Sha256, Digest::Sha512]);
        assert_eq!(spec.encryption_paddings, vec![EncryptionPadding::None]);
        assert_eq!(spec.key_size, 256);
    }

    #[test]
    fn test_purposes() {
        let encrypt_only = KeyPurposes::ENCRYPT;
        assert!(!encrypt_only.contains(KeyPurposes::DECRYPT));
        assert!(!encrypt_only.contains(KeyPurposes::ENCRYPT | KeyPurposes::DECRYPT));
    }

    #[test]
    fn test_validity_window() {
        let (start, end) = dates();
        let window = validity_window(&FixedClock(start), 40).unwrap();
        assert_eq!(window, (start, end));
    }

    #[test]
    fn test_rsa_key_size_override() {
        let (start, end) = dates();
        let spec = KeySpecBuilder::new()
            .with_rsa_key_size(1024)
            .key_pair_spec("ctx", "alias", 1, start, end);
        assert_eq!(spec.key_size, 1024);
    }
}
