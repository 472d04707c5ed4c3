//! Encryption backends.
//!
//! A [`Securable`] turns plaintext bytes into an opaque payload and back.
//! Backends resolve their key by alias on every call and create it on first
//! construction if the key store does not hold it yet.
//!
//! | Backend | Key | Payload |
//! |---------|-----|---------|
//! | [`AesGcmSecurable`] | AES-256 in the key store | `[iv len][iv][ct+tag]` |
//! | [`HybridRsaAesSecurable`] | AES-128, RSA-wrapped in a side store | ECB blocks |
//! | [`RsaEcbSecurable`] | RSA pair in the key store | one RSA block |
//!
//! [`Backend::select`] picks between the first two once per store, from the
//! host's capability level. The RSA backend only wraps the hybrid master key.

mod aes_gcm;
mod hybrid;
mod rsa_ecb;

use crate::config::SecurityConfig;
use crate::host::HostContext;
use crate::Result;

pub use aes_gcm::{AesGcmSecurable, NONCE_SIZE, TAG_SIZE};
pub use hybrid::{HybridRsaAesSecurable, MASTER_KEY_SIZE};
pub use rsa_ecb::{RsaEcbSecurable, PKCS1_OVERHEAD};

/// Encrypt/decrypt capability over opaque byte buffers.
pub trait Securable: Send + Sync {
    /// Encrypt `plaintext` into a self-contained payload.
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Encrypt the UTF-8 bytes of `text`.
    fn encrypt_text(&self, text: &str) -> Result<Vec<u8>> {
        self.encrypt(text.as_bytes())
    }

    /// Recover the plaintext of a payload produced by [`Securable::encrypt`].
    fn decrypt(&self, payload: &[u8]) -> Result<Vec<u8>>;
}

/// Which backend a store runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// AES-256-GCM with a key-store resident key.
    AesGcm,
    /// RSA-wrapped AES-128/ECB.
    HybridRsaAes,
}

/// Backend chosen for one store.
pub enum Backend {
    /// Modern hosts.
    AesGcm(AesGcmSecurable),
    /// Hosts below the modern capability level.
    HybridRsaAes(HybridRsaAesSecurable),
}

impl Backend {
    /// Probe the host once and build the matching backend, creating key
    /// material on first use.
    pub fn select(host: &dyn HostContext, config: &SecurityConfig) -> Result<Self> {
        let level = host.capability_level();
        let clock = host.clock();
        if level >= config.modern_capability_level {
            tracing::debug!(level, "selected AES-GCM backend");
            let securable = AesGcmSecurable::new(host.key_store(), clock.as_ref(), config)?;
            return Ok(Self::AesGcm(securable));
        }

        tracing::debug!(level, "selected hybrid RSA/AES backend");
        let rsa =
            RsaEcbSecurable::new(host.key_store(), clock.as_ref(), host.identity(), config)?;
        let side_store = host.preferences(&config.side_store_name)?;
        let securable = HybridRsaAesSecurable::new(rsa, side_store, &config.master_key_entry)?;
        Ok(Self::HybridRsaAes(securable))
    }

    /// Kind of the selected backend.
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::AesGcm(_) => BackendKind::AesGcm,
            Self::HybridRsaAes(_) => BackendKind::HybridRsaAes,
        }
    }
}

impl Securable for Backend {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::AesGcm(inner) => inner.encrypt(plaintext),
            Self::HybridRsaAes(inner) => inner.encrypt(plaintext),
        }
    }

    fn decrypt(&self, payload: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::AesGcm(inner) => inner.decrypt(payload),
            Self::HybridRsaAes(inner) => inner.decrypt(payload),
        }
    }
}
