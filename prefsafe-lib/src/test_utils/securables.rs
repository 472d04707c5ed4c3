//! Securables for exercising the store without real keys.

use crate::securable::Securable;
use crate::{PrefsafeError, Result};

/// Returns its input unchanged in both directions.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainSecurable;

impl Securable for PlainSecurable {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        Ok(plaintext.to_vec())
    }

    fn decrypt(&self, payload: &[u8]) -> Result<Vec<u8>> {
        Ok(payload.to_vec())
    }
}

/// Fails every call: encryption with a cipher error, decryption with a
/// missing key.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingSecurable;

impl Securable for FailingSecurable {
    fn encrypt(&self, _plaintext: &[u8]) -> Result<Vec<u8>> {
        Err(PrefsafeError::Cipher("encryption disabled".to_string()))
    }

    fn decrypt(&self, _payload: &[u8]) -> Result<Vec<u8>> {
        Err(PrefsafeError::invalid_key("test", "no key"))
    }
}
