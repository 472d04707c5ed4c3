//! Error types for prefsafe operations.
//!
//! Read-path failures are recovered inside [`SecureStore`](crate::SecureStore)
//! and never reach callers; everything else propagates through
//! [`PrefsafeError`].

use thiserror::Error;

/// Error codes for FFI and host integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum PrefsafeErrorCode {
    /// Key-store entry missing, of the wrong kind, or rejected by the cipher
    InvalidKey = 1000,
    /// Key store could not generate or look up an entry
    KeyStore = 1001,
    /// Payload shorter than its declared framing
    MalformedPayload = 2000,
    /// Cipher failed (authentication tag, padding)
    Cipher = 2001,
    /// Base64 or UTF-8 conversion failed
    Encoding = 3000,
    /// Stored text does not parse as the requested type
    ParseFailure = 3001,
    /// Underlying preference store failed
    Storage = 4000,
    /// Invalid configuration
    Config = 5000,
    /// Internal/unexpected error
    Internal = 9999,
}

/// Error type for prefsafe operations.
#[derive(Debug, Error)]
pub enum PrefsafeError {
    /// The key-store entry behind `alias` cannot be used.
    #[error("invalid key for alias {alias}: {reason}")]
    InvalidKey {
        /// Key alias that failed to resolve
        alias: String,
        /// Why the key was rejected
        reason: String,
    },

    /// Key generation or lookup failed inside the key store.
    #[error("key store error: {0}")]
    KeyStore(String),

    /// The payload is shorter than the framing it declares.
    #[error("malformed payload: need {needed} bytes, have {actual}")]
    MalformedPayload {
        /// Bytes required by the declared framing
        needed: usize,
        /// Bytes actually present
        actual: usize,
    },

    /// The cipher rejected the data.
    #[error("cipher error: {0}")]
    Cipher(String),

    /// Text/bytes conversion failed.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Stored text does not parse as the requested type.
    #[error("cannot parse {value_type} from stored value")]
    ParseFailure {
        /// Requested type
        value_type: &'static str,
    },

    /// Underlying preference store failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Internal/unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PrefsafeError {
    /// Get the error code for FFI/host integration.
    pub fn code(&self) -> PrefsafeErrorCode {
        match self {
            Self::InvalidKey { .. } => PrefsafeErrorCode::InvalidKey,
            Self::KeyStore(_) => PrefsafeErrorCode::KeyStore,
            Self::MalformedPayload { .. } => PrefsafeErrorCode::MalformedPayload,
            Self::Cipher(_) => PrefsafeErrorCode::Cipher,
            Self::Encoding(_) => PrefsafeErrorCode::Encoding,
            Self::ParseFailure { .. } => PrefsafeErrorCode::ParseFailure,
            Self::Storage(_) => PrefsafeErrorCode::Storage,
            Self::Config(_) => PrefsafeErrorCode::Config,
            Self::Internal(_) => PrefsafeErrorCode::Internal,
        }
    }

    /// Returns true if a read hitting this error should fall back to the
    /// caller's default instead of surfacing it.
    pub fn is_recoverable_on_read(&self) -> bool {
        matches!(
            self,
            Self::InvalidKey { .. }
                | Self::MalformedPayload { .. }
                | Self::Cipher(_)
                | Self::Encoding(_)
                | Self::ParseFailure { .. }
        )
    }

    /// Create an invalid key error.
    pub fn invalid_key(alias: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            alias: alias.into(),
            reason: reason.into(),
        }
    }

    /// Create a malformed payload error.
    pub fn malformed(needed: usize, actual: usize) -> Self {
        Self::MalformedPayload { needed, actual }
    }

    /// Create a parse failure for the named type.
    pub fn parse_failure(value_type: &'static str) -> Self {
        Self::ParseFailure { value_type }
    }
}

impl From<base64::DecodeError> for PrefsafeError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Encoding(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for PrefsafeError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::Encoding(err.to_string())
    }
}

impl From<serde_json::Error> for PrefsafeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<std::io::Error> for PrefsafeError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = PrefsafeError::invalid_key("alias", "missing");
        assert_eq!(err.code(), PrefsafeErrorCode::InvalidKey);
        assert!(err.is_recoverable_on_read());

        let err = PrefsafeError::Storage("disk full".into());
        assert_eq!(err.code(), PrefsafeErrorCode::Storage);
        assert!(!err.is_recoverable_on_read());
    }

    #[test]
    fn test_error_display() {
        let err = PrefsafeError::malformed(17, 3);
        assert_eq!(err.to_string(), "malformed payload: need 17 bytes, have 3");

        let err = PrefsafeError::invalid_key("SecurityModuleAlias", "no entry");
        assert!(err.to_string().contains("SecurityModuleAlias"));
    }

    #[test]
    fn test_conversions() {
        let utf8 = String::from_utf8(vec![0xff, 0xfe]).unwrap_err();
        let err: PrefsafeError = utf8.into();
        assert_eq!(err.code(), PrefsafeErrorCode::Encoding);

        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err: PrefsafeError = io.into();
        assert_eq!(err.code(), PrefsafeErrorCode::Storage);
    }
}
