//! Prefsafe library.
//!
//! An encrypted layer in front of a plain string-keyed preference store.
//! Every value is encoded to text, encrypted and stored as base64; keys stay
//! in plaintext. The encrypted store implements the same [`Preferences`]
//! contract as the store it wraps.
//!
//! # Features
//!
//! - **Backends**: AES-256-GCM with a key-store resident key, or an
//!   RSA-wrapped AES-128 fallback for hosts below the modern capability level
//! - **Typed values**: ints, longs, floats, booleans and string sets survive a
//!   text-only store
//! - **Transactions**: batched, encrypted writes with change notification
//! - **Total reads**: every read failure degrades to the caller's default
//!
//! # Example
//!
//! ```
//! use prefsafe_lib::{open, Preferences, SoftwareHost};
//!
//! let host = SoftwareHost::new(30);
//! let store = open(&host, "settings")?;
//!
//! let mut editor = store.edit();
//! editor.put_string("token", Some("s3cr3t"))?;
//! editor.put_int("launches", 3)?;
//! editor.apply();
//!
//! assert_eq!(store.get_string("token", None).as_deref(), Some("s3cr3t"));
//! assert_eq!(store.get_int("launches", 0), 3);
//! assert_eq!(store.get_int("missing", -1), -1);
//! # Ok::<(), prefsafe_lib::PrefsafeError>(())
//! ```

pub mod clock;
pub mod codec;
pub mod config;
pub mod errors;
pub mod host;
pub mod keyspec;
pub mod keystore;
pub mod payload;
pub mod prefs;
pub mod prelude;
pub mod securable;
pub mod store;
pub mod value;

/// Test utilities.
///
/// This module is only available with the `test-utils` feature or in test builds.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use codec::ValueCodec;
pub use config::{SecurityConfig, ValueEncoding};
pub use errors::{PrefsafeError, PrefsafeErrorCode};
pub use host::{HostContext, SoftwareHost};
pub use prefs::{ChangeListener, Preferences, PreferencesEditor};
pub use securable::{Backend, BackendKind, Securable};
pub use store::{Editor, SecureStore};
pub use value::Value;

/// Common result alias for prefsafe operations.
pub type Result<T> = std::result::Result<T, PrefsafeError>;

/// Open the encrypted store named `store_name` with default settings.
///
/// Creates the backing key on first use. Fails if key material cannot be
/// created or the plain store cannot be opened.
pub fn open(host: &dyn HostContext, store_name: &str) -> Result<SecureStore> {
    open_with_config(host, SecurityConfig::new(store_name))
}

/// Open an encrypted store described by `config`.
///
/// The backend is selected once, here, from the host's capability level.
#[tracing::instrument(skip(host, config), fields(store = %config.store_name))]
pub fn open_with_config(host: &dyn HostContext, config: SecurityConfig) -> Result<SecureStore> {
    config.validate()?;
    let backend = Backend::select(host, &config)?;
    let delegate = host.preferences(&config.store_name)?;
    tracing::debug!(backend = ?backend.kind(), "opened secure store");
    Ok(SecureStore::with_backend(
        delegate,
        backend,
        ValueCodec::new(config.value_encoding),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{legacy_test_host, test_config, test_host};

    #[test]
    fn test_open_selects_backend_from_host() {
        let store = open_with_config(&test_host(), test_config()).unwrap();
        assert_eq!(store.backend_kind(), Some(BackendKind::AesGcm));

        let store = open_with_config(&legacy_test_host(), test_config()).unwrap();
        assert_eq!(store.backend_kind(), Some(BackendKind::HybridRsaAes));
    }

    #[test]
    fn test_open_rejects_invalid_config() {
        let config = test_config().with_validity_years(0);
        let err = open_with_config(&test_host(), config).err().unwrap();
        assert_eq!(err.code(), PrefsafeErrorCode::Config);
    }

    #[test]
    fn test_stores_share_one_key() {
        let host = test_host();
        let first = open(&host, "first").unwrap();
        let second = open(&host, "second").unwrap();

        let mut editor = first.edit();
        editor.put_string("k", Some("v")).unwrap();
        editor.apply();

        let raw = first.delegate().get_string("k", None).unwrap();
        let mut editor = second.delegate().edit();
        editor.put_string("k", Some(raw.as_str())).unwrap();
        editor.apply();

        assert_eq!(second.get_string("k", None).as_deref(), Some("v"));
        assert_eq!(host.key_store().aliases().unwrap().len(), 1);
    }
}
