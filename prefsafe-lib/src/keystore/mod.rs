//! Key-store abstraction.
//!
//! Keys never leave the key store as raw bytes through the public API:
//! callers name an alias, the backends in [`securable`](crate::securable)
//! resolve it to an entry and run the cipher.
//!
//! ## Usage
//!
//! ```rust
//! use prefsafe_lib::keyspec::KeySpecBuilder;
//! use prefsafe_lib::keystore::{KeyStore, SoftwareKeyStore};
//!
//! let store = SoftwareKeyStore::new();
//! let now = chrono::Utc::now();
//! let spec = KeySpecBuilder::new().key_gen_spec("alias", 1, now, now + chrono::Duration::days(1));
//! store.generate_secret_key(&spec)?;
//! assert!(store.contains_alias("alias")?);
//! # Ok::<(), prefsafe_lib::PrefsafeError>(())
//! ```
//!
//! ## Security Considerations
//!
//! - Symmetric key bytes are zeroized when the last handle drops
//! - `Debug` output never includes key material

mod memory;
mod traits;

pub use memory::SoftwareKeyStore;
pub use traits::{Certificate, KeyAlgorithm, KeyEntry, KeyStore, PrivateKeyEntry, SecretKey};
