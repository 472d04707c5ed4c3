//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use prefsafe_lib::prelude::*;
//! ```

// Entry points
pub use crate::{open, open_with_config};

// Stores
pub use crate::prefs::{
    ChangeListener, FileStore, MemoryStore, Preferences, PreferencesEditor,
};
pub use crate::store::{Editor, SecureStore};
pub use crate::value::Value;

// Configuration and host
pub use crate::config::{SecurityConfig, ValueEncoding};
pub use crate::host::{HostContext, SoftwareHost};

// Backends
pub use crate::securable::{Backend, BackendKind, Securable};

// Error handling
pub use crate::errors::{PrefsafeError, PrefsafeErrorCode};
pub use crate::Result;
