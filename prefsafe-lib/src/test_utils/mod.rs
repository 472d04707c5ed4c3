//! Test utilities for prefsafe.
//!
//! Fixtures for unit and integration tests:
//! - Hosts and configurations with fast RSA key sizes
//! - Securables that pass data through or always fail
//! - A listener recording every change notification
//!
//! ## Usage
//!
//! ```rust,ignore
//! use prefsafe_lib::test_utils::{test_config, test_host, RecordingListener};
//!
//! let host = test_host();
//! let store = prefsafe_lib::open_with_config(&host, test_config())?;
//! let listener = std::sync::Arc::new(RecordingListener::new());
//! store.register_listener(listener.clone());
//! ```

mod fixtures;
mod listeners;
mod securables;

pub use fixtures::{legacy_test_host, sample_set, test_config, test_host, TEST_RSA_KEY_SIZE};
pub use listeners::RecordingListener;
pub use securables::{FailingSecurable, PlainSecurable};
