//! Recording change listener.

use std::sync::Mutex;

use crate::prefs::{ChangeListener, Preferences};

/// Records the key of every notification it receives.
#[derive(Debug, Default)]
pub struct RecordingListener {
    keys: Mutex<Vec<String>>,
}

impl RecordingListener {
    /// Create a listener with no recorded notifications.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys received so far, in order.
    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().map(|k| k.clone()).unwrap_or_default()
    }

    /// Number of notifications received.
    pub fn count(&self) -> usize {
        self.keys.lock().map(|k| k.len()).unwrap_or(0)
    }
}

impl ChangeListener for RecordingListener {
    fn on_preference_changed(&self, _prefs: &dyn Preferences, key: &str) {
        if let Ok(mut keys) = self.keys.lock() {
            keys.push(key.to_string());
        }
    }
}
