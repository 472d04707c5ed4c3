//! Host capabilities injected at store construction.
//!
//! A [`HostContext`] supplies everything platform specific: the capability
//! level used for backend selection, an identity token for legacy key-pair
//! generation, the key store, named plain preference stores and the clock.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::clock::{Clock, SystemClock};
use crate::keystore::{KeyStore, SoftwareKeyStore};
use crate::prefs::{FileStore, MemoryStore, Preferences};
use crate::{PrefsafeError, Result};

/// Platform capabilities consumed by [`open`](crate::open).
pub trait HostContext: Send + Sync {
    /// Host capability level compared against
    /// [`SecurityConfig::modern_capability_level`](crate::SecurityConfig::modern_capability_level).
    fn capability_level(&self) -> u32;

    /// Token identifying the host application to the legacy key-pair API.
    fn identity(&self) -> &str;

    /// The key store.
    fn key_store(&self) -> Arc<dyn KeyStore>;

    /// Plain preference store named `name`. Repeated calls with one name
    /// return the same store.
    fn preferences(&self, name: &str) -> Result<Arc<dyn Preferences>>;

    /// Time source for key validity windows.
    fn clock(&self) -> Arc<dyn Clock> {
        Arc::new(SystemClock)
    }
}

/// Host backed by [`SoftwareKeyStore`] and in-memory or JSON-file stores.
pub struct SoftwareHost {
    capability_level: u32,
    identity: String,
    key_store: Arc<dyn KeyStore>,
    clock: Arc<dyn Clock>,
    root: Option<PathBuf>,
    stores: RwLock<HashMap<String, Arc<dyn Preferences>>>,
}

fn lock_error(context: &str) -> PrefsafeError {
    PrefsafeError::Storage(format!("SoftwareHost: lock poisoned during {}", context))
}

fn check_store_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(PrefsafeError::Config(format!(
            "invalid preference store name {:?}",
            name
        )));
    }
    Ok(())
}

impl SoftwareHost {
    /// Host keeping every store in memory.
    pub fn new(capability_level: u32) -> Self {
        Self {
            capability_level,
            identity: "prefsafe".to_string(),
            key_store: Arc::new(SoftwareKeyStore::new()),
            clock: Arc::new(SystemClock),
            root: None,
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// Host persisting each store as `<dir>/<name>.json`.
    pub fn in_directory(dir: impl Into<PathBuf>, capability_level: u32) -> Self {
        Self {
            root: Some(dir.into()),
            ..Self::new(capability_level)
        }
    }

    /// Set the identity token.
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    /// Use a different key store.
    pub fn with_key_store(mut self, key_store: Arc<dyn KeyStore>) -> Self {
        self.key_store = key_store;
        self
    }

    /// Use a different clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn create_store(&self, name: &str) -> Result<Arc<dyn Preferences>> {
        match &self.root {
            Some(root) => Ok(Arc::new(FileStore::open(root.join(format!("{}.json", name)))?)),
            None => Ok(Arc::new(MemoryStore::new())),
        }
    }
}

impl HostContext for SoftwareHost {
    fn capability_level(&self) -> u32 {
        self.capability_level
    }

    fn identity(&self) -> &str {
        &self.identity
    }

    fn key_store(&self) -> Arc<dyn KeyStore> {
        Arc::clone(&self.key_store)
    }

    fn preferences(&self, name: &str) -> Result<Arc<dyn Preferences>> {
        check_store_name(name)?;
        {
            let stores = self.stores.read().map_err(|_| lock_error("preferences"))?;
            if let Some(store) = stores.get(name) {
                return Ok(Arc::clone(store));
            }
        }

        let mut stores = self.stores.write().map_err(|_| lock_error("preferences"))?;
        if let Some(store) = stores.get(name) {
            return Ok(Arc::clone(store));
        }
        let store = self.create_store(name)?;
        stores.insert(name.to_string(), Arc::clone(&store));
        Ok(store)
    }

    fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferences_are_cached_per_name() {
        let host = SoftwareHost::new(23);
        let a = host.preferences("a").unwrap();
        let again = host.preferences("a").unwrap();
        let b = host.preferences("b").unwrap();

        assert!(Arc::ptr_eq(&a, &again));
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_rejects_path_like_names() {
        let host = SoftwareHost::new(23);
        assert!(host.preferences("").is_err());
        assert!(host.preferences("../escape").is_err());
    }

    #[test]
    fn test_directory_host_creates_json_files() {
        let dir = tempfile::tempdir().unwrap();
        let host = SoftwareHost::in_directory(dir.path(), 23).with_identity("com.example");
        assert_eq!(host.identity(), "com.example");

        let prefs = host.preferences("settings").unwrap();
        let mut editor = prefs.edit();
        editor.put_int("n", 1).unwrap();
        assert!(editor.commit());

        assert!(dir.path().join("settings.json").exists());
    }
}
