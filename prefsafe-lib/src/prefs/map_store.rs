//! Map-backed preference stores.
//!
//! [`MapStore`] keeps every entry in memory and hands a snapshot to its
//! [`Persistence`] on each flush. The in-memory map is only replaced once
//! persistence succeeds, so a failed flush leaves readers on the old state.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock};

use super::{ChangeListener, ListenerRegistry, Preferences, PreferencesEditor};
use crate::value::Value;
use crate::{PrefsafeError, Result};

/// Where a [`MapStore`] writes its entries on flush.
pub trait Persistence: Send + Sync {
    /// Persist the full entry map.
    fn save(&self, entries: &BTreeMap<String, Value>) -> Result<()>;
}

/// Keeps entries in memory only.
#[derive(Debug, Clone, Copy, Default)]
pub struct Volatile;

impl Persistence for Volatile {
    fn save(&self, _entries: &BTreeMap<String, Value>) -> Result<()> {
        Ok(())
    }
}

/// Store living only in memory.
pub type MemoryStore = MapStore<Volatile>;

fn lock_error(context: &str) -> PrefsafeError {
    PrefsafeError::Storage(format!("MapStore: lock poisoned during {}", context))
}

/// In-memory entry map with pluggable persistence.
pub struct MapStore<P> {
    entries: RwLock<BTreeMap<String, Value>>,
    listeners: ListenerRegistry,
    persistence: P,
}

impl MapStore<Volatile> {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::with_entries(Volatile, BTreeMap::new())
    }
}

impl Default for MapStore<Volatile> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Persistence> MapStore<P> {
    /// Create a store starting from `entries`.
    pub fn with_entries(persistence: P, entries: BTreeMap<String, Value>) -> Self {
        Self {
            entries: RwLock::new(entries),
            listeners: ListenerRegistry::new(),
            persistence,
        }
    }

    /// Start a write transaction with a concrete editor type.
    pub fn editor(&self) -> MapEditor<'_, P> {
        MapEditor {
            store: self,
            clear: false,
            changes: Vec::new(),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn value(&self, key: &str) -> Option<Value> {
        self.entries.read().ok()?.get(key).cloned()
    }

    /// Apply a batch and return the keys whose value actually changed.
    fn write(&self, clear: bool, changes: &[(String, Option<Value>)]) -> Result<Vec<String>> {
        let mut entries = self.entries.write().map_err(|_| lock_error("write"))?;

        let mut next = if clear {
            BTreeMap::new()
        } else {
            entries.clone()
        };
        let mut touched: Vec<&str> = Vec::new();
        for (key, value) in changes {
            match value {
                Some(value) => {
                    next.insert(key.clone(), value.clone());
                }
                None => {
                    next.remove(key);
                }
            }
            if !touched.contains(&key.as_str()) {
                touched.push(key);
            }
        }

        if next == *entries {
            return Ok(Vec::new());
        }
        self.persistence.save(&next)?;

        let changed = touched
            .into_iter()
            .filter(|key| entries.get(*key) != next.get(*key))
            .map(str::to_string)
            .collect();
        *entries = next;
        Ok(changed)
    }
}

impl<P: Persistence> Preferences for MapStore<P> {
    fn get_string(&self, key: &str, default: Option<&str>) -> Option<String> {
        match self.value(key) {
            Some(Value::Text(text)) => Some(text),
            _ => default.map(str::to_string),
        }
    }

    fn get_int(&self, key: &str, default: i32) -> i32 {
        self.value(key).and_then(|v| v.as_int()).unwrap_or(default)
    }

    fn get_long(&self, key: &str, default: i64) -> i64 {
        self.value(key).and_then(|v| v.as_long()).unwrap_or(default)
    }

    fn get_float(&self, key: &str, default: f32) -> f32 {
        self.value(key).and_then(|v| v.as_float()).unwrap_or(default)
    }

    fn get_boolean(&self, key: &str, default: bool) -> bool {
        self.value(key).and_then(|v| v.as_bool()).unwrap_or(default)
    }

    fn get_string_set(
        &self,
        key: &str,
        default: Option<BTreeSet<String>>,
    ) -> Option<BTreeSet<String>> {
        match self.value(key) {
            Some(Value::StringSet(set)) => Some(set),
            _ => default,
        }
    }

    fn get_all(&self) -> BTreeMap<String, Value> {
        self.entries.read().map(|e| e.clone()).unwrap_or_default()
    }

    fn contains(&self, key: &str) -> bool {
        self.entries
            .read()
            .map(|e| e.contains_key(key))
            .unwrap_or(false)
    }

    fn edit(&self) -> Box<dyn PreferencesEditor + '_> {
        Box::new(self.editor())
    }

    fn register_listener(&self, listener: Arc<dyn ChangeListener>) {
        self.listeners.register(listener);
    }

    fn unregister_listener(&self, listener: &Arc<dyn ChangeListener>) {
        self.listeners.unregister(listener);
    }
}

/// Staged writes against a [`MapStore`].
///
/// `clear` runs before the puts of the same batch; among puts, the last
/// write per key wins.
pub struct MapEditor<'a, P> {
    store: &'a MapStore<P>,
    clear: bool,
    changes: Vec<(String, Option<Value>)>,
}

impl<P: Persistence> MapEditor<'_, P> {
    fn flush(&mut self) -> Result<()> {
        let clear = std::mem::take(&mut self.clear);
        let changes = std::mem::take(&mut self.changes);
        let changed = self.store.write(clear, &changes)?;
        self.store.listeners.notify(self.store, &changed);
        Ok(())
    }
}

impl<P: Persistence> PreferencesEditor for MapEditor<'_, P> {
    fn put_value(&mut self, key: &str, value: Option<Value>) -> Result<()> {
        self.changes.push((key.to_string(), value));
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.changes.push((key.to_string(), None));
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.clear = true;
        Ok(())
    }

    fn commit(&mut self) -> bool {
        match self.flush() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "commit failed");
                false
            }
        }
    }

    fn apply(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!(error = %e, "apply failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RecordingListener;

    struct BrokenDisk;

    impl Persistence for BrokenDisk {
        fn save(&self, _entries: &BTreeMap<String, Value>) -> Result<()> {
            Err(PrefsafeError::Storage("disk unavailable".to_string()))
        }
    }

    #[test]
    fn test_put_and_get() {
        let store = MemoryStore::new();
        let mut editor = store.edit();
        editor.put_string("name", Some("alice")).unwrap();
        editor.put_int("age", 30).unwrap();
        editor.put_boolean("admin", true).unwrap();

        assert!(!store.contains("name"));
        assert!(editor.commit());

        assert_eq!(store.get_string("name", None).as_deref(), Some("alice"));
        assert_eq!(store.get_int("age", 0), 30);
        assert_eq!(store.get_long("age", 0), 30);
        assert!(store.get_boolean("admin", false));
        assert_eq!(store.get_int("name", -1), -1);
        assert_eq!(store.get_string("age", Some("none")).as_deref(), Some("none"));
    }

    #[test]
    fn test_clear_runs_before_puts() {
        let store = MemoryStore::new();
        let mut editor = store.edit();
        editor.put_string("old", Some("x")).unwrap();
        editor.commit();

        let mut editor = store.edit();
        editor.put_string("new", Some("y")).unwrap();
        editor.clear().unwrap();
        editor.commit();

        assert!(!store.contains("old"));
        assert_eq!(store.get_string("new", None).as_deref(), Some("y"));
    }

    #[test]
    fn test_last_write_wins_and_none_removes() {
        let store = MemoryStore::new();
        let mut editor = store.edit();
        editor.put_int("n", 1).unwrap();
        editor.put_int("n", 2).unwrap();
        editor.put_string("gone", Some("x")).unwrap();
        editor.put_string("gone", None).unwrap();
        editor.apply();

        assert_eq!(store.get_int("n", 0), 2);
        assert!(!store.contains("gone"));
    }

    #[test]
    fn test_listeners_see_changed_keys_only() {
        let store = MemoryStore::new();
        let listener = Arc::new(RecordingListener::new());
        store.register_listener(listener.clone());

        let mut editor = store.edit();
        editor.put_int("a", 1).unwrap();
        editor.put_int("b", 2).unwrap();
        editor.commit();
        assert_eq!(listener.keys(), vec!["a", "b"]);

        let mut editor = store.edit();
        editor.put_int("a", 1).unwrap();
        editor.remove("missing").unwrap();
        editor.commit();
        assert_eq!(listener.count(), 2);
    }

    #[test]
    fn test_failed_persistence_keeps_old_state() {
        let store = MapStore::with_entries(BrokenDisk, BTreeMap::new());
        let mut editor = store.edit();
        editor.put_int("a", 1).unwrap();

        assert!(!editor.commit());
        assert!(store.is_empty());
    }
}
