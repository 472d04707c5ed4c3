//! Preference store contract.
//!
//! [`Preferences`] is the string-keyed store every layer speaks: the plain
//! stores in this module implement it, and so does
//! [`SecureStore`](crate::SecureStore), which wraps another implementation
//! and can be dropped in wherever a plain store was used.
//!
//! Writes go through a [`PreferencesEditor`] obtained from
//! [`Preferences::edit`]. Nothing is visible to readers until
//! [`commit`](PreferencesEditor::commit) or
//! [`apply`](PreferencesEditor::apply) runs.

mod file;
mod listeners;
mod map_store;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::value::Value;
use crate::Result;

pub use file::{FileStore, JsonFile};
pub use listeners::ListenerRegistry;
pub use map_store::{MapEditor, MapStore, MemoryStore, Persistence, Volatile};

/// Callback fired once per changed key after a write is flushed.
pub trait ChangeListener: Send + Sync {
    /// `key` was written or removed in `prefs`.
    fn on_preference_changed(&self, prefs: &dyn Preferences, key: &str);
}

/// A string-keyed store of typed values.
///
/// Getters never fail: a missing key, or a value that cannot be read as the
/// requested type, yields the caller's default.
pub trait Preferences: Send + Sync {
    /// Text stored under `key`.
    fn get_string(&self, key: &str, default: Option<&str>) -> Option<String>;

    /// 32-bit integer stored under `key`.
    fn get_int(&self, key: &str, default: i32) -> i32;

    /// 64-bit integer stored under `key`.
    fn get_long(&self, key: &str, default: i64) -> i64;

    /// Float stored under `key`.
    fn get_float(&self, key: &str, default: f32) -> f32;

    /// Boolean stored under `key`.
    fn get_boolean(&self, key: &str, default: bool) -> bool;

    /// String set stored under `key`.
    fn get_string_set(
        &self,
        key: &str,
        default: Option<BTreeSet<String>>,
    ) -> Option<BTreeSet<String>>;

    /// Every readable entry.
    fn get_all(&self) -> BTreeMap<String, Value>;

    /// Returns true if an entry exists under `key`.
    fn contains(&self, key: &str) -> bool;

    /// Start a write transaction.
    fn edit(&self) -> Box<dyn PreferencesEditor + '_>;

    /// Register a change listener. Registering the same listener twice is a
    /// no-op.
    fn register_listener(&self, listener: Arc<dyn ChangeListener>);

    /// Unregister a change listener. Unknown listeners are ignored.
    fn unregister_listener(&self, listener: &Arc<dyn ChangeListener>);
}

/// A batch of staged writes against one store.
///
/// `None` values remove the entry.
pub trait PreferencesEditor {
    /// Stage `value` under `key`, or a removal when `value` is `None`.
    fn put_value(&mut self, key: &str, value: Option<Value>) -> Result<()>;

    /// Stage text, or a removal when `value` is `None`.
    fn put_string(&mut self, key: &str, value: Option<&str>) -> Result<()> {
        self.put_value(key, value.map(Value::from))
    }

    /// Stage a 32-bit integer.
    fn put_int(&mut self, key: &str, value: i32) -> Result<()> {
        self.put_value(key, Some(Value::Int(value)))
    }

    /// Stage a 64-bit integer.
    fn put_long(&mut self, key: &str, value: i64) -> Result<()> {
        self.put_value(key, Some(Value::Long(value)))
    }

    /// Stage a float.
    fn put_float(&mut self, key: &str, value: f32) -> Result<()> {
        self.put_value(key, Some(Value::Float(value)))
    }

    /// Stage a boolean.
    fn put_boolean(&mut self, key: &str, value: bool) -> Result<()> {
        self.put_value(key, Some(Value::Bool(value)))
    }

    /// Stage a string set, or a removal when `value` is `None`.
    fn put_string_set(&mut self, key: &str, value: Option<BTreeSet<String>>) -> Result<()> {
        self.put_value(key, value.map(Value::StringSet))
    }

    /// Stage removal of `key`.
    fn remove(&mut self, key: &str) -> Result<()>;

    /// Stage removal of every entry. Applied before the puts of the same
    /// batch, whatever order they were staged in.
    fn clear(&mut self) -> Result<()>;

    /// Flush staged writes. Returns false if they could not be persisted.
    fn commit(&mut self) -> bool;

    /// Flush staged writes, reporting persistence failures only through logs.
    fn apply(&mut self);
}
