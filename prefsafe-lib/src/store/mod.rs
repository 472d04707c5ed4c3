//! The encrypted store.
//!
//! [`SecureStore`] wraps a plain [`Preferences`] implementation. Keys are
//! stored as given; every value is encoded to text, encrypted, framed and
//! stored as base64. Reads reverse the chain and fall back to the caller's
//! default on any failure.

mod editor;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::codec::ValueCodec;
use crate::payload;
use crate::prefs::{ChangeListener, ListenerRegistry, Preferences, PreferencesEditor};
use crate::securable::{Backend, BackendKind, Securable};
use crate::value::Value;
use crate::{PrefsafeError, Result};

pub use editor::Editor;

/// Encrypting drop-in replacement for a plain preference store.
pub struct SecureStore {
    delegate: Arc<dyn Preferences>,
    securable: Arc<dyn Securable>,
    backend_kind: Option<BackendKind>,
    codec: ValueCodec,
    listeners: ListenerRegistry,
}

impl SecureStore {
    /// Wrap `delegate`, encrypting with `securable`.
    pub fn new(
        delegate: Arc<dyn Preferences>,
        securable: Arc<dyn Securable>,
        codec: ValueCodec,
    ) -> Self {
        Self {
            delegate,
            securable,
            backend_kind: None,
            codec,
            listeners: ListenerRegistry::new(),
        }
    }

    /// Wrap `delegate` with a selected backend.
    pub fn with_backend(
        delegate: Arc<dyn Preferences>,
        backend: Backend,
        codec: ValueCodec,
    ) -> Self {
        let kind = backend.kind();
        Self {
            backend_kind: Some(kind),
            ..Self::new(delegate, Arc::new(backend), codec)
        }
    }

    /// The encryption backend.
    pub fn securable(&self) -> &Arc<dyn Securable> {
        &self.securable
    }

    /// Kind of the selected backend, if the store was built through
    /// [`Backend::select`].
    pub fn backend_kind(&self) -> Option<BackendKind> {
        self.backend_kind
    }

    /// The value codec.
    pub fn codec(&self) -> ValueCodec {
        self.codec
    }

    /// The wrapped plain store.
    pub fn delegate(&self) -> &Arc<dyn Preferences> {
        &self.delegate
    }

    /// Start a write transaction.
    pub fn editor(&self) -> Editor<'_> {
        Editor::new(self, self.delegate.edit())
    }

    /// Encode, encrypt and base64-frame a value.
    pub(crate) fn seal(&self, value: &Value) -> Result<String> {
        let text = self.codec.encode(value);
        let ciphertext = self.securable.encrypt_text(&text)?;
        Ok(payload::to_text(&ciphertext))
    }

    /// Base64-decode, decrypt and UTF-8 decode stored text.
    fn open_text(&self, raw: &str) -> Result<String> {
        let bytes = payload::from_text(raw)?;
        let plaintext = self.securable.decrypt(&bytes)?;
        Ok(String::from_utf8(plaintext)?)
    }

    fn raw(&self, key: &str) -> Option<String> {
        self.delegate.get_string(key, None)
    }

    fn decode_entry(&self, raw: &str) -> Result<Value> {
        self.codec.decode(&self.open_text(raw)?)
    }

    /// Typed value under `key`, or `None` when absent or unreadable.
    fn read(&self, key: &str) -> Option<Value> {
        let raw = self.raw(key)?;
        match self.decode_entry(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log_read_failure(key, &e);
                None
            }
        }
    }

    /// Read `key` and project it, logging a parse failure on mismatch.
    fn read_as<T>(
        &self,
        key: &str,
        value_type: &'static str,
        f: impl FnOnce(&Value) -> Option<T>,
    ) -> Option<T> {
        let value = self.read(key)?;
        let projected = f(&value);
        if projected.is_none() {
            log_read_failure(key, &PrefsafeError::parse_failure(value_type));
        }
        projected
    }

    pub(crate) fn notify(&self, keys: &[String]) {
        self.listeners.notify(self, keys);
    }
}

fn log_read_failure(key: &str, error: &PrefsafeError) {
    if error.is_recoverable_on_read() {
        tracing::debug!(key, code = ?error.code(), "unreadable entry, using default");
    } else {
        tracing::warn!(key, code = ?error.code(), "read failed, using default");
    }
}

impl Preferences for SecureStore {
    #[tracing::instrument(skip(self, default))]
    fn get_string(&self, key: &str, default: Option<&str>) -> Option<String> {
        let Some(raw) = self.raw(key) else {
            return default.map(str::to_string);
        };
        match self
            .open_text(&raw)
            .and_then(|text| self.codec.text_view(&text))
        {
            Ok(text) => Some(text),
            Err(e) => {
                log_read_failure(key, &e);
                default.map(str::to_string)
            }
        }
    }

    #[tracing::instrument(skip(self))]
    fn get_int(&self, key: &str, default: i32) -> i32 {
        self.read_as(key, "int", |v| match v {
            Value::Int(v) => Some(*v),
            _ => None,
        })
        .unwrap_or(default)
    }

    #[tracing::instrument(skip(self))]
    fn get_long(&self, key: &str, default: i64) -> i64 {
        self.read_as(key, "long", Value::as_long).unwrap_or(default)
    }

    #[tracing::instrument(skip(self))]
    fn get_float(&self, key: &str, default: f32) -> f32 {
        self.read_as(key, "float", |v| match v {
            Value::Int(v) => Some(*v as f32),
            Value::Long(v) => Some(*v as f32),
            Value::Float(v) => Some(*v),
            _ => None,
        })
        .unwrap_or(default)
    }

    #[tracing::instrument(skip(self))]
    fn get_boolean(&self, key: &str, default: bool) -> bool {
        self.read_as(key, "bool", Value::as_bool).unwrap_or(default)
    }

    #[tracing::instrument(skip(self, default))]
    fn get_string_set(
        &self,
        key: &str,
        default: Option<BTreeSet<String>>,
    ) -> Option<BTreeSet<String>> {
        match self.read_as(key, "string_set", |v| v.as_string_set().cloned()) {
            Some(set) => Some(set),
            None => default,
        }
    }

    #[tracing::instrument(skip(self))]
    fn get_all(&self) -> BTreeMap<String, Value> {
        let mut all = BTreeMap::new();
        for (key, raw) in self.delegate.get_all() {
            let Value::Text(raw) = raw else {
                tracing::debug!(key = %key, "skipping non-text entry");
                continue;
            };
            match self.decode_entry(&raw) {
                Ok(value) => {
                    all.insert(key, value);
                }
                Err(e) => log_read_failure(&key, &e),
            }
        }
        all
    }

    fn contains(&self, key: &str) -> bool {
        self.delegate.contains(key)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValueEncoding;
    use crate::prefs::MemoryStore;
    use crate::test_utils::{FailingSecurable, PlainSecurable};

    fn plain_store() -> (Arc<MemoryStore>, SecureStore) {
        let delegate = Arc::new(MemoryStore::new());
        let store = SecureStore::new(
            delegate.clone(),
            Arc::new(PlainSecurable),
            ValueCodec::default(),
        );
        (delegate, store)
    }

    fn put_raw(delegate: &MemoryStore, key: &str, value: Value) {
        let mut editor = delegate.edit();
        editor.put_value(key, Some(value)).unwrap();
        assert!(editor.commit());
    }

    #[test]
    fn test_defaults_for_missing_keys() {
        let (_, store) = plain_store();
        assert_eq!(store.get_string("k", Some("d")).as_deref(), Some("d"));
        assert_eq!(store.get_string("k", None), None);
        assert_eq!(store.get_int("k", 7), 7);
        assert_eq!(store.get_long("k", 8), 8);
        assert_eq!(store.get_float("k", 1.5), 1.5);
        assert!(store.get_boolean("k", true));
        assert_eq!(store.get_string_set("k", None), None);
        assert!(!store.contains("k"));
    }

    #[test]
    fn test_values_are_stored_encrypted_as_base64() {
        let (delegate, store) = plain_store();
        let mut editor = store.edit();
        editor.put_int("n", 42).unwrap();
        assert!(editor.commit());

        let raw = delegate.get_string("n", None).unwrap();
        assert_eq!(payload::from_text(&raw).unwrap(), b"42");
        assert_eq!(store.get_int("n", 0), 42);
    }

    #[test]
    fn test_type_mismatch_returns_default() {
        let (_, store) = plain_store();
        let mut editor = store.edit();
        editor.put_string("text", Some("hello")).unwrap();
        editor.put_long("big", i64::MAX).unwrap();
        editor.apply();

        assert_eq!(store.get_int("text", -1), -1);
        assert_eq!(store.get_int("big", -1), -1);
        assert_eq!(store.get_long("big", 0), i64::MAX);
        assert!(!store.get_boolean("text", false));
        assert_eq!(store.get_string("big", None).as_deref(), Some("9223372036854775807"));
    }

    #[test]
    fn test_numeric_getters_widen() {
        let (_, store) = plain_store();
        let mut editor = store.edit();
        editor.put_int("n", 3).unwrap();
        editor.apply();

        assert_eq!(store.get_long("n", 0), 3);
        assert_eq!(store.get_float("n", 0.0), 3.0);
    }

    #[test]
    fn test_garbage_payload_returns_default() {
        let (delegate, store) = plain_store();
        put_raw(&delegate, "bad", Value::Text("%%% not base64".to_string()));
        put_raw(&delegate, "invalid_utf8", Value::Text(payload::to_text(&[0xff, 0xfe])));

        assert_eq!(store.get_string("bad", Some("d")).as_deref(), Some("d"));
        assert_eq!(store.get_string("invalid_utf8", Some("d")).as_deref(), Some("d"));
        assert_eq!(store.get_int("bad", 5), 5);
        assert!(store.get_all().is_empty());
    }

    #[test]
    fn test_get_all_skips_non_text_entries() {
        let (delegate, store) = plain_store();
        put_raw(&delegate, "plain_int", Value::Int(1));
        let mut editor = store.edit();
        editor.put_boolean("flag", true).unwrap();
        editor.apply();

        let all = store.get_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all.get("flag"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_failing_securable_degrades_reads() {
        let delegate = Arc::new(MemoryStore::new());
        put_raw(&delegate, "k", Value::Text(payload::to_text(b"abc")));
        let store = SecureStore::new(delegate, Arc::new(FailingSecurable), ValueCodec::default());

        assert_eq!(store.get_string("k", Some("d")).as_deref(), Some("d"));
        assert!(store.get_all().is_empty());
        assert!(store.contains("k"));
    }

    #[test]
    fn test_tagged_encoding() {
        let delegate = Arc::new(MemoryStore::new());
        let store = SecureStore::new(
            delegate.clone(),
            Arc::new(PlainSecurable),
            ValueCodec::new(ValueEncoding::Tagged),
        );
        let mut editor = store.edit();
        editor.put_string("numeric_text", Some("123")).unwrap();
        editor.put_string_set("set", Some(["a,b".to_string()].into())).unwrap();
        editor.apply();

        assert_eq!(store.get_int("numeric_text", -1), -1);
        assert_eq!(store.get_string("numeric_text", None).as_deref(), Some("123"));
        assert_eq!(
            store.get_all().get("set"),
            Some(&Value::StringSet(["a,b".to_string()].into()))
        );

        // Untagged entries still read through the heuristic.
        put_raw(&delegate, "legacy", Value::Text(payload::to_text(b"77")));
        assert_eq!(store.get_int("legacy", 0), 77);
    }
}
