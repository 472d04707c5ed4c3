//! Write transactions on a [`SecureStore`].

use crate::prefs::PreferencesEditor;
use crate::value::Value;
use crate::Result;

use super::SecureStore;

/// Staged, encrypted writes against one [`SecureStore`].
///
/// Every put is encrypted immediately and staged into the delegate's editor;
/// nothing is visible until [`commit`](PreferencesEditor::commit) or
/// [`apply`](PreferencesEditor::apply). Keys are collected in put order,
/// duplicates included, and handed to the store's listeners after a
/// successful flush.
pub struct Editor<'a> {
    store: &'a SecureStore,
    delegate: Box<dyn PreferencesEditor + 'a>,
    changed_keys: Vec<String>,
}

impl<'a> Editor<'a> {
    pub(super) fn new(
        store: &'a SecureStore,
        delegate: Box<dyn PreferencesEditor + 'a>,
    ) -> Self {
        Self {
            store,
            delegate,
            changed_keys: Vec::new(),
        }
    }

    /// Keys put since the last flush, in put order.
    pub fn changed_keys(&self) -> &[String] {
        &self.changed_keys
    }

    fn notify(&mut self) {
        if self.changed_keys.is_empty() {
            return;
        }
        let keys = std::mem::take(&mut self.changed_keys);
        self.store.notify(&keys);
    }
}

impl PreferencesEditor for Editor<'_> {
    #[tracing::instrument(skip(self, value))]
    fn put_value(&mut self, key: &str, value: Option<Value>) -> Result<()> {
        let sealed = match value {
            Some(value) => Some(Value::Text(self.store.seal(&value)?)),
            None => None,
        };
        self.delegate.put_value(key, sealed)?;
        self.changed_keys.push(key.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.delegate.remove(key)
    }

    fn clear(&mut self) -> Result<()> {
        self.delegate.clear()
    }

    #[tracing::instrument(skip(self), fields(changed = self.changed_keys.len()))]
    fn commit(&mut self) -> bool {
        if self.delegate.commit() {
            self.notify();
            true
        } else {
            tracing::warn!("delegate commit failed, dropping change notifications");
            self.changed_keys.clear();
            false
        }
    }

    #[tracing::instrument(skip(self), fields(changed = self.changed_keys.len()))]
    fn apply(&mut self) {
        self.delegate.apply();
        self.notify();
    }
}
