//! Change-listener registry shared by every store.

use std::sync::{Arc, RwLock};

use super::{ChangeListener, Preferences};

fn same_listener(a: &Arc<dyn ChangeListener>, b: &Arc<dyn ChangeListener>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// Ordered, duplicate-free list of listeners, compared by identity.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: RwLock<Vec<Arc<dyn ChangeListener>>>,
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `listener` unless it is already registered.
    pub fn register(&self, listener: Arc<dyn ChangeListener>) {
        let Ok(mut listeners) = self.listeners.write() else {
            tracing::warn!("listener registry lock poisoned, dropping registration");
            return;
        };
        if listeners.iter().any(|l| same_listener(l, &listener)) {
            return;
        }
        listeners.push(listener);
    }

    /// Remove `listener` if registered.
    pub fn unregister(&self, listener: &Arc<dyn ChangeListener>) {
        if let Ok(mut listeners) = self.listeners.write() {
            listeners.retain(|l| !same_listener(l, listener));
        }
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.read().map(|l| l.len()).unwrap_or(0)
    }

    /// Returns true if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every listener for every key: listeners in registration order,
    /// keys in the order given.
    ///
    /// Listeners run on a snapshot taken before the first call, so a
    /// listener may register or unregister others without deadlocking.
    pub fn notify(&self, prefs: &dyn Preferences, keys: &[String]) {
        if keys.is_empty() {
            return;
        }
        let snapshot: Vec<Arc<dyn ChangeListener>> = match self.listeners.read() {
            Ok(listeners) => listeners.clone(),
            Err(_) => {
                tracing::warn!("listener registry lock poisoned, skipping notification");
                return;
            }
        };
        for listener in &snapshot {
            for key in keys {
                listener.on_preference_changed(prefs, key);
            }
        }
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("len", &self.len())
            .finish()
    }
}
