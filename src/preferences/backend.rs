//! Contract for the untyped storage underneath a [`PreferenceStore`](super::PreferenceStore)

use super::value::RawValue;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// What a backend reports after a mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyChange {
    /// A single key was written or removed
    Key(String),
    /// Any key may have changed (the store was cleared or replaced)
    Cleared,
}

impl KeyChange {
    /// Whether an observer of `key` has to re-read after this change
    pub fn affects(&self, key: &str) -> bool {
        match self {
            KeyChange::Key(changed) => changed == key,
            KeyChange::Cleared => true,
        }
    }
}

/// Handle returned by [`PreferenceBackend::register_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Callback invoked by a backend after every mutation
pub type ChangeListener = Arc<dyn Fn(KeyChange) + Send + Sync>;

/// Raw key-value storage with change callbacks
///
/// Every mutation, whoever performs it, must be reported to the registered
/// listeners after it is visible to `get_raw`.
#[async_trait]
pub trait PreferenceBackend: Send + Sync {
    async fn get_raw(&self, key: &str) -> Result<Option<RawValue>>;

    async fn set_raw(&self, key: &str, value: RawValue) -> Result<()>;

    async fn remove_raw(&self, key: &str) -> Result<()>;

    async fn clear(&self) -> Result<()>;

    async fn get_all_raw(&self) -> Result<BTreeMap<String, RawValue>>;

    fn register_listener(&self, listener: ChangeListener) -> ListenerId;

    fn unregister_listener(&self, id: ListenerId);
}

/// Listener bookkeeping shared by the backend implementations
#[derive(Default)]
pub struct ListenerSet {
    next_id: AtomicU64,
    listeners: RwLock<HashMap<ListenerId, ChangeListener>>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, listener: ChangeListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(id, listener);
        log::debug!("Registered preference listener {:?}", id);
        id
    }

    pub fn unregister(&self, id: ListenerId) {
        let removed = self
            .listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&id);
        if removed.is_some() {
            log::debug!("Unregistered preference listener {:?}", id);
        }
    }

    /// Call every listener with `change`
    ///
    /// Listeners run outside the lock so they may register or unregister.
    pub fn notify(&self, change: KeyChange) {
        let listeners: Vec<ChangeListener> = self
            .listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
            .cloned()
            .collect();

        log::trace!("Notifying {} listener(s) of {:?}", listeners.len(), change);
        for listener in listeners {
            listener(change.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
