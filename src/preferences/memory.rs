//! In-process backend, used for tests and throwaway stores

use super::backend::{ChangeListener, KeyChange, ListenerId, ListenerSet, PreferenceBackend};
use super::value::RawValue;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::RwLock;

#[derive(Default)]
pub struct MemoryBackend {
    values: RwLock<BTreeMap<String, RawValue>>,
    listeners: ListenerSet,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered change listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn values_mut(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, RawValue>> {
        self.values
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn values(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, RawValue>> {
        self.values
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl PreferenceBackend for MemoryBackend {
    async fn get_raw(&self, key: &str) -> Result<Option<RawValue>> {
        Ok(self.values().get(key).cloned())
    }

    async fn set_raw(&self, key: &str, value: RawValue) -> Result<()> {
        self.values_mut().insert(key.to_string(), value);
        self.listeners.notify(KeyChange::Key(key.to_string()));
        Ok(())
    }

    async fn remove_raw(&self, key: &str) -> Result<()> {
        let removed = self.values_mut().remove(key);
        if removed.is_some() {
            self.listeners.notify(KeyChange::Key(key.to_string()));
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.values_mut().clear();
        self.listeners.notify(KeyChange::Cleared);
        Ok(())
    }

    async fn get_all_raw(&self) -> Result<BTreeMap<String, RawValue>> {
        Ok(self.values().clone())
    }

    fn register_listener(&self, listener: ChangeListener) -> ListenerId {
        self.listeners.register(listener)
    }

    fn unregister_listener(&self, id: ListenerId) {
        self.listeners.unregister(id)
    }
}
