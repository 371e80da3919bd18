//! Typed entry point over a preference backend

use super::backend::PreferenceBackend;
use super::key_flow::{DEFAULT_CHANGE_BUFFER, KeyFlow};
use super::memory::MemoryBackend;
use super::preference::{ObjectAdapter, Preference, Primitive, Untyped};
use super::value::{PrimitiveValue, RawValue};
use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Hands out typed [`Preference`] handles over one backend
///
/// All handles from one store share a single [`KeyFlow`], so observing
/// any number of keys costs one backend listener.
#[derive(Clone)]
pub struct PreferenceStore {
    backend: Arc<dyn PreferenceBackend>,
    key_flow: KeyFlow,
}

impl PreferenceStore {
    pub fn new(backend: Arc<dyn PreferenceBackend>) -> Self {
        Self::with_buffer(backend, DEFAULT_CHANGE_BUFFER)
    }

    /// Like [`PreferenceStore::new`] with a custom per-observer event buffer
    pub fn with_buffer(backend: Arc<dyn PreferenceBackend>, buffer: usize) -> Self {
        let key_flow = KeyFlow::new(backend.clone(), buffer);
        Self { backend, key_flow }
    }

    /// Store over a fresh [`MemoryBackend`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    pub fn backend(&self) -> &Arc<dyn PreferenceBackend> {
        &self.backend
    }

    pub fn key_flow(&self) -> &KeyFlow {
        &self.key_flow
    }

    pub fn get_string(&self, key: &str, default: impl Into<String>) -> Preference<String> {
        self.primitive(key, default.into())
    }

    pub fn get_int(&self, key: &str, default: i32) -> Preference<i32> {
        self.primitive(key, default)
    }

    pub fn get_long(&self, key: &str, default: i64) -> Preference<i64> {
        self.primitive(key, default)
    }

    pub fn get_float(&self, key: &str, default: f32) -> Preference<f32> {
        self.primitive(key, default)
    }

    pub fn get_boolean(&self, key: &str, default: bool) -> Preference<bool> {
        self.primitive(key, default)
    }

    pub fn get_string_set(
        &self,
        key: &str,
        default: BTreeSet<String>,
    ) -> Preference<BTreeSet<String>> {
        self.primitive(key, default)
    }

    /// Handle on a value stored as a string through `serializer`/`deserializer`
    ///
    /// Deserialization errors are returned from reads untouched apart from
    /// added context; the store never validates the payload.
    pub fn get_object<T, S, D>(
        &self,
        key: &str,
        default: T,
        serializer: S,
        deserializer: D,
    ) -> Preference<T>
    where
        T: Clone + Send + Sync + 'static,
        S: Fn(&T) -> String + Send + Sync + 'static,
        D: Fn(&str) -> Result<T> + Send + Sync + 'static,
    {
        Preference::new(
            key,
            default,
            Arc::new(ObjectAdapter::new(serializer, deserializer)),
            self.backend.clone(),
            self.key_flow.clone(),
        )
    }

    /// Like [`PreferenceStore::get_object`] for values that may be absent
    pub fn get_nullable_object<T, S, D>(
        &self,
        key: &str,
        default: Option<T>,
        serializer: S,
        deserializer: D,
    ) -> Preference<Option<T>>
    where
        T: Clone + Send + Sync + 'static,
        S: Fn(&Option<T>) -> String + Send + Sync + 'static,
        D: Fn(&str) -> Result<Option<T>> + Send + Sync + 'static,
    {
        self.get_object(key, default, serializer, deserializer)
    }

    /// Handle exposing whatever is stored under `key`; writing `None` removes it
    pub fn get_untyped(&self, key: &str) -> Preference<Option<RawValue>> {
        Preference::new(
            key,
            None,
            Arc::new(Untyped),
            self.backend.clone(),
            self.key_flow.clone(),
        )
    }

    /// Snapshot of every stored key
    pub async fn get_all(&self) -> Result<BTreeMap<String, RawValue>> {
        self.backend.get_all_raw().await
    }

    /// Remove every key; all observers re-emit their defaults
    pub async fn clear(&self) -> Result<()> {
        log::info!("Clearing all preferences");
        self.backend.clear().await
    }

    fn primitive<T: PrimitiveValue>(&self, key: &str, default: T) -> Preference<T> {
        Preference::new(
            key,
            default,
            Arc::new(Primitive::<T>::new()),
            self.backend.clone(),
            self.key_flow.clone(),
        )
    }
}
