//! Typed handles onto single preference keys

use super::backend::PreferenceBackend;
use super::key_flow::{KeyFlow, KeySubscription};
use super::value::{PrimitiveValue, RawValue, ValueKind};
use anyhow::{Context, Result};
use futures::stream::{self, BoxStream, StreamExt};
use std::marker::PhantomData;
use std::sync::Arc;

/// Converts between a handle's value type and what the backend stores
pub trait PreferenceAdapter<T>: Send + Sync {
    fn decode(&self, key: &str, raw: RawValue) -> Result<T>;

    /// `None` means the key is removed instead of written
    fn encode(&self, value: &T) -> Result<Option<RawValue>>;
}

/// Adapter for types that map 1:1 onto a [`RawValue`] variant
pub struct Primitive<T>(PhantomData<fn() -> T>);

impl<T> Primitive<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for Primitive<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PrimitiveValue> PreferenceAdapter<T> for Primitive<T> {
    fn decode(&self, key: &str, raw: RawValue) -> Result<T> {
        let stored = raw.kind();
        T::from_raw(raw).ok_or_else(|| mismatch(key, stored, T::KIND))
    }

    fn encode(&self, value: &T) -> Result<Option<RawValue>> {
        Ok(Some(value.clone().into_raw()))
    }
}

type Serializer<T> = Box<dyn Fn(&T) -> String + Send + Sync>;
type Deserializer<T> = Box<dyn Fn(&str) -> Result<T> + Send + Sync>;

/// Adapter storing arbitrary values as strings via caller-supplied functions
pub struct ObjectAdapter<T> {
    serializer: Serializer<T>,
    deserializer: Deserializer<T>,
}

impl<T> ObjectAdapter<T> {
    pub fn new<S, D>(serializer: S, deserializer: D) -> Self
    where
        S: Fn(&T) -> String + Send + Sync + 'static,
        D: Fn(&str) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            serializer: Box::new(serializer),
            deserializer: Box::new(deserializer),
        }
    }
}

impl<T> PreferenceAdapter<T> for ObjectAdapter<T> {
    fn decode(&self, key: &str, raw: RawValue) -> Result<T> {
        match raw {
            RawValue::String(text) => (self.deserializer)(&text)
                .with_context(|| format!("Failed to deserialize preference '{}'", key)),
            other => Err(mismatch(key, other.kind(), ValueKind::String)),
        }
    }

    fn encode(&self, value: &T) -> Result<Option<RawValue>> {
        Ok(Some(RawValue::String((self.serializer)(value))))
    }
}

/// Adapter exposing the stored value as-is, whatever its kind
pub struct Untyped;

impl PreferenceAdapter<Option<RawValue>> for Untyped {
    fn decode(&self, _key: &str, raw: RawValue) -> Result<Option<RawValue>> {
        Ok(Some(raw))
    }

    fn encode(&self, value: &Option<RawValue>) -> Result<Option<RawValue>> {
        Ok(value.clone())
    }
}

fn mismatch(key: &str, stored: ValueKind, expected: ValueKind) -> anyhow::Error {
    anyhow::anyhow!(
        "Preference '{}' holds a {} value, expected {}",
        key,
        stored,
        expected
    )
}

/// A typed, observable handle on one key
///
/// Handles hold no value of their own: every read goes to the backend, so
/// any number of handles on the same key always agree.
pub struct Preference<T> {
    key: String,
    default: T,
    adapter: Arc<dyn PreferenceAdapter<T>>,
    backend: Arc<dyn PreferenceBackend>,
    key_flow: KeyFlow,
}

impl<T: Clone> Clone for Preference<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            default: self.default.clone(),
            adapter: self.adapter.clone(),
            backend: self.backend.clone(),
            key_flow: self.key_flow.clone(),
        }
    }
}

impl<T> Preference<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(
        key: impl Into<String>,
        default: T,
        adapter: Arc<dyn PreferenceAdapter<T>>,
        backend: Arc<dyn PreferenceBackend>,
        key_flow: KeyFlow,
    ) -> Self {
        Self {
            key: key.into(),
            default,
            adapter,
            backend,
            key_flow,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    /// Current value, or the default when nothing is stored
    pub async fn read(&self) -> Result<T> {
        match self.backend.get_raw(&self.key).await? {
            Some(raw) => self.adapter.decode(&self.key, raw),
            None => Ok(self.default.clone()),
        }
    }

    /// Persist `value`; observers are notified once it is readable
    pub async fn write(&self, value: T) -> Result<()> {
        match self.adapter.encode(&value)? {
            Some(raw) => {
                log::debug!("Writing preference {} ({})", self.key, raw.kind());
                self.backend.set_raw(&self.key, raw).await
            }
            None => self.delete().await,
        }
    }

    /// Whether a value is stored for this key
    pub async fn is_set(&self) -> Result<bool> {
        Ok(self.backend.get_raw(&self.key).await?.is_some())
    }

    /// Remove the stored value so reads fall back to the default
    pub async fn delete(&self) -> Result<()> {
        log::debug!("Deleting preference {}", self.key);
        self.backend.remove_raw(&self.key).await
    }

    /// Stream of values: the current one first, then one per change
    ///
    /// Nothing is subscribed until the stream is first polled. Changes to
    /// other keys are skipped; a cleared store re-emits. The stream only
    /// ends when dropped.
    pub fn observe(&self) -> BoxStream<'static, Result<T>> {
        stream::unfold(Observer::Idle(self.clone()), |observer| async move {
            match observer {
                Observer::Idle(preference) => {
                    // Subscribe before the first read so no write slips between
                    let subscription = preference.key_flow.subscribe();
                    let value = preference.read().await;
                    Some((value, Observer::Active(preference, subscription)))
                }
                Observer::Active(preference, mut subscription) => loop {
                    let change = subscription.recv().await?;
                    if change.affects(&preference.key) {
                        let value = preference.read().await;
                        return Some((value, Observer::Active(preference, subscription)));
                    }
                },
            }
        })
        .boxed()
    }
}

impl Preference<bool> {
    /// Flip the stored flag and return the new value
    pub async fn toggle(&self) -> Result<bool> {
        let value = !self.read().await?;
        self.write(value).await?;
        Ok(value)
    }
}

enum Observer<T> {
    Idle(Preference<T>),
    Active(Preference<T>, KeySubscription),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::key_flow::DEFAULT_CHANGE_BUFFER;
    use crate::preferences::memory::MemoryBackend;

    fn handle<T>(key: &str, default: T, adapter: Arc<dyn PreferenceAdapter<T>>) -> Preference<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let backend: Arc<dyn PreferenceBackend> = Arc::new(MemoryBackend::new());
        let key_flow = KeyFlow::new(backend.clone(), DEFAULT_CHANGE_BUFFER);
        Preference::new(key, default, adapter, backend, key_flow)
    }

    #[tokio::test]
    async fn test_primitive_default_then_written() {
        let volume = handle::<i32>("volume", 50, Arc::new(Primitive::<i32>::new()));
        assert_eq!(volume.read().await.unwrap(), 50);
        assert!(!volume.is_set().await.unwrap());

        volume.write(80).await.unwrap();
        assert_eq!(volume.read().await.unwrap(), 80);
        assert!(volume.is_set().await.unwrap());

        volume.delete().await.unwrap();
        assert_eq!(volume.read().await.unwrap(), 50);
    }

    #[tokio::test]
    async fn test_object_deserialize_error_propagates() {
        let adapter = ObjectAdapter::new(
            |v: &u16| v.to_string(),
            |s: &str| s.parse::<u16>().context("not a u16"),
        );
        let pref = handle::<u16>("port", 8080, Arc::new(adapter));

        pref.backend
            .set_raw("port", RawValue::String("http".into()))
            .await
            .unwrap();
        let err = pref.read().await.unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to deserialize preference 'port'"));
    }

    #[tokio::test]
    async fn test_untyped_write_none_removes() {
        let pref = handle::<Option<RawValue>>("anything", None, Arc::new(Untyped));
        pref.write(Some(RawValue::Float(1.5))).await.unwrap();
        assert_eq!(pref.read().await.unwrap(), Some(RawValue::Float(1.5)));

        pref.write(None).await.unwrap();
        assert_eq!(pref.read().await.unwrap(), None);
        assert!(!pref.is_set().await.unwrap());
    }

    #[tokio::test]
    async fn test_toggle() {
        let pref = handle::<bool>("dark_mode", false, Arc::new(Primitive::<bool>::new()));
        assert!(pref.toggle().await.unwrap());
        assert!(!pref.toggle().await.unwrap());
        assert!(!pref.read().await.unwrap());
    }
}
