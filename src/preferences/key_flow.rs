//! Shared change source for all observers of one store
//!
//! A [`KeyFlow`] turns the backend's push callbacks into a multicast
//! channel. The backend listener is registered when the first subscription
//! is taken and unregistered when the last one is dropped, so any number of
//! observers cost exactly one registration.

use super::backend::{KeyChange, ListenerId, PreferenceBackend};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// Default number of change events buffered per subscriber
pub const DEFAULT_CHANGE_BUFFER: usize = 64;

#[derive(Clone)]
pub struct KeyFlow {
    inner: Arc<KeyFlowInner>,
}

struct KeyFlowInner {
    backend: Arc<dyn PreferenceBackend>,
    buffer: usize,
    registration: Mutex<Option<Registration>>,
}

struct Registration {
    listener: ListenerId,
    sender: broadcast::Sender<KeyChange>,
    subscribers: usize,
}

impl KeyFlow {
    pub fn new(backend: Arc<dyn PreferenceBackend>, buffer: usize) -> Self {
        Self {
            inner: Arc::new(KeyFlowInner {
                backend,
                buffer: buffer.max(1),
                registration: Mutex::new(None),
            }),
        }
    }

    /// Attach a new subscriber, registering the backend listener if needed
    pub fn subscribe(&self) -> KeySubscription {
        let mut registration = self.registration();

        let active = registration.get_or_insert_with(|| {
            let (sender, _) = broadcast::channel(self.inner.buffer);
            let forward = sender.clone();
            let listener = self.inner.backend.register_listener(Arc::new(move |change| {
                // No receivers between the last drop and unregistration is fine
                let _ = forward.send(change);
            }));
            log::debug!("Key flow started");
            Registration {
                listener,
                sender,
                subscribers: 0,
            }
        });

        active.subscribers += 1;
        KeySubscription {
            receiver: active.sender.subscribe(),
            flow: self.clone(),
        }
    }

    /// Whether a backend listener is currently registered
    pub fn is_active(&self) -> bool {
        self.registration().is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.registration()
            .as_ref()
            .map_or(0, |registration| registration.subscribers)
    }

    fn release(&self) {
        let mut registration = self.registration();
        let Some(active) = registration.as_mut() else {
            return;
        };

        active.subscribers = active.subscribers.saturating_sub(1);
        if active.subscribers == 0 {
            if let Some(finished) = registration.take() {
                self.inner.backend.unregister_listener(finished.listener);
                log::debug!("Key flow stopped");
            }
        }
    }

    fn registration(&self) -> MutexGuard<'_, Option<Registration>> {
        self.inner
            .registration
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// One subscriber's view of the change source; releases itself on drop
pub struct KeySubscription {
    receiver: broadcast::Receiver<KeyChange>,
    flow: KeyFlow,
}

impl KeySubscription {
    /// Wait for the next change
    ///
    /// A subscriber that fell behind the buffer gets [`KeyChange::Cleared`]
    /// so it re-reads everything it watches. Returns `None` only if the
    /// source shut down.
    pub async fn recv(&mut self) -> Option<KeyChange> {
        match self.receiver.recv().await {
            Ok(change) => Some(change),
            Err(RecvError::Lagged(skipped)) => {
                log::warn!("Preference observer lagged by {} change(s), re-reading", skipped);
                Some(KeyChange::Cleared)
            }
            Err(RecvError::Closed) => None,
        }
    }
}

impl Drop for KeySubscription {
    fn drop(&mut self) {
        self.flow.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::memory::MemoryBackend;
    use crate::preferences::value::RawValue;

    fn setup() -> (Arc<MemoryBackend>, KeyFlow) {
        let backend = Arc::new(MemoryBackend::new());
        let flow = KeyFlow::new(backend.clone(), DEFAULT_CHANGE_BUFFER);
        (backend, flow)
    }

    #[tokio::test]
    async fn test_single_registration_for_many_subscribers() {
        let (backend, flow) = setup();
        assert!(!flow.is_active());

        let first = flow.subscribe();
        let second = flow.subscribe();
        assert_eq!(backend.listener_count(), 1);
        assert_eq!(flow.subscriber_count(), 2);

        drop(first);
        assert!(flow.is_active());
        assert_eq!(backend.listener_count(), 1);

        drop(second);
        assert!(!flow.is_active());
        assert_eq!(backend.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_every_subscriber_sees_every_change() {
        let (backend, flow) = setup();
        let mut first = flow.subscribe();
        let mut second = flow.subscribe();

        backend.set_raw("a", RawValue::Int(1)).await.unwrap();
        backend.clear().await.unwrap();

        for subscription in [&mut first, &mut second] {
            assert_eq!(subscription.recv().await, Some(KeyChange::Key("a".into())));
            assert_eq!(subscription.recv().await, Some(KeyChange::Cleared));
        }
    }

    #[tokio::test]
    async fn test_resubscribe_after_release() {
        let (backend, flow) = setup();
        drop(flow.subscribe());
        assert_eq!(backend.listener_count(), 0);

        let mut subscription = flow.subscribe();
        assert_eq!(backend.listener_count(), 1);

        backend.set_raw("a", RawValue::Boolean(true)).await.unwrap();
        assert_eq!(subscription.recv().await, Some(KeyChange::Key("a".into())));
    }

    #[tokio::test]
    async fn test_lag_is_reported_as_cleared() {
        let backend = Arc::new(MemoryBackend::new());
        let flow = KeyFlow::new(backend.clone(), 2);
        let mut subscription = flow.subscribe();

        for i in 0..5 {
            backend.set_raw("a", RawValue::Int(i)).await.unwrap();
        }

        assert_eq!(subscription.recv().await, Some(KeyChange::Cleared));
    }
}
