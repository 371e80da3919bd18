//! SQLite-backed preference storage

use super::backend::{ChangeListener, KeyChange, ListenerId, ListenerSet, PreferenceBackend};
use super::value::RawValue;
use crate::config::repository::preferences as repo;
use anyhow::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Encoded `(kind, value)` per key, as last seen by an external watcher
pub(crate) type Snapshot = BTreeMap<String, (String, String)>;

/// Snapshots of the running external watchers, one per watch
#[derive(Default)]
struct Watches {
    next_id: u64,
    snapshots: HashMap<u64, Snapshot>,
}

/// Preference backend storing rows in the `preferences` table
pub struct SqliteBackend {
    pool: SqlitePool,
    listeners: Arc<ListenerSet>,
    watches: Arc<Mutex<Watches>>,
}

impl SqliteBackend {
    /// Create a backend over a migrated pool
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            listeners: Arc::new(ListenerSet::new()),
            watches: Arc::new(Mutex::new(Watches::default())),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Number of registered change listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Report rows changed by other connections or processes
    ///
    /// Polls the table every `interval` and notifies listeners of every key
    /// whose stored value differs from the previous poll. Writes made
    /// through this backend keep each watch's snapshot current, so they are
    /// reported once. Polling stops when the returned handle is dropped.
    pub async fn watch_external_changes(&self, interval: Duration) -> Result<ExternalWatch> {
        let initial = load_snapshot(&self.pool).await?;
        let id = {
            let mut watches = lock(&self.watches);
            let id = watches.next_id;
            watches.next_id += 1;
            watches.snapshots.insert(id, initial);
            id
        };

        let pool = self.pool.clone();
        let listeners = self.listeners.clone();
        let watches = self.watches.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;

                let current = match load_snapshot(&pool).await {
                    Ok(current) => current,
                    Err(e) => {
                        log::warn!("Failed to poll preferences for external changes: {:#}", e);
                        continue;
                    }
                };

                let changed = {
                    let mut guard = lock(&watches);
                    let Some(previous) = guard.snapshots.get_mut(&id) else {
                        break;
                    };
                    let changed = diff_snapshots(previous, &current);
                    *previous = current;
                    changed
                };

                if !changed.is_empty() {
                    log::debug!("Detected {} externally changed preference(s)", changed.len());
                }
                for key in changed {
                    listeners.notify(KeyChange::Key(key));
                }
            }
        });

        log::debug!("Watching preferences table every {:?} (watch {})", interval, id);
        Ok(ExternalWatch {
            id,
            task,
            watches: self.watches.clone(),
        })
    }

    /// Number of running external watchers
    pub fn watch_count(&self) -> usize {
        lock(&self.watches).snapshots.len()
    }

    /// Announce that the whole table was replaced behind the backend's
    /// methods, e.g. by a committed import
    pub(crate) fn replaced(&self, rows: Snapshot) {
        for snapshot in lock(&self.watches).snapshots.values_mut() {
            *snapshot = rows.clone();
        }
        self.listeners.notify(KeyChange::Cleared);
    }

    fn record(&self, key: &str, entry: Option<(String, String)>) {
        for snapshot in lock(&self.watches).snapshots.values_mut() {
            match &entry {
                Some(entry) => {
                    snapshot.insert(key.to_string(), entry.clone());
                }
                None => {
                    snapshot.remove(key);
                }
            }
        }
    }
}

#[async_trait]
impl PreferenceBackend for SqliteBackend {
    async fn get_raw(&self, key: &str) -> Result<Option<RawValue>> {
        repo::get(&self.pool, key).await
    }

    async fn set_raw(&self, key: &str, value: RawValue) -> Result<()> {
        let kind = value.kind();
        let encoded = value.encode()?;
        repo::set(&self.pool, key, kind, &encoded).await?;

        self.record(key, Some((kind.as_str().to_string(), encoded)));
        self.listeners.notify(KeyChange::Key(key.to_string()));
        Ok(())
    }

    async fn remove_raw(&self, key: &str) -> Result<()> {
        if repo::delete(&self.pool, key).await? {
            self.record(key, None);
            self.listeners.notify(KeyChange::Key(key.to_string()));
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        repo::clear(&self.pool).await?;

        self.replaced(Snapshot::new());
        Ok(())
    }

    async fn get_all_raw(&self) -> Result<BTreeMap<String, RawValue>> {
        repo::list(&self.pool).await
    }

    fn register_listener(&self, listener: ChangeListener) -> ListenerId {
        self.listeners.register(listener)
    }

    fn unregister_listener(&self, id: ListenerId) {
        self.listeners.unregister(id)
    }
}

/// Running external-change poller; stops on drop
pub struct ExternalWatch {
    id: u64,
    task: JoinHandle<()>,
    watches: Arc<Mutex<Watches>>,
}

impl Drop for ExternalWatch {
    fn drop(&mut self) {
        self.task.abort();
        lock(&self.watches).snapshots.remove(&self.id);
        log::debug!("Stopped watching preferences table (watch {})", self.id);
    }
}

fn lock(watches: &Mutex<Watches>) -> std::sync::MutexGuard<'_, Watches> {
    watches.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn load_snapshot(pool: &SqlitePool) -> Result<Snapshot> {
    let rows = repo::list_rows(pool).await?;
    Ok(rows
        .into_iter()
        .map(|row| (row.key, (row.kind, row.value)))
        .collect())
}

/// Keys added, removed or modified between two snapshots, in key order
fn diff_snapshots(previous: &Snapshot, current: &Snapshot) -> Vec<String> {
    let mut changed: Vec<String> = current
        .iter()
        .filter(|(key, entry)| previous.get(*key) != Some(*entry))
        .map(|(key, _)| key.clone())
        .collect();

    changed.extend(
        previous
            .keys()
            .filter(|key| !current.contains_key(*key))
            .cloned(),
    );
    changed.sort();
    changed
}
