//! Typed, observable key-value preferences
//!
//! The preference system provides:
//! - Typed handles (string, int, long, float, boolean, string set, objects)
//! - Default values for keys that were never written
//! - Change streams that re-read the stored value on every mutation
//! - One shared backend listener per store, held only while observed
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use futures::StreamExt;
//! use roadrater::preferences::PreferenceStore;
//!
//! let store = PreferenceStore::in_memory();
//! let volume = store.get_int("volume", 50);
//!
//! let mut changes = volume.observe();
//! assert_eq!(changes.next().await.transpose()?, Some(50));
//!
//! volume.write(80).await?;
//! assert_eq!(changes.next().await.transpose()?, Some(80));
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod key_flow;
pub mod memory;
pub mod preference;
pub mod sqlite;
pub mod store;
pub mod value;

pub use backend::{ChangeListener, KeyChange, ListenerId, PreferenceBackend};
pub use key_flow::{KeyFlow, KeySubscription};
pub use memory::MemoryBackend;
pub use preference::{ObjectAdapter, Preference, PreferenceAdapter};
pub use sqlite::{ExternalWatch, SqliteBackend};
pub use store::PreferenceStore;
pub use value::{PrimitiveValue, RawValue, ValueKind};
