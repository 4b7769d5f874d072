//! Storage layer for the skydeck console.
//!
//! Everything the console knows about a cloud account lives in a key-value
//! store: one JSON-encoded collection per resource kind, a separate
//! collection for servers the user created locally, and a handful of
//! scalar keys (active API mode, bearer token). The store itself is an
//! external collaborator and is assumed flaky — quota exceeded, disabled,
//! racing tabs — so [`ResourceStorage`] catches every failure and degrades
//! to an empty result instead of propagating.

pub mod keys;
pub mod models;
pub mod storage;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub use keys::ResourceKind;
pub use storage::ResourceStorage;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store quota exceeded for key {0}")]
    QuotaExceeded(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Minimal key-value store contract, modeled on browser session storage:
/// string keys, string values, origin-scoped, no transactions.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    fn keys(&self) -> Result<Vec<String>>;
}

/// In-memory [`KeyValueStore`] backed by a mutex-guarded map.
///
/// Cloning shares the underlying map, so a clone handed to another
/// component observes the same data. `fail_writes` / `fail_reads` flip the
/// store into a degraded mode for exercising fail-soft paths.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    data: HashMap<String, String>,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with a quota error.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.lock().expect("store mutex poisoned").fail_writes = fail;
    }

    /// Make every subsequent read fail as if the store were disabled.
    pub fn fail_reads(&self, fail: bool) {
        self.inner.lock().expect("store mutex poisoned").fail_reads = fail;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryStoreInner> {
        self.inner.lock().expect("store mutex poisoned")
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let inner = self.lock();
        if inner.fail_reads {
            return Err(Error::Unavailable("reads disabled".into()));
        }
        Ok(inner.data.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut inner = self.lock();
        if inner.fail_writes {
            return Err(Error::QuotaExceeded(key.to_string()));
        }
        inner.data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut inner = self.lock();
        if inner.fail_writes {
            return Err(Error::QuotaExceeded(key.to_string()));
        }
        inner.data.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let inner = self.lock();
        if inner.fail_reads {
            return Err(Error::Unavailable("reads disabled".into()));
        }
        Ok(inner.data.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn clones_share_data() {
        let store = MemoryStore::new();
        let clone = store.clone();
        store.set("shared", "yes").unwrap();
        assert_eq!(clone.get("shared").unwrap().as_deref(), Some("yes"));
    }

    #[test]
    fn degraded_modes_error() {
        let store = MemoryStore::new();
        store.set("k", "v").unwrap();

        store.fail_writes(true);
        assert!(store.set("k", "v2").is_err());
        assert!(store.remove("k").is_err());

        store.fail_reads(true);
        assert!(store.get("k").is_err());
        assert!(store.keys().is_err());
    }
}
