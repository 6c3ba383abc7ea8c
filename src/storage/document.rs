//! Typed document access over the KV store
//!
//! Wraps a [`KvStore`] with per-document async mutexes so concurrent
//! handlers cannot interleave read-modify-write sequences on the same
//! document, and with the degradation policy the repositories rely on:
//! reads fall back to the caller's `Default`, failed writes are logged and
//! swallowed.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, warn};

use super::kv::KvStore;

#[derive(Debug, Clone)]
pub struct DocumentStore {
    kv: KvStore,
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl DocumentStore {
    pub fn new(kv: KvStore) -> Self {
        Self {
            kv,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Load the document stored under `key`, falling back to `T::default()`
    /// on a missing key, a parse failure or an unreachable backend.
    pub async fn load<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        let value = match self.kv.get(key).await {
            Ok(Some(value)) => value,
            Ok(None) => return T::default(),
            Err(e) => {
                error!(key = key, error = %e, "Storage read failed, using default");
                return T::default();
            }
        };
        match serde_json::from_value(value) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(key = key, error = %e, "Document failed to deserialize, using default");
                T::default()
            }
        }
    }

    /// Persist `value` under `key`. Failures are logged and swallowed; the
    /// next successful write restores consistency.
    pub async fn save<T: Serialize>(&self, key: &str, value: &T) {
        let json = match serde_json::to_value(value) {
            Ok(json) => json,
            Err(e) => {
                error!(key = key, error = %e, "Document failed to serialize, write dropped");
                return;
            }
        };
        if let Err(e) = self.kv.set(key, &json).await {
            error!(key = key, error = %e, "Storage write failed, write dropped");
        }
    }

    /// Read-modify-write `key` under its document lock.
    ///
    /// Returns whatever the closure returns, letting callers thread out
    /// typed outcomes from the locked section.
    pub async fn update<T, R>(&self, key: &str, f: impl FnOnce(&mut T) -> R) -> R
    where
        T: DeserializeOwned + Default + Serialize,
    {
        let lock = self.lock_for(key).await;
        let _guard = lock.lock().await;

        let mut doc: T = self.load(key).await;
        let result = f(&mut doc);
        self.save(key, &doc).await;
        result
    }
}
