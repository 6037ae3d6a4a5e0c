use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use snip_types::Key;

use crate::error::{BackendKind, StoreError, StoreResult};
use crate::traits::KeyValueStore;

/// In-memory, HashMap-based store.
///
/// Intended for tests, benchmarks and single-process deployments that accept
/// losing their data on restart. The check-then-insert runs under one write
/// lock, so racing inserts of the same key cannot both succeed.
pub struct InMemoryStore {
    entries: RwLock<HashMap<Key, Bytes>>,
}

impl InMemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::backend(BackendKind::Memory, format!("lock poisoned: {e}"))
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn insert(&self, key: &Key, payload: &[u8]) -> StoreResult<()> {
        let mut map = self.entries.write().map_err(poisoned)?;
        if map.contains_key(key) {
            return Err(StoreError::DuplicateKey(*key));
        }
        // Copy so later mutation of the caller's buffer cannot reach the store.
        map.insert(*key, Bytes::copy_from_slice(payload));
        Ok(())
    }

    async fn get(&self, key: &Key) -> StoreResult<Bytes> {
        let map = self.entries.read().map_err(poisoned)?;
        map.get(key)
            .cloned()
            .ok_or(StoreError::KeyNotFound(*key))
    }

    fn backend(&self) -> BackendKind {
        BackendKind::Memory
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("entry_count", &self.len())
            .finish()
    }
}
