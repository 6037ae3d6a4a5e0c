use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use snip_types::Key;

use crate::error::{BackendKind, StoreError, StoreResult};

/// Insert-if-absent key-value store.
///
/// All implementations must satisfy these invariants:
/// - At most one entry exists per key. A second `insert` for a stored key
///   fails with [`StoreError::DuplicateKey`] and never overwrites.
/// - `insert` is atomic against concurrent inserts of the same key: exactly
///   one racing caller succeeds and its payload is the one later returned.
/// - `get` observes every insert that completed before it started.
/// - Stored payloads are immutable. There is no update or delete path.
/// - Backend faults are returned unmodified and are never retried here.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Store `payload` under `key` if no entry exists yet.
    ///
    /// The store keeps its own copy; the caller may reuse `payload` after
    /// this returns.
    async fn insert(&self, key: &Key, payload: &[u8]) -> StoreResult<()>;

    /// Fetch the payload stored under `key`.
    ///
    /// Returns [`StoreError::KeyNotFound`] if the key was never inserted.
    async fn get(&self, key: &Key) -> StoreResult<Bytes>;

    /// The backend behind this store.
    fn backend(&self) -> BackendKind;
}

/// Run `op`, failing with [`StoreError::Timeout`] if it does not finish
/// within `limit`.
pub(crate) async fn with_timeout<T, F>(
    backend: BackendKind,
    limit: Duration,
    op: F,
) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(limit, op).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(%backend, millis = limit.as_millis() as u64, "store operation timed out");
            Err(StoreError::Timeout {
                backend,
                millis: limit.as_millis() as u64,
            })
        }
    }
}
