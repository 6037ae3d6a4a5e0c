use std::sync::Arc;

use bytes::Bytes;
use rand::RngCore;
use snip_crypto::DigestFunction;
use snip_store::{KeyValueStore, StoreError, StoreResult};
use snip_types::Key;
use tracing::{debug, warn};

use crate::config::AssignConfig;
use crate::error::{AssignError, AssignResult};

/// Outcome of a successful assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Assignment {
    /// Key the payload is stored under.
    pub key: Key,
    /// Insert calls made, the successful one included.
    pub attempts: u32,
    /// `true` when an identical payload was already stored under `key` and
    /// no new entry was written.
    pub reused: bool,
}

/// Derives a key for each payload and stores the payload under it.
///
/// Attempt 1 digests the payload itself. When the store reports
/// `DuplicateKey`, a block of random bytes is appended to a scratch copy of
/// the payload and the digest is recomputed over the scratch buffer. The
/// suffix grows by one block per retry. The stored value is always the
/// original payload; the scratch buffer is only ever digest input.
///
/// Only `DuplicateKey` is retried. Any other store error ends the assignment
/// immediately and is returned unchanged.
pub struct Assigner {
    digest: Arc<dyn DigestFunction>,
    store: Arc<dyn KeyValueStore>,
    config: AssignConfig,
}

impl Assigner {
    /// Create an assigner. Fails if `config` is unusable.
    pub fn new(
        digest: Arc<dyn DigestFunction>,
        store: Arc<dyn KeyValueStore>,
        config: AssignConfig,
    ) -> AssignResult<Self> {
        config.validate()?;
        Ok(Self {
            digest,
            store,
            config,
        })
    }

    /// Store `payload` under a fresh key.
    ///
    /// The payload must already be validated.
    pub async fn assign(&self, payload: &[u8]) -> AssignResult<Assignment> {
        let max_attempts = self.config.max_attempts;
        let mut key = self.digest.digest(payload);
        let mut scratch: Option<Vec<u8>> = None;

        for attempt in 1..=max_attempts {
            match self.store.insert(&key, payload).await {
                Ok(()) => {
                    debug!(%key, attempt, backend = %self.store.backend(), "assigned key");
                    return Ok(Assignment {
                        key,
                        attempts: attempt,
                        reused: false,
                    });
                }
                Err(StoreError::DuplicateKey(_)) => {
                    if self.config.reuse_identical && self.holds_identical(&key, payload).await? {
                        debug!(%key, attempt, "payload already stored, reusing key");
                        return Ok(Assignment {
                            key,
                            attempts: attempt,
                            reused: true,
                        });
                    }
                    debug!(%key, attempt, "key collision");
                    if attempt == max_attempts {
                        break;
                    }
                    let input = scratch.get_or_insert_with(|| {
                        let mut buf = Vec::with_capacity(
                            payload.len() + self.config.entropy_bytes * 4,
                        );
                        buf.extend_from_slice(payload);
                        buf
                    });
                    append_entropy(input, self.config.entropy_bytes);
                    key = self.digest.digest(input);
                }
                Err(e) => {
                    warn!(%key, attempt, error = %e, "store failed during assignment");
                    return Err(e.into());
                }
            }
        }

        warn!(attempts = max_attempts, "no free key found");
        Err(AssignError::Exhausted {
            attempts: max_attempts,
        })
    }

    /// Fetch the payload stored under `key`.
    pub async fn resolve(&self, key: &Key) -> StoreResult<Bytes> {
        self.store.get(key).await
    }

    pub fn config(&self) -> &AssignConfig {
        &self.config
    }

    pub fn digest(&self) -> &Arc<dyn DigestFunction> {
        &self.digest
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    async fn holds_identical(&self, key: &Key, payload: &[u8]) -> AssignResult<bool> {
        match self.store.get(key).await {
            Ok(stored) => Ok(stored.as_ref() == payload),
            Err(StoreError::KeyNotFound(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for Assigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assigner")
            .field("digest", &self.digest.algorithm())
            .field("backend", &self.store.backend())
            .field("config", &self.config)
            .finish()
    }
}

fn append_entropy(buf: &mut Vec<u8>, n: usize) {
    let start = buf.len();
    buf.resize(start + n, 0);
    rand::thread_rng().fill_bytes(&mut buf[start..]);
}
