use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use redis::aio::ConnectionManager;
use snip_types::Key;
use tracing::{debug, info};

use crate::error::{BackendKind, StoreError, StoreResult};
use crate::traits::{with_timeout, KeyValueStore};

fn redis_err(e: redis::RedisError) -> StoreError {
    StoreError::backend(BackendKind::Redis, e)
}

/// Redis-backed store.
///
/// Insert is `SET key value NX`; Redis executes it atomically, so the server
/// decides which of several racing inserts wins. The connection manager is a
/// multiplexed connection that reconnects on its own; each operation works on
/// a clone that is dropped when the operation ends, successful or not.
///
/// The logical database is chosen by the URL path, e.g. `redis://host/2`.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    timeout: Duration,
}

impl RedisStore {
    /// Connect to `url` and verify the server answers `PING`.
    pub async fn connect(url: &str, timeout: Duration) -> StoreResult<Self> {
        let client = redis::Client::open(url).map_err(redis_err)?;
        let conn = with_timeout(BackendKind::Redis, timeout, async {
            ConnectionManager::new(client).await.map_err(redis_err)
        })
        .await?;
        let store = Self { conn, timeout };
        store.ping().await?;
        info!(timeout_ms = timeout.as_millis() as u64, "connected to redis");
        Ok(store)
    }

    /// Round-trip a `PING`.
    pub async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        with_timeout(BackendKind::Redis, self.timeout, async move {
            let _: String = redis::cmd("PING")
                .query_async(&mut conn)
                .await
                .map_err(redis_err)?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn insert(&self, key: &Key, payload: &[u8]) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let reply: Option<String> = with_timeout(BackendKind::Redis, self.timeout, async {
            redis::cmd("SET")
                .arg(key.as_bytes())
                .arg(payload)
                .arg("NX")
                .query_async(&mut conn)
                .await
                .map_err(redis_err)
        })
        .await?;

        // A nil reply means NX refused the write because the key exists.
        match reply {
            Some(_) => Ok(()),
            None => {
                debug!(%key, "redis SET NX refused existing key");
                Err(StoreError::DuplicateKey(*key))
            }
        }
    }

    async fn get(&self, key: &Key) -> StoreResult<Bytes> {
        let mut conn = self.conn.clone();
        let reply: Option<Vec<u8>> = with_timeout(BackendKind::Redis, self.timeout, async {
            redis::cmd("GET")
                .arg(key.as_bytes())
                .query_async(&mut conn)
                .await
                .map_err(redis_err)
        })
        .await?;

        reply
            .map(Bytes::from)
            .ok_or(StoreError::KeyNotFound(*key))
    }

    fn backend(&self) -> BackendKind {
        BackendKind::Redis
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
