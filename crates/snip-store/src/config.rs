use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BackendKind, StoreResult};
use crate::files::FileStore;
use crate::memory::InMemoryStore;
use crate::postgres::PostgresStore;
use crate::redis_store::RedisStore;
use crate::traits::KeyValueStore;

const DEFAULT_TIMEOUT_MS: u64 = 5_000;

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_max_connections() -> u32 {
    10
}

/// Backend selection and its connection parameters.
///
/// In TOML the backend is chosen by the `backend` key:
///
/// ```toml
/// [store]
/// backend = "postgres"
/// url = "postgres://snip@localhost/snip"
/// table = "urls"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "kebab-case")]
pub enum StoreConfig {
    /// One file per key in `dir`.
    Files {
        dir: PathBuf,
        #[serde(default = "default_timeout_ms")]
        timeout_ms: u64,
    },
    /// Process-local map. Data is lost on exit.
    Memory,
    /// Redis server, e.g. `redis://127.0.0.1:6379/0`.
    #[serde(alias = "external-cache")]
    Redis {
        url: String,
        #[serde(default = "default_timeout_ms")]
        timeout_ms: u64,
    },
    /// PostgreSQL table with a unique primary key on `id`.
    #[serde(alias = "external-table")]
    Postgres {
        url: String,
        table: String,
        #[serde(default = "default_max_connections")]
        max_connections: u32,
        #[serde(default = "default_timeout_ms")]
        timeout_ms: u64,
        /// Run `CREATE TABLE IF NOT EXISTS` when opening.
        #[serde(default)]
        create_table: bool,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::Files {
            dir: PathBuf::from("_storage"),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl StoreConfig {
    /// The backend this configuration selects.
    pub fn backend(&self) -> BackendKind {
        match self {
            Self::Files { .. } => BackendKind::Files,
            Self::Memory => BackendKind::Memory,
            Self::Redis { .. } => BackendKind::Redis,
            Self::Postgres { .. } => BackendKind::Postgres,
        }
    }

    /// Per-operation timeout. The memory backend never blocks on I/O.
    pub fn timeout(&self) -> Option<Duration> {
        match self {
            Self::Files { timeout_ms, .. }
            | Self::Redis { timeout_ms, .. }
            | Self::Postgres { timeout_ms, .. } => Some(Duration::from_millis(*timeout_ms)),
            Self::Memory => None,
        }
    }
}

/// Construct the configured backend.
///
/// External backends are contacted once so a misconfigured address fails at
/// startup rather than on the first request.
pub async fn open_store(config: &StoreConfig) -> StoreResult<Arc<dyn KeyValueStore>> {
    let timeout = config
        .timeout()
        .unwrap_or(Duration::from_millis(DEFAULT_TIMEOUT_MS));
    let store: Arc<dyn KeyValueStore> = match config {
        StoreConfig::Files { dir, .. } => Arc::new(FileStore::open(dir, timeout)?),
        StoreConfig::Memory => Arc::new(InMemoryStore::new()),
        StoreConfig::Redis { url, .. } => Arc::new(RedisStore::connect(url, timeout).await?),
        StoreConfig::Postgres {
            url,
            table,
            max_connections,
            create_table,
            ..
        } => {
            let store = PostgresStore::connect(url, table, *max_connections, timeout).await?;
            if *create_table {
                store.ensure_table().await?;
            }
            Arc::new(store)
        }
    };
    tracing::info!(backend = %store.backend(), "store ready");
    Ok(store)
}
