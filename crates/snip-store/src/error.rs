use std::fmt;

use serde::{Deserialize, Serialize};
use snip_types::{ErrorKind, Key};

/// Which backend produced a store error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    Files,
    Memory,
    Redis,
    Postgres,
}

impl BackendKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Files => "files",
            Self::Memory => "memory",
            Self::Redis => "redis",
            Self::Postgres => "postgres",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors from key-value store operations.
///
/// `DuplicateKey` and `KeyNotFound` are expected outcomes callers branch on.
/// Everything else is a backend fault, surfaced as-is and never retried by
/// the store itself.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An entry already exists under the key. The stored payload is unchanged.
    #[error("duplicate key: {0}")]
    DuplicateKey(Key),

    /// No entry exists under the key.
    #[error("key not found: {0}")]
    KeyNotFound(Key),

    /// Connectivity, protocol or engine failure in an external backend.
    #[error("{backend} backend error: {source}")]
    Backend {
        backend: BackendKind,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// I/O error from the filesystem backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The operation exceeded the backend's configured timeout.
    #[error("{backend} operation timed out after {millis} ms")]
    Timeout { backend: BackendKind, millis: u64 },

    /// The backend configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),
}

impl StoreError {
    pub(crate) fn backend(
        backend: BackendKind,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Backend {
            backend,
            source: source.into(),
        }
    }

    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateKey(_) => ErrorKind::DuplicateKey,
            Self::KeyNotFound(_) => ErrorKind::KeyNotFound,
            Self::Backend { .. } | Self::Io(_) | Self::Timeout { .. } | Self::Config(_) => {
                ErrorKind::Backend
            }
        }
    }

    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
