//! Insert-if-absent key-value storage for snip.
//!
//! A store maps a [`Key`](snip_types::Key) to an immutable payload and
//! guarantees that each key is inserted at most once, even under concurrent
//! inserts from many tasks or processes.
//!
//! # Storage Backends
//!
//! All backends implement the [`KeyValueStore`] trait:
//!
//! - [`FileStore`] -- one file per key, published by `hard_link` from a temp file
//! - [`InMemoryStore`] -- `HashMap` behind a `RwLock`, check-then-insert under the write lock
//! - [`RedisStore`] -- `SET NX` on a Redis server
//! - [`PostgresStore`] -- row insert guarded by the table's primary key
//!
//! [`open_store`] builds whichever backend a [`StoreConfig`] selects.
//!
//! # Design Rules
//!
//! 1. A key is written once. A second insert is `DuplicateKey`, never an overwrite.
//! 2. The backend's own primitive decides races, not a lock in the caller.
//! 3. `DuplicateKey` and `KeyNotFound` are outcomes; everything else is a backend fault.
//! 4. Backend faults are propagated unmodified and never retried here.

pub mod config;
pub mod error;
pub mod files;
pub mod memory;
pub mod postgres;
pub mod redis_store;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use config::{open_store, StoreConfig};
pub use error::{BackendKind, StoreError, StoreResult};
pub use files::FileStore;
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use redis_store::RedisStore;
pub use traits::KeyValueStore;
