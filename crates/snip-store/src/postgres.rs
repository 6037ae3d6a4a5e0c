use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use snip_types::Key;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info};

use crate::error::{BackendKind, StoreError, StoreResult};
use crate::traits::{with_timeout, KeyValueStore};

fn pg_err(e: sqlx::Error) -> StoreError {
    StoreError::backend(BackendKind::Postgres, e)
}

/// Accept `name` or `schema.name` made of ASCII letters, digits and `_`.
///
/// The table name is spliced into SQL text, so anything else is refused.
pub fn validate_table_name(table: &str) -> StoreResult<()> {
    let valid_part = |part: &str| {
        let mut chars = part.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    };
    let parts: Vec<&str> = table.split('.').collect();
    if parts.len() <= 2 && parts.iter().all(|p| valid_part(p)) {
        Ok(())
    } else {
        Err(StoreError::Config(format!("invalid table name: {table:?}")))
    }
}

/// PostgreSQL table store.
///
/// Rows live in `<table> (id BYTEA PRIMARY KEY, value BYTEA NOT NULL)`. The
/// primary key's unique index enforces insert-if-absent: a unique violation
/// (SQLSTATE 23505) becomes [`StoreError::DuplicateKey`].
///
/// Connections come from a bounded `PgPool`; a connection is returned to the
/// pool when the query future completes or is dropped.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
    table: String,
    timeout: Duration,
    insert_sql: String,
    select_sql: String,
}

impl PostgresStore {
    /// Connect a pool to `url` and verify it with `SELECT 1`.
    ///
    /// The table must already exist; see [`PostgresStore::ensure_table`].
    pub async fn connect(
        url: &str,
        table: &str,
        max_connections: u32,
        timeout: Duration,
    ) -> StoreResult<Self> {
        validate_table_name(table)?;
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(timeout)
            .connect(url)
            .await
            .map_err(pg_err)?;
        let store = Self::from_pool(pool, table, timeout)?;
        store.ping().await?;
        info!(table, max_connections, "connected to postgres");
        Ok(store)
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool, table: &str, timeout: Duration) -> StoreResult<Self> {
        validate_table_name(table)?;
        Ok(Self {
            pool,
            table: table.to_string(),
            timeout,
            insert_sql: format!("INSERT INTO {table} (id, value) VALUES ($1, $2)"),
            select_sql: format!("SELECT value FROM {table} WHERE id = $1"),
        })
    }

    /// Create the backing table if it does not exist.
    pub async fn ensure_table(&self) -> StoreResult<()> {
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} (id BYTEA PRIMARY KEY, value BYTEA NOT NULL)",
            self.table
        );
        with_timeout(BackendKind::Postgres, self.timeout, async {
            sqlx::query(&ddl)
                .execute(&self.pool)
                .await
                .map_err(pg_err)?;
            Ok(())
        })
        .await
    }

    /// Round-trip a trivial query.
    pub async fn ping(&self) -> StoreResult<()> {
        with_timeout(BackendKind::Postgres, self.timeout, async {
            let _: i32 = sqlx::query_scalar("SELECT 1")
                .fetch_one(&self.pool)
                .await
                .map_err(pg_err)?;
            Ok(())
        })
        .await
    }

    /// Name of the backing table.
    pub fn table(&self) -> &str {
        &self.table
    }
}

#[async_trait]
impl KeyValueStore for PostgresStore {
    async fn insert(&self, key: &Key, payload: &[u8]) -> StoreResult<()> {
        let result = with_timeout(BackendKind::Postgres, self.timeout, async {
            Ok(sqlx::query(&self.insert_sql)
                .bind(key.as_bytes())
                .bind(payload)
                .execute(&self.pool)
                .await)
        })
        .await?;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                debug!(%key, table = %self.table, "unique violation on insert");
                Err(StoreError::DuplicateKey(*key))
            }
            Err(e) => Err(pg_err(e)),
        }
    }

    async fn get(&self, key: &Key) -> StoreResult<Bytes> {
        let row: Option<Vec<u8>> = with_timeout(BackendKind::Postgres, self.timeout, async {
            sqlx::query_scalar(&self.select_sql)
                .bind(key.as_bytes())
                .fetch_optional(&self.pool)
                .await
                .map_err(pg_err)
        })
        .await?;

        row.map(Bytes::from)
            .ok_or(StoreError::KeyNotFound(*key))
    }

    fn backend(&self) -> BackendKind {
        BackendKind::Postgres
    }
}

impl std::fmt::Debug for PostgresStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresStore")
            .field("table", &self.table)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names() {
        assert!(validate_table_name("urls").is_ok());
        assert!(validate_table_name("_urls_2").is_ok());
        assert!(validate_table_name("public.urls").is_ok());

        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("2urls").is_err());
        assert!(validate_table_name("urls; DROP TABLE x").is_err());
        assert!(validate_table_name("a.b.c").is_err());
        assert!(validate_table_name("url-s").is_err());
    }

    #[tokio::test]
    async fn bad_table_rejected_before_connecting() {
        let err = PostgresStore::connect(
            "postgres://localhost/none",
            "bad name",
            1,
            Duration::from_millis(100),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }
}
