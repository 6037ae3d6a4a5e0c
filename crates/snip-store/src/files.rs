use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use snip_types::{Key, UrlEncoding};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{BackendKind, StoreError, StoreResult};
use crate::traits::{with_timeout, KeyValueStore};

#[cfg(unix)]
const DIR_MODE: u32 = 0o700;

const TEMP_PREFIX: &str = ".snip-";
const TEMP_SUFFIX: &str = ".tmp";

/// One file per key inside a single directory.
///
/// A payload is written to a private temp file first and then published
/// under the key's name with `hard_link`, which fails if the name exists.
/// The link is the enforcement point for insert-if-absent, so several
/// processes may share one directory safely, and a reader only ever sees a
/// complete payload. The directory must live on a file system that supports
/// hard links.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    timeout: Duration,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>, timeout: Duration) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        let mut builder = std::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(DIR_MODE);
        }
        builder.create(&dir)?;
        debug!(dir = %dir.display(), "opened file store");
        Ok(Self { dir, timeout })
    }

    /// Root directory of the store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`.
    pub fn path_for(&self, key: &Key) -> PathBuf {
        self.dir
            .join(format!("{}.txt", UrlEncoding::Hex.encode_key(key)))
    }
}

/// Raises its flag when dropped. The blocking writer checks the flag before
/// publishing, so an insert that timed out or was cancelled never publishes
/// unless the link was already under way.
struct CancelFlag(Arc<AtomicBool>);

impl Drop for CancelFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Write `payload` to a temp file in `dir` and link it to `path`.
///
/// Runs on the blocking pool. The temp file is removed on every exit path.
/// Once `cancelled` is set the payload is never published.
fn write_and_publish(
    dir: &Path,
    path: &Path,
    key: &Key,
    payload: &[u8],
    cancelled: &AtomicBool,
) -> StoreResult<()> {
    if cancelled.load(Ordering::SeqCst) {
        return Err(abandoned());
    }
    // Skip the write for a name that is already taken. The link below still
    // decides races.
    if path.exists() {
        return Err(StoreError::DuplicateKey(*key));
    }
    // tempfile creates the file with mode 0600 on unix.
    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)?;
    tmp.as_file_mut().write_all(payload)?;
    tmp.as_file_mut().flush()?;

    if cancelled.load(Ordering::SeqCst) {
        return Err(abandoned());
    }
    let published = std::fs::hard_link(tmp.path(), path);
    if let Err(e) = tmp.close() {
        warn!(dir = %dir.display(), error = %e, "failed to remove temp file");
    }
    match published {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == IoErrorKind::AlreadyExists => Err(StoreError::DuplicateKey(*key)),
        Err(e) => Err(e.into()),
    }
}

fn abandoned() -> StoreError {
    std::io::Error::new(IoErrorKind::Interrupted, "insert abandoned before publish").into()
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn insert(&self, key: &Key, payload: &[u8]) -> StoreResult<()> {
        let dir = self.dir.clone();
        let path = self.path_for(key);
        let key = *key;
        let payload = payload.to_vec();
        // Dropped when this future finishes, times out or is cancelled.
        let guard = CancelFlag(Arc::new(AtomicBool::new(false)));
        let cancelled = Arc::clone(&guard.0);

        let task = tokio::task::spawn_blocking(move || {
            write_and_publish(&dir, &path, &key, &payload, &cancelled)
        });
        with_timeout(BackendKind::Files, self.timeout, async {
            task.await
                .map_err(|e| StoreError::backend(BackendKind::Files, e))
                .and_then(|result| result)
        })
        .await
    }

    async fn get(&self, key: &Key) -> StoreResult<Bytes> {
        let path = self.path_for(key);
        with_timeout(BackendKind::Files, self.timeout, async {
            match fs::read(&path).await {
                Ok(data) => Ok(Bytes::from(data)),
                Err(e) if e.kind() == IoErrorKind::NotFound => Err(StoreError::KeyNotFound(*key)),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    fn backend(&self) -> BackendKind {
        BackendKind::Files
    }
}
