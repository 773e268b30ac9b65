use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::sync::{Mutex, OwnedSemaphorePermit, RwLock, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::errors::StoreError;

#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Quiet period after the last `set` before the file is written.
    pub debounce: Duration,
    /// Give up waiting for the advisory lock after this long.
    pub lock_timeout: Option<Duration>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self { debounce: Duration::from_secs(1), lock_timeout: None }
    }
}

struct StoreState<T> {
    file_path: PathBuf,
    options: StoreOptions,
    mirror: RwLock<Option<T>>,
    lock: Arc<Semaphore>,
    held: Mutex<Option<OwnedSemaphorePermit>>,
    pending: Mutex<Option<JoinHandle<()>>>,
    write_guard: Mutex<()>,
    saves: AtomicU64,
}

impl<T> StoreState<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    async fn load(&self) -> Result<T, StoreError> {
        if let Some(value) = self.mirror.read().await.as_ref() {
            return Ok(value.clone());
        }

        let mut mirror = self.mirror.write().await;
        if let Some(value) = mirror.as_ref() {
            return Ok(value.clone());
        }
        let bytes = fs::read(&self.file_path)
            .await
            .map_err(|e| StoreError::io(&self.file_path, e))?;
        let value: T = serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse {
            path: self.file_path.display().to_string(),
            source,
        })?;
        debug!(path = %self.file_path.display(), bytes = bytes.len(), "store mirror loaded");
        *mirror = Some(value.clone());
        Ok(value)
    }

    /// Overwrite the file with the current mirror via a temp file and rename.
    async fn persist(&self) -> Result<(), StoreError> {
        let _write = self.write_guard.lock().await;
        let data = {
            let mirror = self.mirror.read().await;
            match mirror.as_ref() {
                Some(value) => serde_json::to_vec_pretty(value).map_err(StoreError::Serialize)?,
                None => {
                    debug!(path = %self.file_path.display(), "nothing loaded; skipping save");
                    return Ok(());
                }
            }
        };

        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, &data)
            .await
            .map_err(|e| StoreError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &self.file_path)
            .await
            .map_err(|e| StoreError::io(&self.file_path, e))?;
        let saves = self.saves.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(path = %self.file_path.display(), bytes = data.len(), saves, "store saved");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.file_path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.file_path.with_file_name(name)
    }
}

/// One JSON document on disk with an in-memory mirror.
///
/// Callers doing read-modify-write take the advisory lock with
/// `get(true)`, then hand the new document to `set`, which releases the lock
/// unless asked to keep it. Writes are debounced: sets landing within the
/// debounce window produce a single write carrying the last payload.
///
/// The lock is in-process only and is not tied to a caller; it orders
/// cooperating tasks, waiters are served first come first served. A caller
/// that already holds it must not call `get(true)` again before releasing.
///
/// Clones share the same mirror, lock and timer. A save scheduled before the
/// last clone is dropped still runs.
pub struct LockedJsonStore<T = serde_json::Value> {
    state: Arc<StoreState<T>>,
}

impl<T> Clone for LockedJsonStore<T> {
    fn clone(&self) -> Self {
        Self { state: Arc::clone(&self.state) }
    }
}

impl<T> LockedJsonStore<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Prepare a store for `path`, creating its parent directory if missing.
    /// The file itself is read lazily on the first `get`.
    pub async fn open<P: Into<PathBuf>>(path: P, options: StoreOptions) -> Result<Self, StoreError> {
        let file_path = path.into();
        common::env::ensure_parent_dir(&file_path)
            .await
            .map_err(StoreError::Setup)?;
        info!(path = %file_path.display(), debounce = ?options.debounce, "json store opened");

        Ok(Self {
            state: Arc::new(StoreState {
                file_path,
                options,
                mirror: RwLock::new(None),
                lock: Arc::new(Semaphore::new(1)),
                held: Mutex::new(None),
                pending: Mutex::new(None),
                write_guard: Mutex::new(()),
                saves: AtomicU64::new(0),
            }),
        })
    }

    /// Return the document, reading the file only if nothing is mirrored yet.
    ///
    /// With `lock` set, waits for the advisory lock and keeps it after
    /// returning. If loading fails the lock is released again.
    pub async fn get(&self, lock: bool) -> Result<T, StoreError> {
        let permit = if lock { Some(self.acquire().await?) } else { None };
        let value = self.state.load().await?;
        if let Some(permit) = permit {
            *self.state.held.lock().await = Some(permit);
        }
        Ok(value)
    }

    /// Replace the document and schedule a debounced write.
    ///
    /// Fails with [`StoreError::NotLocked`] unless the lock is held. The lock
    /// stays held afterwards only when `lock` is true.
    pub async fn set(&self, data: T, lock: bool) -> Result<(), StoreError> {
        let mut held = self.state.held.lock().await;
        if held.is_none() {
            return Err(StoreError::NotLocked(self.state.file_path.display().to_string()));
        }

        *self.state.mirror.write().await = Some(data);
        self.schedule_save().await;

        if !lock {
            held.take();
            debug!(path = %self.state.file_path.display(), "store lock released");
        }
        Ok(())
    }

    /// Write the mirror to disk now. A pending debounced save is left alone.
    pub async fn save(&self) -> Result<(), StoreError> {
        self.state.persist().await
    }

    /// Cancel the pending debounced save and write immediately.
    pub async fn flush(&self) -> Result<(), StoreError> {
        if let Some(pending) = self.state.pending.lock().await.take() {
            pending.abort();
        }
        self.state.persist().await
    }

    /// Release a held lock without writing. Returns whether one was held.
    pub async fn unlock(&self) -> bool {
        self.state.held.lock().await.take().is_some()
    }

    pub fn is_locked(&self) -> bool {
        self.state.lock.available_permits() == 0
    }

    pub async fn has_pending_save(&self) -> bool {
        self.state
            .pending
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Completed writes since the store was opened.
    pub fn save_count(&self) -> u64 {
        self.state.saves.load(Ordering::SeqCst)
    }

    pub fn path(&self) -> &Path {
        &self.state.file_path
    }

    async fn acquire(&self) -> Result<OwnedSemaphorePermit, StoreError> {
        if self.is_locked() {
            debug!(path = %self.state.file_path.display(), "waiting for store lock");
        }
        let acquire = Arc::clone(&self.state.lock).acquire_owned();
        let permit = match self.state.options.lock_timeout {
            Some(limit) => tokio::time::timeout(limit, acquire)
                .await
                .map_err(|_| StoreError::LockTimeout(limit))?,
            None => acquire.await,
        };
        permit.map_err(|_| StoreError::LockClosed)
    }

    async fn schedule_save(&self) {
        let mut pending = self.state.pending.lock().await;
        if let Some(previous) = pending.take() {
            previous.abort();
        }

        let state = Arc::clone(&self.state);
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(state.options.debounce).await;
            // detached so that a later set can cancel the timer but never a
            // write that has already started
            let writer = Arc::clone(&state);
            let write = tokio::spawn(async move {
                if let Err(e) = writer.persist().await {
                    error!(path = %writer.file_path.display(), error = %e, "debounced save failed");
                }
            });
            if let Err(e) = write.await {
                error!(path = %state.file_path.display(), error = %e, "debounced save task aborted");
            }
        }));
    }
}
