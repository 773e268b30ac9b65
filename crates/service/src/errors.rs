use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store {0} is not locked; call get(lock = true) before set")]
    NotLocked(String),
    #[error("timed out after {0:?} waiting for the store lock")]
    LockTimeout(Duration),
    #[error("store lock was closed")]
    LockClosed,
    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed json in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot serialize store contents: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("store setup failed: {0}")]
    Setup(#[source] anyhow::Error),
}

impl StoreError {
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io { path: path.display().to_string(), source }
    }
}
