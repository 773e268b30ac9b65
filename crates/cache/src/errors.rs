use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("invalid lifetime {0:?}: must leave a non-zero sweep period")]
    InvalidLifetime(Duration),
    #[error("key {0} was never initialized; push before push_array")]
    Uninitialized(String),
    #[error("loader failed for key {key}: {source}")]
    Load {
        key: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("cache must be built inside a tokio runtime")]
    NoRuntime,
}

impl CacheError {
    pub fn uninitialized<K: std::fmt::Debug>(key: &K) -> Self { Self::Uninitialized(format!("{key:?}")) }
}
