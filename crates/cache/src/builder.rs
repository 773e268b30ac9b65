use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use crate::array_cache::ArrayTtlCache;
use crate::errors::CacheError;
use crate::hooks::{EvictHook, Loader, NoopEvict};
use crate::ttl_cache::TtlCache;

/// Collects cache options; defaults are resolved here once, not per call.
pub struct CacheBuilder<K, V> {
    lifetime: Duration,
    loader: Arc<dyn Loader<K, V>>,
    on_evict: Arc<dyn EvictHook<K, V>>,
}

impl<K, V> CacheBuilder<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(lifetime: Duration, loader: Arc<dyn Loader<K, V>>) -> Self {
        Self { lifetime, loader, on_evict: Arc::new(NoopEvict) }
    }

    /// Replace the loader used to fill misses.
    pub fn loader<L>(mut self, loader: L) -> Self
    where
        L: Loader<K, V> + 'static,
    {
        self.loader = Arc::new(loader);
        self
    }

    /// Cleanup run for every entry the sweep evicts.
    pub fn on_evict<H>(mut self, hook: H) -> Self
    where
        H: EvictHook<K, V> + 'static,
    {
        self.on_evict = Arc::new(hook);
        self
    }

    /// Validate the lifetime and start the sweep task.
    pub fn build(self) -> Result<TtlCache<K, V>, CacheError> {
        TtlCache::start(self.lifetime, self.loader, self.on_evict)
    }
}

impl<K, T> CacheBuilder<K, Vec<T>>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn build_array(self) -> Result<ArrayTtlCache<K, T>, CacheError> {
        self.build().map(ArrayTtlCache::from)
    }
}
