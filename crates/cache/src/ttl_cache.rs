use dashmap::DashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::builder::CacheBuilder;
use crate::entry::CacheEntry;
use crate::errors::CacheError;
use crate::hooks::{DefaultLoader, EvictHook, Loader};

/// The sweep runs every `lifetime / SWEEP_DIVISOR`. A stale entry therefore
/// outlives its lifetime by at most a tenth of it, and a sweep costs one scan
/// of the map per tick.
pub const SWEEP_DIVISOR: u32 = 10;

/// State shared between the cache handle and its sweep task.
pub(crate) struct CacheShared<K, V> {
    pub(crate) entries: DashMap<K, CacheEntry<V>>,
    pub(crate) lifetime: Duration,
    loader: Arc<dyn Loader<K, V>>,
    on_evict: Arc<dyn EvictHook<K, V>>,
}

impl<K, V> CacheShared<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Remove every expired entry and hand each one to the evict hook on its
    /// own task, so a slow or failing hook never holds up the rest.
    fn sweep(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<K> = self
            .entries
            .iter()
            .filter(|e| e.value().is_expired(now, self.lifetime))
            .map(|e| e.key().clone())
            .collect();

        let mut evicted = 0;
        for key in expired {
            // entry may have been refreshed or replaced since the scan
            let Some((key, entry)) = self
                .entries
                .remove_if(&key, |_, e| e.is_expired(now, self.lifetime))
            else {
                continue;
            };
            evicted += 1;
            let hook = Arc::clone(&self.on_evict);
            tokio::spawn(async move {
                let label = format!("{key:?}");
                if let Err(e) = hook.on_evict(key, entry.value).await {
                    warn!(key = %label, error = %e, "evict hook failed; entry already removed");
                }
            });
        }
        if evicted > 0 {
            debug!(evicted, remaining = self.entries.len(), "cache sweep");
        }
        evicted
    }
}

/// Keyed cache whose entries expire `lifetime` after they were last stamped.
///
/// Misses are filled by the configured [`Loader`]. A background task sweeps
/// the map every `lifetime / 10` and passes evicted entries to the
/// [`EvictHook`]. The task is stopped by [`TtlCache::shutdown`] or on drop.
pub struct TtlCache<K, V> {
    pub(crate) shared: Arc<CacheShared<K, V>>,
    sweeper: JoinHandle<()>,
    sweep_period: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Start building a cache whose misses resolve to `V::default()`.
    pub fn builder(lifetime: Duration) -> CacheBuilder<K, V>
    where
        V: Default,
    {
        CacheBuilder::new(lifetime, Arc::new(DefaultLoader))
    }

    /// Start building a cache populated by `loader`.
    pub fn with_loader<L>(lifetime: Duration, loader: L) -> CacheBuilder<K, V>
    where
        L: Loader<K, V> + 'static,
    {
        CacheBuilder::new(lifetime, Arc::new(loader))
    }

    pub(crate) fn start(
        lifetime: Duration,
        loader: Arc<dyn Loader<K, V>>,
        on_evict: Arc<dyn EvictHook<K, V>>,
    ) -> Result<Self, CacheError> {
        let sweep_period = lifetime / SWEEP_DIVISOR;
        if sweep_period.is_zero() {
            return Err(CacheError::InvalidLifetime(lifetime));
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| CacheError::NoRuntime)?;

        let shared = Arc::new(CacheShared { entries: DashMap::new(), lifetime, loader, on_evict });
        let sweeper = runtime.spawn(run_sweeper(Arc::downgrade(&shared), sweep_period));
        info!(?lifetime, ?sweep_period, "ttl cache started");
        Ok(Self { shared, sweeper, sweep_period })
    }

    /// Return the cached value, loading and storing it on a miss.
    ///
    /// Concurrent misses for the same key may each call the loader, but only
    /// the first result to land is stored; every caller gets that value.
    pub async fn get(&self, key: &K) -> Result<V, CacheError> {
        let cached = self.shared.entries.get(key).map(|e| e.value.clone());
        if let Some(value) = cached {
            return Ok(value);
        }

        let loaded = self
            .shared
            .loader
            .load(key)
            .await
            .map_err(|source| CacheError::Load { key: format!("{key:?}"), source })?;

        let mut raced = true;
        let value = self
            .shared
            .entries
            .entry(key.clone())
            .or_insert_with(|| {
                raced = false;
                CacheEntry::new(loaded)
            })
            .value
            .clone();
        if raced {
            debug!(?key, "populated concurrently; discarding loaded value");
        }
        Ok(value)
    }

    pub fn exists(&self, key: &K) -> bool {
        self.shared.entries.contains_key(key)
    }

    /// Insert or overwrite, bypassing the loader.
    pub fn add(&self, key: K, value: V) {
        self.shared.entries.insert(key, CacheEntry::new(value));
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.shared.entries.remove(key).map(|(_, e)| e.value)
    }

    /// Re-stamp an entry without reloading it. Returns `false` if absent.
    pub fn refresh(&self, key: &K) -> bool {
        match self.shared.entries.get_mut(key) {
            Some(mut entry) => {
                entry.touch();
                true
            }
            None => false,
        }
    }

    /// Remove the entry with the earliest stamp. The evict hook is not called.
    pub fn remove_oldest(&self) -> Option<(K, V)> {
        let (key, stamp) = self
            .shared
            .entries
            .iter()
            .min_by_key(|e| e.value().inserted_at())
            .map(|e| (e.key().clone(), e.value().inserted_at()))?;
        self.shared
            .entries
            .remove_if(&key, |_, e| e.inserted_at() == stamp)
            .map(|(k, e)| (k, e.value))
    }

    /// Run one sweep immediately; returns how many entries were evicted.
    pub fn evict_expired(&self) -> usize {
        self.shared.sweep()
    }

    pub fn len(&self) -> usize {
        self.shared.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.entries.is_empty()
    }

    pub fn lifetime(&self) -> Duration {
        self.shared.lifetime
    }

    pub fn sweep_period(&self) -> Duration {
        self.sweep_period
    }

    /// Whether the background sweep is still scheduled.
    pub fn is_running(&self) -> bool {
        !self.sweeper.is_finished()
    }

    /// Stop the background sweep. Entries stay readable but no longer expire
    /// unless [`TtlCache::evict_expired`] is called.
    pub fn shutdown(&self) {
        if !self.sweeper.is_finished() {
            self.sweeper.abort();
            info!(entries = self.len(), "ttl cache sweep stopped");
        }
    }
}

impl<K, V> Drop for TtlCache<K, V> {
    fn drop(&mut self) {
        self.sweeper.abort();
    }
}

async fn run_sweeper<K, V>(shared: Weak<CacheShared<K, V>>, period: Duration)
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let Some(shared) = shared.upgrade() else { break };
        shared.sweep();
    }
}
