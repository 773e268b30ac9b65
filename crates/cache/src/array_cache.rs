use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

use crate::builder::CacheBuilder;
use crate::entry::CacheEntry;
use crate::errors::CacheError;
use crate::ttl_cache::TtlCache;

/// TTL cache whose slots hold growable lists.
///
/// Wraps a [`TtlCache`] over `Vec<T>`, so lookup and eviction behave exactly
/// like the scalar cache. Appending re-stamps the slot; dropping items does not.
pub struct ArrayTtlCache<K, T> {
    cache: TtlCache<K, Vec<T>>,
}

impl<K, T> From<TtlCache<K, Vec<T>>> for ArrayTtlCache<K, T> {
    fn from(cache: TtlCache<K, Vec<T>>) -> Self {
        Self { cache }
    }
}

impl<K, T> ArrayTtlCache<K, T>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Builder whose misses resolve to an empty list.
    pub fn builder(lifetime: Duration) -> CacheBuilder<K, Vec<T>> {
        TtlCache::builder(lifetime)
    }

    /// Append one item, creating the list if the key is absent.
    pub fn push(&self, key: K, item: T) {
        let mut entry = self
            .cache
            .shared
            .entries
            .entry(key)
            .or_insert_with(|| CacheEntry::new(Vec::new()));
        entry.value.push(item);
        entry.touch();
    }

    /// Append several items to an existing list.
    ///
    /// The key must have been pushed or added before; an absent key is a
    /// usage error rather than an implicit create.
    pub fn push_array(&self, key: &K, items: impl IntoIterator<Item = T>) -> Result<(), CacheError> {
        let mut entry = self
            .cache
            .shared
            .entries
            .get_mut(key)
            .ok_or_else(|| CacheError::uninitialized(key))?;
        entry.value.extend(items);
        entry.touch();
        Ok(())
    }

    /// Remove every occurrence of `item`. No-op when the key is absent.
    pub fn drop_item(&self, key: &K, item: &T) {
        if let Some(mut entry) = self.cache.shared.entries.get_mut(key) {
            entry.value.retain(|stored| stored != item);
        }
    }

    /// Remove every stored element that appears in `items`.
    ///
    /// The cache keeps the complement; the return value is what was removed,
    /// in stored order, so callers can inspect which requested items were
    /// actually present.
    pub fn drop_array(&self, key: &K, items: &[T]) -> Vec<T> {
        let Some(mut entry) = self.cache.shared.entries.get_mut(key) else {
            return Vec::new();
        };
        let (removed, kept): (Vec<T>, Vec<T>) =
            std::mem::take(&mut entry.value).into_iter().partition(|stored| items.contains(stored));
        entry.value = kept;
        removed
    }

    pub async fn get(&self, key: &K) -> Result<Vec<T>, CacheError> {
        self.cache.get(key).await
    }

    pub fn exists(&self, key: &K) -> bool {
        self.cache.exists(key)
    }

    pub fn add(&self, key: K, items: Vec<T>) {
        self.cache.add(key, items)
    }

    pub fn remove(&self, key: &K) -> Option<Vec<T>> {
        self.cache.remove(key)
    }

    pub fn refresh(&self, key: &K) -> bool {
        self.cache.refresh(key)
    }

    pub fn remove_oldest(&self) -> Option<(K, Vec<T>)> {
        self.cache.remove_oldest()
    }

    pub fn evict_expired(&self) -> usize {
        self.cache.evict_expired()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn shutdown(&self) {
        self.cache.shutdown()
    }

    /// The underlying scalar cache.
    pub fn inner(&self) -> &TtlCache<K, Vec<T>> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn cache() -> ArrayTtlCache<String, u32> {
        ArrayTtlCache::builder(Duration::from_secs(60)).build_array().unwrap()
    }

    #[tokio::test]
    async fn push_then_drop_returns_to_empty() -> anyhow::Result<()> {
        let cache = cache();
        cache.push("k".into(), 5);
        assert_eq!(cache.get(&"k".into()).await?, vec![5]);

        cache.drop_item(&"k".into(), &5);
        assert_eq!(cache.get(&"k".into()).await?, Vec::<u32>::new());
        Ok(())
    }

    #[tokio::test]
    async fn drop_item_removes_all_occurrences() -> anyhow::Result<()> {
        let cache = cache();
        cache.add("k".into(), vec![1, 2, 1, 3, 1]);
        cache.drop_item(&"k".into(), &1);
        assert_eq!(cache.get(&"k".into()).await?, vec![2, 3]);

        // absent keys are left alone
        cache.drop_item(&"missing".into(), &1);
        assert!(!cache.exists(&"missing".into()));
        Ok(())
    }

    #[tokio::test]
    async fn drop_array_keeps_complement_and_returns_removed() -> anyhow::Result<()> {
        let cache = cache();
        cache.add("k".into(), vec![1, 2, 3, 4]);

        let removed = cache.drop_array(&"k".into(), &[2, 4, 5]);
        assert_eq!(removed, vec![2, 4]);
        assert_eq!(cache.get(&"k".into()).await?, vec![1, 3]);

        assert!(cache.drop_array(&"missing".into(), &[1]).is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn push_array_requires_existing_key() -> anyhow::Result<()> {
        let cache = cache();
        let err = cache.push_array(&"k".into(), vec![1, 2]).unwrap_err();
        assert!(matches!(err, CacheError::Uninitialized(_)));
        assert!(!cache.exists(&"k".into()));

        cache.push("k".into(), 0);
        cache.push_array(&"k".into(), vec![1, 2])?;
        assert_eq!(cache.get(&"k".into()).await?, vec![0, 1, 2]);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn pushes_keep_the_slot_alive() -> anyhow::Result<()> {
        let cache: ArrayTtlCache<String, u32> =
            ArrayTtlCache::builder(Duration::from_millis(100)).build_array()?;
        cache.push("busy".into(), 0);
        cache.push("idle".into(), 0);

        for i in 1..=4 {
            sleep(Duration::from_millis(60)).await;
            cache.push("busy".into(), i);
        }

        assert!(!cache.exists(&"idle".into()));
        assert_eq!(cache.get(&"busy".into()).await?, vec![0, 1, 2, 3, 4]);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn drops_do_not_restamp() -> anyhow::Result<()> {
        let cache: ArrayTtlCache<String, u32> =
            ArrayTtlCache::builder(Duration::from_millis(100)).build_array()?;
        cache.add("k".into(), vec![1, 2, 3]);

        sleep(Duration::from_millis(60)).await;
        cache.drop_item(&"k".into(), &1);
        cache.drop_array(&"k".into(), &[2]);

        sleep(Duration::from_millis(60)).await;
        assert!(!cache.exists(&"k".into()));
        Ok(())
    }
}
