//! Population and eviction callbacks.
//!
//! Both traits have blanket impls for async closures, so callers can pass
//! `|key| async move { ... }` directly to the builder.

use async_trait::async_trait;
use std::future::Future;

/// Produces the value for a missing key. May perform I/O.
#[async_trait]
pub trait Loader<K, V>: Send + Sync {
    async fn load(&self, key: &K) -> anyhow::Result<V>;
}

/// Cleanup invoked with each entry the sweep evicts.
#[async_trait]
pub trait EvictHook<K, V>: Send + Sync {
    async fn on_evict(&self, key: K, value: V) -> anyhow::Result<()>;
}

/// Loader used when none is configured: yields `V::default()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultLoader;

#[async_trait]
impl<K, V> Loader<K, V> for DefaultLoader
where
    K: Sync + 'static,
    V: Default + Send + 'static,
{
    async fn load(&self, _key: &K) -> anyhow::Result<V> {
        Ok(V::default())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEvict;

#[async_trait]
impl<K, V> EvictHook<K, V> for NoopEvict
where
    K: Send + 'static,
    V: Send + 'static,
{
    async fn on_evict(&self, _key: K, _value: V) -> anyhow::Result<()> {
        Ok(())
    }
}

#[async_trait]
impl<K, V, F, Fut> Loader<K, V> for F
where
    K: Clone + Send + Sync + 'static,
    V: Send + 'static,
    F: Fn(K) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
{
    async fn load(&self, key: &K) -> anyhow::Result<V> {
        (self)(key.clone()).await
    }
}

#[async_trait]
impl<K, V, F, Fut> EvictHook<K, V> for F
where
    K: Send + 'static,
    V: Send + 'static,
    F: Fn(K, V) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn on_evict(&self, key: K, value: V) -> anyhow::Result<()> {
        (self)(key, value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn closures_act_as_hooks() -> anyhow::Result<()> {
        let loader = |key: String| async move { Ok::<_, anyhow::Error>(key.len()) };
        assert_eq!(Loader::<String, usize>::load(&loader, &"four".to_string()).await?, 4);

        let default: u32 = Loader::<String, u32>::load(&DefaultLoader, &"x".to_string()).await?;
        assert_eq!(default, 0);

        let hook = |_key: String, value: usize| async move {
            anyhow::ensure!(value > 0, "empty value");
            Ok(())
        };
        assert!(EvictHook::on_evict(&hook, "a".to_string(), 1usize).await.is_ok());
        assert!(EvictHook::on_evict(&hook, "b".to_string(), 0usize).await.is_err());
        Ok(())
    }
}
