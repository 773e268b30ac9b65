use std::time::Duration;

use cache::{ArrayTtlCache, TtlCache};
use common::keys;

#[tokio::test]
async fn loader_receives_composite_key_parts() -> anyhow::Result<()> {
    let cache = TtlCache::<String, String>::with_loader(Duration::from_secs(30), |key: String| async move {
        let parts = keys::split(&key);
        anyhow::ensure!(parts.len() == 2, "expected owner#asset, got {key}");
        Ok(format!("{} holds {}", parts[0], parts[1]))
    })
    .build()?;

    let key = keys::join(&["alice", "SOL"]);
    assert_eq!(cache.get(&key).await?, "alice holds SOL");

    let bad = keys::join(&["alice", "SOL", "extra"]);
    assert!(cache.get(&bad).await.is_err());
    assert!(!cache.exists(&bad));

    cache.shutdown();
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn array_cache_tracks_items_per_composite_key() -> anyhow::Result<()> {
    let cache: ArrayTtlCache<String, u64> =
        ArrayTtlCache::builder(Duration::from_millis(200)).build_array()?;
    let alice = keys::join(&["pending", "alice"]);
    let bob = keys::join(&["pending", "bob"]);

    cache.push(alice.clone(), 1);
    cache.push_array(&alice, [2, 3, 4])?;
    cache.push(bob.clone(), 10);

    let settled = cache.drop_array(&alice, &[3, 4, 99]);
    assert_eq!(settled, vec![3, 4]);
    assert_eq!(cache.get(&alice).await?, vec![1, 2]);

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(cache.is_empty());
    Ok(())
}
