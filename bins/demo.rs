use std::time::Duration;

use cache::{ArrayTtlCache, TtlCache};
use common::keys;
use configs::AppConfig;
use dotenvy::dotenv;
use serde_json::json;
use service::{LockedJsonStore, StoreOptions};
use tracing::{error, info, warn};
use uuid::Uuid;

fn load_config() -> (AppConfig, Option<anyhow::Error>) {
    match AppConfig::load_and_validate() {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    }
}

/// Exercise both caches and the store once, the way a worker process would.
async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let lifetime = cfg.cache.lifetime();

    let quotes = TtlCache::<String, f64>::with_loader(lifetime, |key: String| async move {
        let parts = keys::split(&key);
        anyhow::ensure!(parts.len() == 2, "quote key must be venue#symbol, got {key}");
        // stand-in for a network fetch
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(parts[1].len() as f64 * 1.5)
    })
    .on_evict(|key: String, price: f64| async move {
        info!(event = "quote_evicted", %key, price, "quote expired");
        Ok::<_, anyhow::Error>(())
    })
    .build()?;

    let key = keys::try_join(&["dex", "SOL"])?;
    let (a, b) = tokio::join!(quotes.get(&key), quotes.get(&key));
    let (first, second) = (a?, b?);
    info!(event = "quote_loaded", %key, first, second, cached = quotes.len(), "quotes ready");

    let pending: ArrayTtlCache<String, u64> = ArrayTtlCache::builder(lifetime).build_array()?;
    let wallet = keys::join(&["pending", "main"]);
    pending.push(wallet.clone(), 1);
    pending.push_array(&wallet, [2, 3, 4])?;
    let settled = pending.drop_array(&wallet, &[2, 4]);
    let remaining = pending.get(&wallet).await?;
    info!(event = "pending_settled", ?settled, ?remaining, "pending orders updated");

    let store: LockedJsonStore = LockedJsonStore::open(
        &cfg.store.path,
        StoreOptions { debounce: cfg.store.debounce(), lock_timeout: cfg.store.lock_timeout() },
    )
    .await?;
    if tokio::fs::metadata(store.path()).await.is_err() {
        tokio::fs::write(store.path(), b"{\"runs\":0}").await?;
    }

    let mut workers = Vec::new();
    for worker in 0..3u64 {
        let store = store.clone();
        workers.push(tokio::spawn(async move {
            let mut doc = store.get(true).await?;
            let runs = doc.get("runs").and_then(|v| v.as_u64()).unwrap_or(0) + 1;
            if let Some(fields) = doc.as_object_mut() {
                fields.insert("runs".into(), json!(runs));
                fields.insert("last_worker".into(), json!(worker));
            }
            store.set(doc, false).await?;
            Ok::<_, service::StoreError>(runs)
        }));
    }
    for handle in workers {
        let runs = handle.await??;
        info!(event = "store_updated", runs, "run counter bumped");
    }

    store.flush().await?;
    info!(event = "store_flushed", path = %store.path().display(), saves = store.save_count(), "state persisted");

    quotes.shutdown();
    pending.shutdown();
    Ok(())
}

fn main() -> std::process::ExitCode {
    dotenv().ok();
    let (cfg, cfg_err) = load_config();
    common::utils::logging::init_logging(&cfg.logging.format);
    if let Some(e) = cfg_err {
        warn!(event = "config_fallback", error = %e, "config not loaded, using defaults");
    }

    let run_id = Uuid::new_v4();
    std::panic::set_hook(Box::new(move |info| {
        error!(event = "panic", %run_id, message = %info, "unhandled panic occurred");
    }));

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return std::process::ExitCode::FAILURE;
        }
    };

    info!(event = "start", %run_id, pid = std::process::id(), version = env!("CARGO_PKG_VERSION"), "demo starting");
    rt.block_on(async move {
        tokio::select! {
            res = run(cfg) => match res {
                Ok(()) => {
                    info!(event = "stop", %run_id, "demo finished");
                    std::process::ExitCode::SUCCESS
                }
                Err(e) => {
                    error!(event = "run_failed", error = %e, "demo failed");
                    std::process::ExitCode::FAILURE
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!(event = "shutdown_signal", %run_id, "received Ctrl+C, shutting down");
                std::process::ExitCode::SUCCESS
            }
        }
    })
}
