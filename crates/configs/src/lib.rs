use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub store: StoreSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `compact` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { format: default_log_format() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_lifetime_ms")]
    pub lifetime_ms: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { lifetime_ms: default_lifetime_ms() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Upper bound on waiting for the advisory lock; unbounded when absent.
    #[serde(default)]
    pub lock_timeout_ms: Option<u64>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            debounce_ms: default_debounce_ms(),
            lock_timeout_ms: None,
        }
    }
}

fn default_log_format() -> String { "compact".into() }
fn default_lifetime_ms() -> u64 { 60_000 }
fn default_store_path() -> PathBuf { PathBuf::from("data/state.json") }
fn default_debounce_ms() -> u64 { 1_000 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.logging.normalize();
        self.cache.validate()?;
        self.store.validate()?;
        Ok(())
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        let format = self.format.trim().to_lowercase();
        self.format = if format == "json" { format } else { default_log_format() };
    }
}

impl CacheSettings {
    pub fn validate(&self) -> Result<()> {
        // the sweep runs every lifetime / 10, which must stay non-zero
        if self.lifetime_ms == 0 {
            return Err(anyhow!("cache.lifetime_ms must be > 0"));
        }
        Ok(())
    }

    pub fn lifetime(&self) -> Duration {
        Duration::from_millis(self.lifetime_ms)
    }
}

impl StoreSettings {
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(anyhow!("store.path is empty"));
        }
        if self.debounce_ms == 0 {
            return Err(anyhow!("store.debounce_ms must be > 0"));
        }
        if self.lock_timeout_ms == Some(0) {
            return Err(anyhow!("store.lock_timeout_ms must be > 0 when set"));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout_ms.map(Duration::from_millis)
    }
}
