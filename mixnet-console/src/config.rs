use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

pub const CONFIG_ENV: &str = "MIXNET_CONSOLE_CONFIG";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Root of the admin service, ex: "http://localhost:1887"
    pub base_url: String,
    /// Adapter id appended to every endpoint
    pub admin: String,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
    /// Locale tag, ex: "en_US"; falls back to LANG when unset
    pub locale: Option<String>,
    /// Extra `<locale>.yaml` bundles
    pub lang_dir: Option<PathBuf>,
    /// Drop detail responses older than the newest one applied to the node
    pub discard_stale_responses: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:1887".into(),
            admin: "mixnetadmin".into(),
            poll_interval_ms: 5000,
            request_timeout_ms: 10_000,
            locale: None,
            lang_dir: None,
            discard_stale_responses: false,
        }
    }
}

pub fn config_path() -> PathBuf {
    std::env::var(CONFIG_ENV).unwrap_or_else(|_| "console.yaml".into()).into()
}

/// Missing or empty file -> defaults; unreadable or invalid file -> logged, defaults.
pub async fn load_config_from(path: &Path) -> ConsoleConfig {
    if !path.exists() {
        info!("no {} found, using default config", path.display());
        return ConsoleConfig::default();
    }
    let txt = match fs::read_to_string(path).await {
        Ok(txt) => txt,
        Err(e) => {
            warn!("cannot read config {}: {e}", path.display());
            return ConsoleConfig::default();
        }
    };
    if txt.trim().is_empty() {
        return ConsoleConfig::default();
    }
    serde_yaml::from_str(&txt).unwrap_or_else(|e| {
        warn!("invalid config {}: {e}", path.display());
        ConsoleConfig::default()
    })
}

pub async fn load_config() -> ConsoleConfig {
    load_config_from(&config_path()).await
}
