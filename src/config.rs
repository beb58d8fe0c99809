// src/config.rs
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

const ENV_CONFIG_PATH: &str = "MONITOR_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "config/monitor.toml";

fn default_interval_secs() -> u64 {
    30
}
fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Fixed period between cycles, in seconds.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_model")]
    pub model: String,
    /// "ENV" means: read from GEMINI_API_KEY.
    #[serde(default = "default_api_key")]
    pub api_key: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            model: default_model(),
            api_key: default_api_key(),
        }
    }
}

impl MonitorConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let cfg: MonitorConfig = toml::from_str(&data)?;
        Ok(cfg)
    }
}

/// Load config from `$MONITOR_CONFIG_PATH` or `config/monitor.toml`, then
/// apply env overrides. A missing or unreadable file falls back to defaults.
pub fn load() -> MonitorConfig {
    let path = env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut cfg = MonitorConfig::load_from_file(&path).unwrap_or_default();

    if let Some(v) = env::var("MONITOR_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
    {
        cfg.interval_secs = v;
    }
    if let Ok(m) = env::var("GEMINI_MODEL") {
        if !m.trim().is_empty() {
            cfg.model = m;
        }
    }

    // Resolve api key if "ENV"
    if cfg.api_key.trim().eq_ignore_ascii_case("env") {
        cfg.api_key = env::var("GEMINI_API_KEY").unwrap_or_default();
    }

    // Sanitize interval
    if cfg.interval_secs == 0 {
        cfg.interval_secs = default_interval_secs();
    }

    cfg
}
