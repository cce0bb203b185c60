// src/config/mod.rs
pub mod options;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::options::{validate_scan_interval, DEFAULT_SCAN_INTERVAL};

pub const ENV_CONFIG_PATH: &str = "NODVARSEL_CONFIG_PATH";
pub const ENV_SCAN_INTERVAL: &str = "NODVARSEL_SCAN_INTERVAL";
pub const ENV_BIND_ADDR: &str = "NODVARSEL_BIND_ADDR";
pub const ENV_ENTRY_ID: &str = "NODVARSEL_ENTRY_ID";

pub const DEFAULT_ENTRY_ID: &str = "nodvarsel";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

fn default_entry_id() -> String {
    DEFAULT_ENTRY_ID.to_string()
}
fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}
fn default_scan_interval() -> u64 {
    DEFAULT_SCAN_INTERVAL
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Prefix for entity ids, e.g. `nodvarsel_active`.
    #[serde(default = "default_entry_id")]
    pub entry_id: String,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Poll interval in seconds, 30..=600.
    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            entry_id: default_entry_id(),
            bind_addr: default_bind_addr(),
            scan_interval: DEFAULT_SCAN_INTERVAL,
        }
    }
}

impl AppConfig {
    /// Load from an explicit path. Supports TOML or JSON formats.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = parse_config(&content, ext.as_str())
            .with_context(|| format!("parsing config {}", path.display()))?;
        cfg.validated()
    }

    /// Load using env var + fallbacks, then apply env overrides:
    /// 1) $NODVARSEL_CONFIG_PATH
    /// 2) config/nodvarsel.toml
    /// 3) config/nodvarsel.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self> {
        let base = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let toml_p = PathBuf::from("config/nodvarsel.toml");
            let json_p = PathBuf::from("config/nodvarsel.json");
            if toml_p.exists() {
                Self::load_from(&toml_p)?
            } else if json_p.exists() {
                Self::load_from(&json_p)?
            } else {
                Self::default()
            }
        };
        base.with_env_overrides()?.validated()
    }

    fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(v) = std::env::var(ENV_SCAN_INTERVAL) {
            self.scan_interval = v
                .trim()
                .parse()
                .with_context(|| format!("{ENV_SCAN_INTERVAL} must be an integer, got {v:?}"))?;
        }
        if let Ok(v) = std::env::var(ENV_BIND_ADDR) {
            self.bind_addr = v.trim().to_string();
        }
        if let Ok(v) = std::env::var(ENV_ENTRY_ID) {
            self.entry_id = v.trim().to_string();
        }
        Ok(self)
    }

    fn validated(mut self) -> Result<Self> {
        validate_scan_interval(self.scan_interval)?;
        self.entry_id = self.entry_id.trim().to_string();
        if self.entry_id.is_empty() {
            self.entry_id = default_entry_id();
        }
        Ok(self)
    }
}

fn parse_config(s: &str, hint_ext: &str) -> Result<AppConfig> {
    if hint_ext == "json" {
        return Ok(serde_json::from_str(s)?);
    }
    // Try TOML first, then JSON for extension-less files.
    match toml::from_str(s) {
        Ok(cfg) => Ok(cfg),
        Err(toml_err) => serde_json::from_str(s)
            .map_err(|_| anyhow!("unsupported config format: {toml_err}")),
    }
}
