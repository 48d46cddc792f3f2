//! Configuration management with XDG paths
//!
//! ~/.config/labelcli/config.json - server URL, preferences

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const APP_NAME: &str = "labelcli";

/// Get config directory (~/.config/labelcli/)
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .context("Could not determine config directory")?;
    Ok(base.join(APP_NAME))
}

/// Get config file path
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.json"))
}

/// Ensure the config directory exists
pub fn ensure_dirs() -> Result<()> {
    fs::create_dir_all(config_dir()?)?;
    Ok(())
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the labelling server
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Default labelling mode ("image" or "conversation")
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Stats refresh interval in seconds
    #[serde(default = "default_poll_secs")]
    pub stats_poll_secs: u64,
}

fn default_server_url() -> String {
    "http://127.0.0.1:5000".to_string()
}
fn default_mode() -> String {
    "image".to_string()
}
fn default_poll_secs() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            mode: default_mode(),
            stats_poll_secs: default_poll_secs(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults
    pub fn load() -> Result<Self> {
        ensure_dirs()?;
        let path = config_path()?;

        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to disk
    pub fn save(&self) -> Result<()> {
        ensure_dirs()?;
        let path = config_path()?;
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, &content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

/// Resolve the server URL: environment variable takes precedence, then
/// the config file, then the default.
pub fn server_url(cfg: &Config) -> String {
    if let Ok(url) = std::env::var("LABELCLI_SERVER") {
        if !url.is_empty() {
            return url;
        }
    }
    cfg.server_url.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let cfg = Config::default();
        assert_eq!(cfg.server_url, "http://127.0.0.1:5000");
        assert_eq!(cfg.mode, "image");
        assert_eq!(cfg.stats_poll_secs, 5);
    }

    #[test]
    fn test_config_roundtrip() {
        let cfg = Config {
            server_url: "http://example.test:8080".to_string(),
            mode: "conversation".to_string(),
            stats_poll_secs: 10,
        };

        let json = serde_json::to_string(&cfg).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.server_url, cfg.server_url);
        assert_eq!(back.mode, cfg.mode);
        assert_eq!(back.stats_poll_secs, 10);
    }

    #[test]
    fn test_config_partial_json_fills_defaults() {
        let cfg: Config = serde_json::from_str(r#"{"server_url": "http://host:1"}"#).unwrap();
        assert_eq!(cfg.server_url, "http://host:1");
        assert_eq!(cfg.mode, "image");
        assert_eq!(cfg.stats_poll_secs, 5);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_config_disk_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("XDG_CONFIG_HOME", dir.path());

        let cfg = Config {
            server_url: "http://roundtrip:9".to_string(),
            ..Default::default()
        };
        cfg.save().unwrap();
        let back = Config::load().unwrap();
        assert_eq!(back.server_url, "http://roundtrip:9");

        std::env::remove_var("XDG_CONFIG_HOME");
    }
}
