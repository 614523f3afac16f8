//! Client configuration at `~/.pane/config.toml`.
//!
//! Every field is optional; CLI flags override whatever the file says.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use pane_client::config::DEFAULT_ENDPOINT;
use pane_client::EngineConfig;
use pane_core::DEFAULT_PORT;

/// Top-level config file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,
}

/// Identity, storage and timing for the emulated device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default = "default_user")]
    pub user: String,

    /// Storage root. Empty means `~/.pane/storage`.
    #[serde(default)]
    pub storage: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Offered when the recent apps list is empty.
    #[serde(default = "default_endpoint")]
    pub default_endpoint: String,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_frame_timeout_ms")]
    pub frame_timeout_ms: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_notice_ms")]
    pub notice_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            user: default_user(),
            storage: String::new(),
            port: default_port(),
            default_endpoint: default_endpoint(),
            connect_timeout_ms: default_connect_timeout_ms(),
            frame_timeout_ms: default_frame_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            notice_ms: default_notice_ms(),
        }
    }
}

fn default_user() -> String {
    "guest".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_frame_timeout_ms() -> u64 {
    500
}

fn default_poll_interval_ms() -> u64 {
    10
}

fn default_notice_ms() -> u64 {
    1_000
}

/// `~/.pane`, or `.pane` when there is no home directory.
pub fn pane_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join(".pane")
}

pub fn default_config_path() -> PathBuf {
    pane_dir().join("config.toml")
}

impl Config {
    /// Load configuration from a TOML file, returning defaults if the file
    /// does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config at {}", path.display()))?;

        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Build the engine configuration, letting `user` and `storage` win over the file.
    pub fn engine(&self, user: Option<&str>, storage: Option<&Path>) -> EngineConfig {
        let device = &self.device;
        let storage_root = match storage {
            Some(dir) => dir.to_path_buf(),
            None if device.storage.is_empty() => pane_dir().join("storage"),
            None => PathBuf::from(&device.storage),
        };

        EngineConfig {
            user: user.unwrap_or(&device.user).to_string(),
            storage_root,
            default_port: device.port,
            default_endpoint: device.default_endpoint.clone(),
            connect_timeout: Duration::from_millis(device.connect_timeout_ms),
            frame_timeout: Duration::from_millis(device.frame_timeout_ms),
            poll_interval: Duration::from_millis(device.poll_interval_ms),
            notice_duration: Duration::from_millis(device.notice_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let cfg = Config::default();
        assert_eq!(cfg.device.user, "guest");
        assert_eq!(cfg.device.port, 25279);
        assert_eq!(cfg.device.default_endpoint, "hg2z.duckdns.org");
        assert!(cfg.device.storage.is_empty());
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[device]
user = "alice"
storage = "/srv/pane"
port = 9000
default_endpoint = "apps.example.org"
frame_timeout_ms = 250
"#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.device.user, "alice");
        assert_eq!(cfg.device.storage, "/srv/pane");
        assert_eq!(cfg.device.port, 9000);
        assert_eq!(cfg.device.default_endpoint, "apps.example.org");
        assert_eq!(cfg.device.frame_timeout_ms, 250);
        assert_eq!(cfg.device.poll_interval_ms, 10); // default
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.device.user, "guest");
        assert_eq!(cfg.device.connect_timeout_ms, 10_000);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg.device.port, 25279);
    }

    #[test]
    fn written_config_loads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.device.user = "bob".into();
        cfg.device.notice_ms = 50;
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, toml::to_string_pretty(&cfg).unwrap()).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.device.user, "bob");
        assert_eq!(loaded.device.notice_ms, 50);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[device\nuser = ").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn flags_override_file() {
        let mut cfg = Config::default();
        cfg.device.user = "alice".into();
        cfg.device.storage = "/from/file".into();
        cfg.device.poll_interval_ms = 25;

        let engine = cfg.engine(Some("carol"), Some(Path::new("/from/flag")));
        assert_eq!(engine.user, "carol");
        assert_eq!(engine.storage_root, PathBuf::from("/from/flag"));
        assert_eq!(engine.poll_interval, Duration::from_millis(25));

        let engine = cfg.engine(None, None);
        assert_eq!(engine.user, "alice");
        assert_eq!(engine.storage_root, PathBuf::from("/from/file"));
    }

    #[test]
    fn empty_storage_falls_back_to_home() {
        let engine = Config::default().engine(None, None);
        assert!(engine.storage_root.ends_with(".pane/storage"));
    }
}
