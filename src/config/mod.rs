//! Configuration management for MLX3 Bridge
//!
//! Handles loading, parsing, and hot-reloading of YAML configuration files.

pub mod watcher;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tokio::fs;

pub use watcher::ConfigWatcher;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    pub remote: RemoteConfig,
    pub peer: PeerConfig,
    #[serde(default)]
    pub buttons: ButtonMappingConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Wireless remote identity
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RemoteConfig {
    #[serde(default = "default_remote_name")]
    pub name: String,
    /// IP ID on the RF gateway
    pub address: u8,
}

/// Peer system identity
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PeerConfig {
    #[serde(default = "default_peer_name")]
    pub name: String,
    /// IP ID of the intersystem link
    pub address: u8,
    /// Address of the peer processor
    pub host: String,
    /// Number of allocated boolean channels (numbered from 1)
    #[serde(default = "default_boolean_channels")]
    pub boolean_channels: u16,
}

/// Button index to peer channel mapping
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ButtonMappingConfig {
    /// Map button N to channel N unless overridden or disabled
    #[serde(default = "default_true")]
    pub identity: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<u32, u16>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disabled: Vec<u32>,
}

impl Default for ButtonMappingConfig {
    fn default() -> Self {
        Self {
            identity: true,
            overrides: BTreeMap::new(),
            disabled: Vec::new(),
        }
    }
}

/// Peer channels mirrored back onto the remote
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FeedbackConfig {
    /// Boolean channel showing the volume sub-display
    #[serde(default = "default_volume_popup")]
    pub volume_popup: Option<u16>,
    /// Boolean channel showing the mute sub-display
    #[serde(default = "default_mute_popup")]
    pub mute_popup: Option<u16>,
    /// Unsigned channel carrying the volume level (0-65535)
    #[serde(default = "default_volume_level")]
    pub volume_level: Option<u16>,
    /// String channel carrying the room name
    #[serde(default)]
    pub room_label: Option<u16>,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            volume_popup: default_volume_popup(),
            mute_popup: default_mute_popup(),
            volume_level: default_volume_level(),
            room_label: None,
        }
    }
}

/// Logging output configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Prefix for every event-log record
    #[serde(default = "default_log_header")]
    pub header: String,
    #[serde(default)]
    pub json: bool,
    /// Directory for a daily rolling log file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            header: default_log_header(),
            json: false,
            directory: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from file with validation
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::from_yaml(&contents).with_context(|| format!("Invalid config file: {}", path))
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: AppConfig =
            serde_yaml::from_str(contents).context("Failed to parse YAML config")?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, path: &str) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .await
            .with_context(|| format!("Failed to write config file: {}", path))?;

        Ok(())
    }

    /// Validate configuration for correctness and consistency
    ///
    /// Endpoint addresses and the peer host are checked at registration time,
    /// not here, so that a bad value degrades to a logged registration failure.
    pub fn validate(&self) -> Result<()> {
        if self.remote.name.is_empty() {
            anyhow::bail!("remote name cannot be empty");
        }
        if self.peer.name.is_empty() {
            anyhow::bail!("peer name cannot be empty");
        }
        if self.peer.boolean_channels == 0 {
            anyhow::bail!("peer boolean_channels must be at least 1");
        }

        for (index, channel) in &self.buttons.overrides {
            if *channel == 0 {
                anyhow::bail!("button {} is mapped to channel 0 (channels start at 1)", index);
            }
        }

        self.feedback.validate().context("Invalid feedback section")?;

        Ok(())
    }

    /// True when a reload changes settings fixed at startup
    ///
    /// Endpoint identities and logging output are set up once; only the
    /// button and feedback mappings are swapped while running.
    pub fn requires_restart(&self, other: &AppConfig) -> bool {
        self.remote != other.remote || self.peer != other.peer || self.logging != other.logging
    }
}

impl FeedbackConfig {
    fn validate(&self) -> Result<()> {
        let mut boolean_channels = HashSet::new();
        for (name, channel) in [("volume_popup", self.volume_popup), ("mute_popup", self.mute_popup)] {
            if let Some(channel) = channel {
                if channel == 0 {
                    anyhow::bail!("{} cannot use channel 0", name);
                }
                if !boolean_channels.insert(channel) {
                    anyhow::bail!("{} reuses boolean channel {}", name, channel);
                }
            }
        }

        if self.volume_level == Some(0) {
            anyhow::bail!("volume_level cannot use channel 0");
        }
        if self.room_label == Some(0) {
            anyhow::bail!("room_label cannot use channel 0");
        }

        Ok(())
    }
}

// Default value functions
fn default_remote_name() -> String { "MLX3".to_string() }
fn default_peer_name() -> String { "EISC".to_string() }
fn default_boolean_channels() -> u16 { 999 }
fn default_true() -> bool { true }
fn default_volume_popup() -> Option<u16> { Some(7) }
fn default_mute_popup() -> Option<u16> { Some(16) }
fn default_volume_level() -> Option<u16> { Some(1) }
fn default_log_header() -> String { "[Device] ".to_string() }

#[cfg(test)]
pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        remote: RemoteConfig {
            name: "MLX3".to_string(),
            address: 0x30,
        },
        peer: PeerConfig {
            name: "EISC".to_string(),
            address: 0x51,
            host: "192.168.2.64".to_string(),
            boolean_channels: 40,
        },
        buttons: ButtonMappingConfig::default(),
        feedback: FeedbackConfig::default(),
        logging: LoggingConfig::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
remote:
  address: 48
peer:
  address: 81
  host: "192.168.2.64"
"#;

    #[test]
    fn test_minimal_config_defaults() {
        let config = AppConfig::from_yaml(MINIMAL).unwrap();

        assert_eq!(config.remote.name, "MLX3");
        assert_eq!(config.remote.address, 0x30);
        assert_eq!(config.peer.name, "EISC");
        assert_eq!(config.peer.boolean_channels, 999);
        assert!(config.buttons.identity);
        assert!(config.buttons.overrides.is_empty());
        assert_eq!(config.feedback.volume_popup, Some(7));
        assert_eq!(config.feedback.mute_popup, Some(16));
        assert_eq!(config.feedback.volume_level, Some(1));
        assert_eq!(config.feedback.room_label, None);
        assert_eq!(config.logging.header, "[Device] ");
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
remote:
  name: "MLX3 Den"
  address: 48
peer:
  address: 81
  host: "10.0.0.5"
  boolean_channels: 100
buttons:
  identity: false
  overrides:
    5: 12
    6: 13
  disabled: [9]
feedback:
  volume_popup: 7
  mute_popup: null
  volume_level: 2
  room_label: 3
logging:
  header: "[Den] "
  json: true
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.remote.name, "MLX3 Den");
        assert_eq!(config.peer.boolean_channels, 100);
        assert!(!config.buttons.identity);
        assert_eq!(config.buttons.overrides.get(&5), Some(&12));
        assert_eq!(config.buttons.disabled, vec![9]);
        assert_eq!(config.feedback.mute_popup, None);
        assert_eq!(config.feedback.volume_level, Some(2));
        assert_eq!(config.feedback.room_label, Some(3));
        assert!(config.logging.json);
    }

    #[test]
    fn test_validate_rejects_shared_popup_channel() {
        let mut config = test_config();
        config.feedback.mute_popup = Some(7);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_channels() {
        let mut config = test_config();
        config.peer.boolean_channels = 0;
        assert!(config.validate().is_err());

        let mut config = test_config();
        config.buttons.overrides.insert(4, 0);
        assert!(config.validate().is_err());

        let mut config = test_config();
        config.feedback.volume_level = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_bad_address() {
        // Address problems surface at registration, not at load time
        let mut config = test_config();
        config.remote.address = 0xFF;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_requires_restart() {
        let a = test_config();
        let mut b = test_config();
        assert!(!a.requires_restart(&b));

        b.feedback.room_label = Some(3);
        b.buttons.overrides.insert(5, 12);
        assert!(!a.requires_restart(&b));

        b.peer.host = "10.0.0.9".to_string();
        assert!(a.requires_restart(&b));
    }

    #[test]
    fn test_logging_change_requires_restart() {
        let a = test_config();

        let mut b = test_config();
        b.logging.header = "[Den] ".to_string();
        assert!(a.requires_restart(&b));

        let mut c = test_config();
        c.logging.json = true;
        assert!(a.requires_restart(&c));

        let mut d = test_config();
        d.logging.directory = Some("logs".to_string());
        assert!(a.requires_restart(&d));
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let path = path.to_string_lossy().to_string();

        let mut config = test_config();
        config.buttons.overrides.insert(5, 12);
        config.save(&path).await.unwrap();

        let loaded = AppConfig::load(&path).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        assert!(AppConfig::load("/nonexistent/config.yaml").await.is_err());
    }
}
