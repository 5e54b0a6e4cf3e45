//! Configuration loading and types for dashwatch
//!
//! Configuration is loaded in layers:
//! 1. Built-in defaults
//! 2. Config file (~/.config/dashwatch/config.toml)
//! 3. Environment variables (DASHWATCH_*)
//! 4. CLI arguments (highest priority)

use crate::error::DashwatchError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file content
pub const DEFAULT_CONFIG: &str = r#"# Dashwatch Configuration
#
# Location: ~/.config/dashwatch/config.toml
# Interface and cool-down can be overridden via CLI flags

[capture]
# Network interface to watch in promiscuous mode
# List candidates with: dashwatch interfaces
interface = "eth0"

# Snapshot length in bytes (large enough for a full Ethernet + ARP frame)
snaplen = 65536

# Capture frames not addressed to this host (required for button detection)
promiscuous = true

# How often the blocking read wakes up to check for shutdown
poll_interval_ms = 250

# Reject networks wider than this prefix length as misconfiguration.
# 16 means anything larger than a /16 is refused. Set to 0 to disable.
min_prefix_len = 16

[debounce]
# Minimum seconds between two accepted presses of the same button.
# One physical press sends several ARP probes, so keep this above ~3s.
cooldown_secs = 5.0

# One [[button]] section per device. The action runs once per press.
#
# [[button]]
# name = "puffer-button"
# mac = "ac:63:be:fb:13:9d"
#
# [button.action]
# type = "command"          # log | command | notify | webhook
# command = "puffer speak"
# timeout_ms = 30000
#
# [[button]]
# name = "calendar-button"
# mac = "50:f5:da:11:22:33"
#
# [button.action]
# type = "webhook"
# url = "http://localhost:8080/calendar"
# timeout_ms = 10000
"#;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub capture: CaptureConfig,

    #[serde(default)]
    pub debounce: DebounceConfig,

    /// Registered buttons, in file order
    #[serde(default, rename = "button")]
    pub buttons: Vec<ButtonConfig>,
}

/// Capture handle configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CaptureConfig {
    /// Interface name (e.g. "eth0", "wlan0")
    #[serde(default = "default_interface")]
    pub interface: String,

    /// Snapshot length; also used as the receive buffer size
    #[serde(default = "default_snaplen")]
    pub snaplen: usize,

    #[serde(default = "default_true")]
    pub promiscuous: bool,

    /// Read timeout used to poll for the stop signal
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Smallest accepted prefix length for the interface network (0 disables)
    #[serde(default = "default_min_prefix_len")]
    pub min_prefix_len: u8,
}

/// Debounce configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DebounceConfig {
    /// Cool-down window in seconds
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: f64,
}

/// A single registered button
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ButtonConfig {
    /// Logical name, e.g. "puffer-button"
    pub name: String,

    /// Hardware address in colon-separated hex
    pub mac: String,

    /// What to run when the button fires
    #[serde(default)]
    pub action: ActionConfig,
}

/// Action run for an accepted press
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ActionConfig {
    /// Only log the press
    #[default]
    Log,

    /// Run a shell command with the press exported in the environment
    Command {
        command: String,
        #[serde(default = "default_action_timeout_ms")]
        timeout_ms: u64,
    },

    /// Desktop notification via notify-send
    Notify {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        body: Option<String>,
    },

    /// POST the press as JSON to a URL
    Webhook {
        url: String,
        #[serde(default = "default_action_timeout_ms")]
        timeout_ms: u64,
        #[serde(default)]
        bearer_token: Option<String>,
    },
}

impl ActionConfig {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            ActionConfig::Log => "log",
            ActionConfig::Command { .. } => "command",
            ActionConfig::Notify { .. } => "notify",
            ActionConfig::Webhook { .. } => "webhook",
        }
    }
}

fn default_interface() -> String {
    "eth0".to_string()
}

fn default_snaplen() -> usize {
    65536
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_min_prefix_len() -> u8 {
    16
}

fn default_cooldown_secs() -> f64 {
    5.0
}

fn default_action_timeout_ms() -> u64 {
    30000
}

fn default_true() -> bool {
    true
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            snaplen: default_snaplen(),
            promiscuous: true,
            poll_interval_ms: default_poll_interval_ms(),
            min_prefix_len: default_min_prefix_len(),
        }
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capture: CaptureConfig::default(),
            debounce: DebounceConfig::default(),
            buttons: vec![],
        }
    }
}

impl DebounceConfig {
    /// Cool-down as a duration, saturating for values `validate` rejects
    pub fn cooldown(&self) -> Duration {
        Duration::try_from_secs_f64(self.cooldown_secs).unwrap_or(Duration::MAX)
    }
}

impl CaptureConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// The subnet sanity policy, or None when disabled
    pub fn subnet_policy(&self) -> Option<u8> {
        match self.min_prefix_len {
            0 => None,
            n => Some(n),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "dashwatch")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// The file `load_config` reads: `path` if given, else the default location
    pub fn resolve_path(path: Option<&Path>) -> Option<PathBuf> {
        path.map(PathBuf::from).or_else(Config::default_path)
    }

    /// Check values serde cannot express
    pub fn validate(&self) -> Result<(), DashwatchError> {
        let cooldown = self.debounce.cooldown_secs;
        if !(cooldown.is_finite() && cooldown > 0.0) {
            return Err(DashwatchError::Config(format!(
                "debounce.cooldown_secs must be a positive number, got {}",
                cooldown
            )));
        }
        if Duration::try_from_secs_f64(cooldown).is_err() {
            return Err(DashwatchError::Config(format!(
                "debounce.cooldown_secs is out of range, got {}",
                cooldown
            )));
        }
        if self.capture.poll_interval_ms == 0 {
            return Err(DashwatchError::Config(
                "capture.poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.capture.min_prefix_len > 32 {
            return Err(DashwatchError::Config(format!(
                "capture.min_prefix_len must be between 0 and 32, got {}",
                self.capture.min_prefix_len
            )));
        }
        Ok(())
    }
}

/// Load configuration from file, with defaults for missing values
pub fn load_config(path: Option<&Path>) -> Result<Config, DashwatchError> {
    // Start with defaults
    let mut config = Config::default();

    let config_path = Config::resolve_path(path);

    if let Some(ref path) = config_path {
        if path.exists() {
            tracing::debug!("Loading config from {:?}", path);
            let contents = std::fs::read_to_string(path)
                .map_err(|e| DashwatchError::Config(format!("Failed to read config: {}", e)))?;

            config = toml::from_str(&contents)
                .map_err(|e| DashwatchError::Config(format!("Invalid config: {}", e)))?;
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
        }
    }

    // Override from environment variables
    if let Ok(interface) = std::env::var("DASHWATCH_INTERFACE") {
        config.capture.interface = interface;
    }
    if let Ok(secs) = std::env::var("DASHWATCH_COOLDOWN_SECS") {
        config.debounce.cooldown_secs = secs.parse().map_err(|_| {
            DashwatchError::Config(format!("DASHWATCH_COOLDOWN_SECS is not a number: {:?}", secs))
        })?;
    }

    config.validate()?;
    Ok(config)
}
