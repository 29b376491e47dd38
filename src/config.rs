//! Configuration types for the task tracker.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location.
const CONFIG_PATH_ENV: &str = "TASKWARDEN_CONFIG";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server bind settings.
    pub server: ServerConfig,
    /// Task store location.
    pub store: StoreConfig,
    /// Owner identity all API requests are scoped to.
    pub owner: OwnerConfig,
    /// Reminder dispatch loop settings.
    pub reminder: ReminderConfig,
    /// Outbound voice-call channel settings.
    pub voice: VoiceCallConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 4000,
        }
    }
}

/// Task store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding the task database (None = platform data dir).
    pub dir: Option<PathBuf>,
}

impl StoreConfig {
    /// Directory the store opens, falling back to the platform data dir.
    pub fn resolve_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(default_store_dir)
    }
}

/// Owner identity configuration. A single fixed pseudo-user until real
/// authentication exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OwnerConfig {
    /// Owner id every API request is scoped to.
    pub id: String,
}

impl Default for OwnerConfig {
    fn default() -> Self {
        Self {
            id: "default".to_owned(),
        }
    }
}

/// Reminder dispatch loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
    /// Whether the background loop runs at all.
    pub enabled: bool,
    /// Seconds between scans.
    pub interval_secs: u64,
    /// Ceiling on a whole scan, bounding worst-case tick latency.
    pub scan_timeout_secs: u64,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 60,
            scan_timeout_secs: 300,
        }
    }
}

/// Voice-call notification channel configuration (Twilio-compatible REST
/// API). Disabled by default; the dispatch loop still logs reminders when
/// no channel is configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceCallConfig {
    pub enabled: bool,
    /// Provider API base URL. Tests point this at a mock server.
    pub api_base: String,
    pub account_sid: String,
    pub auth_token: String,
    /// Caller id for outbound calls.
    pub from_number: String,
    /// Recipients called for every due reminder.
    pub to_numbers: Vec<String>,
}

impl Default for VoiceCallConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_base: "https://api.twilio.com".to_owned(),
            account_sid: String::new(),
            auth_token: String::new(),
            from_number: String::new(),
            to_numbers: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::TaskError::Config(e.to_string()))
    }

    /// Persist configuration as pretty TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::TaskError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path:
    /// `~/.config/taskwarden/config.toml` (or the XDG equivalent).
    pub fn default_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("taskwarden").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("taskwarden")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/taskwarden/config.toml")
        }
    }

    /// Load from `$TASKWARDEN_CONFIG` or the default path, falling back to
    /// defaults when no file exists. A malformed file is logged and ignored
    /// rather than taking the process down.
    pub fn load() -> Self {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Self::default();
        }
        match Self::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot load config, using defaults");
                Self::default()
            }
        }
    }
}

fn default_store_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("taskwarden"))
        .unwrap_or_else(|| PathBuf::from("/tmp/taskwarden"))
}
