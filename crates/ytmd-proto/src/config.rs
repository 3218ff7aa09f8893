use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub companion: CompanionConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
    #[serde(default)]
    pub playlist: PlaylistConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How the plugin introduces itself to the companion server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanionConfig {
    #[serde(default = "default_app_id")]
    pub app_id: String,
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_app_version")]
    pub app_version: String,
    /// Timeout for ordinary REST calls.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Timeout for the token request, which waits for the user to confirm
    /// the code inside the desktop app.
    #[serde(default = "default_auth_timeout_secs")]
    pub auth_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Delay before the socket reconnects after a drop.
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistConfig {
    /// Window after a successful load during which automatic loads are dropped.
    #[serde(default = "default_coalesce_secs")]
    pub coalesce_secs: u64,
    /// Delay between an automatic trigger and the actual fetch.
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: u64,
    /// Upper bound on a playlist-start command.
    #[serde(default = "default_start_timeout_secs")]
    pub start_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            app_id: default_app_id(),
            app_name: default_app_name(),
            app_version: default_app_version(),
            request_timeout_secs: default_request_timeout_secs(),
            auth_timeout_secs: default_auth_timeout_secs(),
        }
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_secs: default_reconnect_delay_secs(),
        }
    }
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            coalesce_secs: default_coalesce_secs(),
            initial_delay_secs: default_initial_delay_secs(),
            start_timeout_secs: default_start_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl CompanionConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout_secs)
    }
}

impl RealtimeConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}

impl PlaylistConfig {
    pub fn coalesce_window(&self) -> Duration {
        Duration::from_secs(self.coalesce_secs)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }

    pub fn start_timeout(&self) -> Duration {
        Duration::from_secs(self.start_timeout_secs)
    }
}

fn default_app_id() -> String {
    "ytmd-deck".to_string()
}

fn default_app_name() -> String {
    "YTMD Deck".to_string()
}

fn default_app_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_request_timeout_secs() -> u64 {
    5
}

fn default_auth_timeout_secs() -> u64 {
    35
}

fn default_reconnect_delay_secs() -> u64 {
    5
}

fn default_coalesce_secs() -> u64 {
    15
}

fn default_initial_delay_secs() -> u64 {
    2
}

fn default_start_timeout_secs() -> u64 {
    8
}

fn default_filter() -> String {
    "info,ytmd_deck=debug".to_string()
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Read `path`, writing a default config there first if it is missing.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write config {:?}", path))?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}
