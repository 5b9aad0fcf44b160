//! Server configuration.

use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum simultaneous TCP peers; also used as the listen backlog bound.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Idle connections are closed after this many seconds.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// When false the TCP server is not started at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Echo command lines received over TCP onto the serial sink.
    #[serde(default = "default_serial_echo")]
    pub serial_echo: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    7777
}

fn default_max_connections() -> usize {
    5
}

fn default_idle_timeout_secs() -> u64 {
    600
}

fn default_enabled() -> bool {
    true
}

fn default_serial_echo() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_connections: default_max_connections(),
            idle_timeout_secs: default_idle_timeout_secs(),
            enabled: default_enabled(),
            serial_echo: default_serial_echo(),
        }
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config from the default location (config/default.toml) or fall
    /// back to defaults.
    pub fn load() -> Result<Self> {
        let config_path = std::path::PathBuf::from("config/default.toml");
        if config_path.exists() {
            return Self::load_from(&config_path);
        }
        Ok(Config::default())
    }
}
