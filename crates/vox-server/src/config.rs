//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Profile and recording storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Inference engine settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Audio post-processing settings.
    #[serde(default)]
    pub audio: AudioConfig,

    /// Self-update settings.
    #[serde(default)]
    pub update: UpdateConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the profile index and saved recordings.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory holding the UI shell and bundled assets.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

/// Inference engine configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    /// Path to the model runner executable. Empty means not configured.
    #[serde(default)]
    pub runner: PathBuf,
}

/// Audio post-processing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// ffmpeg binary used for treatments. Resolved via PATH by default.
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: PathBuf,
}

/// Self-update configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateConfig {
    /// GitHub repository slug checked for new releases.
    #[serde(default = "default_update_repo")]
    pub repo: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "vox_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    8001
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("voxstudio"))
        .unwrap_or_else(|| PathBuf::from("data"))
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_ffmpeg() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_update_repo() -> String {
    "parkerallen1/localTTSstudio".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
        }
    }
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            repo: default_update_repo(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `VOX_HOST` overrides `server.host`
/// - `VOX_PORT` overrides `server.port`
/// - `VOX_DATA_DIR` overrides `storage.data_dir`
/// - `VOX_RUNNER` overrides `engine.runner`
/// - `VOX_FFMPEG` overrides `audio.ffmpeg`
/// - `VOX_LOG_LEVEL` overrides `logging.level`
/// - `VOX_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    // Environment variable overrides
    if let Ok(host) = std::env::var("VOX_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var("VOX_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(data_dir) = std::env::var("VOX_DATA_DIR") {
        config.storage.data_dir = PathBuf::from(data_dir);
    }
    if let Ok(runner) = std::env::var("VOX_RUNNER") {
        config.engine.runner = PathBuf::from(runner);
    }
    if let Ok(ffmpeg) = std::env::var("VOX_FFMPEG") {
        config.audio.ffmpeg = PathBuf::from(ffmpeg);
    }
    if let Ok(level) = std::env::var("VOX_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("VOX_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    Ok(config)
}
