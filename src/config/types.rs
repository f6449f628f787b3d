//! Configuration data model.
//!
//! Struct/enum definitions plus default values. Loader and source-resolution
//! logic stays in `config::mod` so precedence behavior is centralized.

use serde::Deserialize;
use std::path::PathBuf;

use super::defaults::{
    DEFAULT_CONTROL_RETRY_DELAY_MS, DEFAULT_LOG_LEVEL, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_SERVER_URL, DEFAULT_SHUTDOWN_GRACE_MS,
};
use super::sources::ConfigSource;

/// Top-level runtime configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub log: LogConfig,
    pub control: ControlConfig,
    pub shutdown: ShutdownConfig,
    /// File the settings were read from. Set by the loader, never parsed.
    #[serde(skip)]
    pub source: ConfigSource,
}

/// Remote server connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the coder server.
    pub url: String,
    /// Raw application descriptor JSON handed over by the launcher.
    pub app_info: String,
    /// Timeout for unary requests. Streams and long polls are exempt.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SERVER_URL.to_string(),
            app_info: String::new(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Log sink settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. `info` or `ken8n_tui=debug`.
    pub level: String,
    /// Log file path. `None` resolves to the platform state directory.
    pub file: Option<PathBuf>,
    /// Mirror this crate's log records to the server's log endpoint.
    pub forward_to_server: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
            forward_to_server: true,
        }
    }
}

/// Local control listener settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub enabled: bool,
    /// Pause between failed polls.
    pub retry_delay_ms: u64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            retry_delay_ms: DEFAULT_CONTROL_RETRY_DELAY_MS,
        }
    }
}

/// Shutdown coordination settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// How long background tasks get to honor cancellation before abort.
    pub task_grace_ms: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            task_grace_ms: DEFAULT_SHUTDOWN_GRACE_MS,
        }
    }
}
