//! Configuration loading from TOML files and environment variables.
//!
//! Config is loaded in this order of precedence (highest wins):
//! 1. Environment variables (`KEN8N_CODER_SERVER`, `KEN8N_CODER_APP_INFO`,
//!    `KEN8N_TUI_*`).
//! 2. TOML file specified via `--config`.
//! 3. `$XDG_CONFIG_HOME/ken8n/tui.toml` (or `~/.config/ken8n/tui.toml`).
//! 4. Built-in defaults.

use crate::error::ConfigError;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod defaults;
mod env;
mod sources;
mod types;

pub use env::{
    ENV_APP_INFO, ENV_LOG_FILE, ENV_LOG_LEVEL, ENV_REQUEST_TIMEOUT_SECS, ENV_SERVER_URL,
};
pub use sources::{default_log_path, ConfigSource};
pub use types::{Config, ControlConfig, LogConfig, ServerConfig, ShutdownConfig};

use env::apply_env_overrides;
use sources::{config_root_dir, read_config_text_with_sources};

/// Load configuration from disk and environment.
///
/// `path_override` is an explicit config file path (from `--config`).
pub fn load_config(path_override: Option<&str>) -> Result<Config, ConfigError> {
    load_config_from_sources(
        path_override,
        |path| std::fs::read_to_string(path),
        |name| std::env::var(name).ok(),
        config_root_dir,
    )
}

pub(crate) fn load_config_from_sources<FRead, FEnv, FRoot>(
    path_override: Option<&str>,
    read_file: FRead,
    env_lookup: FEnv,
    config_root: FRoot,
) -> Result<Config, ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FEnv: Fn(&str) -> Option<String>,
    FRoot: Fn() -> Option<PathBuf>,
{
    let (config_text, source) =
        read_config_text_with_sources(path_override, &read_file, &config_root)?;
    let mut config: Config = toml::from_str(&config_text)?;
    config.source = source;
    apply_env_overrides(&mut config, &env_lookup)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.server.url.trim().is_empty() {
        return Err(ConfigError::Invalid(format!(
            "server url is empty; set [server].url or {ENV_SERVER_URL}"
        )));
    }
    Ok(())
}

impl ServerConfig {
    /// Unary request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

impl LogConfig {
    /// Configured log file, else the platform default.
    pub fn resolved_file(&self) -> Option<PathBuf> {
        self.file.clone().or_else(default_log_path)
    }
}

impl ControlConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl ShutdownConfig {
    pub fn task_grace(&self) -> Duration {
        Duration::from_millis(self.task_grace_ms)
    }
}
