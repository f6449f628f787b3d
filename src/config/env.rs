//! Environment overrides.
//!
//! The launcher hands the server URL and the application descriptor over via
//! environment variables; these always win over file values.

use crate::error::ConfigError;

use super::Config;

/// Server base URL exported by the launcher.
pub const ENV_SERVER_URL: &str = "KEN8N_CODER_SERVER";
/// Application descriptor JSON exported by the launcher.
pub const ENV_APP_INFO: &str = "KEN8N_CODER_APP_INFO";
/// Log filter directive override.
pub const ENV_LOG_LEVEL: &str = "KEN8N_TUI_LOG";
/// Log file path override.
pub const ENV_LOG_FILE: &str = "KEN8N_TUI_LOG_FILE";
/// Unary request timeout override in seconds.
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "KEN8N_TUI_REQUEST_TIMEOUT_SECS";

pub(super) fn apply_env_overrides<FEnv>(
    config: &mut Config,
    env_lookup: &FEnv,
) -> Result<(), ConfigError>
where
    FEnv: Fn(&str) -> Option<String>,
{
    if let Some(url) = non_empty(env_lookup(ENV_SERVER_URL)) {
        config.server.url = url;
    }
    // An empty descriptor is passed through as-is: decoding it is the
    // bootstrap's job and must fail there.
    if let Some(app_info) = env_lookup(ENV_APP_INFO) {
        config.server.app_info = app_info;
    }
    if let Some(level) = non_empty(env_lookup(ENV_LOG_LEVEL)) {
        config.log.level = level;
    }
    if let Some(file) = non_empty(env_lookup(ENV_LOG_FILE)) {
        config.log.file = Some(file.into());
    }
    if let Some(timeout) = non_empty(env_lookup(ENV_REQUEST_TIMEOUT_SECS)) {
        // Clamp to at least 1 second to avoid accidental "no-timeout".
        let parsed = timeout.trim().parse::<u64>().map_err(|_| {
            ConfigError::Invalid(format!(
                "invalid {ENV_REQUEST_TIMEOUT_SECS} value `{timeout}`: expected positive integer seconds"
            ))
        })?;
        config.server.request_timeout_secs = parsed.max(1);
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
