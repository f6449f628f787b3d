//! Config-file source discovery.
//!
//! Source order: explicit path > global file > built-in defaults.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::defaults::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, LOG_FILE_NAME};

/// Where the file layer of a [`super::Config`] came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Config loaded from explicit `--config` path.
    Explicit(PathBuf),
    /// Config loaded from the per-user config directory.
    Global(PathBuf),
    /// No file found; runtime defaults were used.
    #[default]
    BuiltInDefaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(path) | Self::Global(path) => write!(f, "{}", path.display()),
            Self::BuiltInDefaults => f.write_str("built-in defaults"),
        }
    }
}

/// Read config text from the highest-precedence available source.
pub(super) fn read_config_text_with_sources<FRead, FRoot>(
    path_override: Option<&str>,
    read_file: &FRead,
    config_root: &FRoot,
) -> Result<(String, ConfigSource), ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FRoot: Fn() -> Option<PathBuf>,
{
    // An explicit path must exist; a missing global file just means defaults.
    if let Some(p) = path_override {
        let path = PathBuf::from(p);
        let text = read_file(&path)?;
        return Ok((text, ConfigSource::Explicit(path)));
    }

    if let Some(path) = global_config_path_in(config_root()) {
        match read_file(&path) {
            Ok(text) => return Ok((text, ConfigSource::Global(path))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
    }

    Ok((String::new(), ConfigSource::BuiltInDefaults))
}

/// Return the default log file path (`~/.local/state/ken8n/tui.log` on Linux).
pub fn default_log_path() -> Option<PathBuf> {
    log_path_in(dirs::state_dir().or_else(dirs::data_local_dir))
}

fn log_path_in(root: Option<PathBuf>) -> Option<PathBuf> {
    root.map(|dir| dir.join(CONFIG_DIR_NAME).join(LOG_FILE_NAME))
}

fn global_config_path_in(root: Option<PathBuf>) -> Option<PathBuf> {
    root.map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Resolve the per-user config root, honoring `XDG_CONFIG_HOME`.
pub(super) fn config_root_dir() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("XDG_CONFIG_HOME") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    dirs::home_dir()
        .map(|home| home.join(".config"))
        .or_else(dirs::config_dir)
}
