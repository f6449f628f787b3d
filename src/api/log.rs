//! Server log-entry wire types for `POST /log`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Service name this client reports under.
pub const LOG_SERVICE: &str = "tui";

/// Severity accepted by the server log endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl From<&tracing::Level> for LogLevel {
    fn from(level: &tracing::Level) -> Self {
        // The server has no trace level; fold it into debug.
        match *level {
            tracing::Level::ERROR => Self::Error,
            tracing::Level::WARN => Self::Warn,
            tracing::Level::INFO => Self::Info,
            _ => Self::Debug,
        }
    }
}

/// One log record mirrored to the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub service: String,
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            service: LOG_SERVICE.to_string(),
            level,
            message: message.into(),
            extra: Map::new(),
        }
    }
}
