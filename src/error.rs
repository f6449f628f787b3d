//! Unified error types for the client.

use std::fmt;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors when loading or parsing configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Toml(e) => write!(f, "toml: {e}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e)
    }
}

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// Errors from the HTTP API layer.
#[derive(Debug)]
pub enum ApiError {
    /// Network / reqwest-level error.
    Http(reqwest::Error),
    /// Non-2xx status from the server.
    Status { code: u16, body: String },
    /// The server answered 2xx but the body did not match the expected shape.
    InvalidResponse(String),
}

impl ApiError {
    /// HTTP status code when this error came from a non-2xx response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "http: {e}"),
            Self::Status { code, body } => write!(f, "status {code}: {body}"),
            Self::InvalidResponse(msg) => write!(f, "invalid response: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

// ---------------------------------------------------------------------------
// BootstrapError
// ---------------------------------------------------------------------------

/// Fatal startup failures. Every variant terminates the process before any UI
/// is shown.
#[derive(Debug)]
pub enum BootstrapError {
    Config(ConfigError),
    /// Standard input could not be inspected.
    StdinStat(std::io::Error),
    /// Piped standard input could not be read to the end.
    StdinRead(std::io::Error),
    /// The application descriptor JSON was malformed.
    Decode(serde_json::Error),
    /// Listing agents failed.
    Fetch(ApiError),
    /// The server answered the agent listing with no result.
    NoAgents,
}

impl BootstrapError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

impl fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::StdinStat(e) => write!(f, "failed to stat stdin: {e}"),
            Self::StdinRead(e) => write!(f, "failed to read stdin: {e}"),
            Self::Decode(e) => write!(f, "failed to decode app info: {e}"),
            Self::Fetch(e) => write!(f, "failed to fetch agents: {e}"),
            Self::NoAgents => write!(f, "no agents returned from server"),
        }
    }
}

impl std::error::Error for BootstrapError {}

impl From<ConfigError> for BootstrapError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<serde_json::Error> for BootstrapError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e)
    }
}

impl From<ApiError> for BootstrapError {
    fn from(e: ApiError) -> Self {
        Self::Fetch(e)
    }
}

// ---------------------------------------------------------------------------
// StreamError
// ---------------------------------------------------------------------------

/// Terminal failures of the server event stream.
#[derive(Debug)]
pub enum StreamError {
    /// The stream could not be opened.
    Open(ApiError),
    /// The connection broke while reading.
    Transport(reqwest::Error),
    /// A frame carried a payload that is not an event.
    Decode(String),
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open(e) => write!(f, "failed to open event stream: {e}"),
            Self::Transport(e) => write!(f, "event stream transport: {e}"),
            Self::Decode(msg) => write!(f, "invalid event payload: {msg}"),
        }
    }
}

impl std::error::Error for StreamError {}

impl From<reqwest::Error> for StreamError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// ProgramError
// ---------------------------------------------------------------------------

/// Errors returned by the terminal program's run loop.
#[derive(Debug)]
pub enum ProgramError {
    Io(std::io::Error),
}

impl fmt::Display for ProgramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "terminal io: {e}"),
        }
    }
}

impl std::error::Error for ProgramError {}

impl From<std::io::Error> for ProgramError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

// ---------------------------------------------------------------------------
// ClipboardError
// ---------------------------------------------------------------------------

/// Clipboard access failures. Never fatal.
#[derive(Debug)]
pub enum ClipboardError {
    /// Startup probing found no usable clipboard.
    Unavailable,
    Backend(arboard::Error),
}

impl fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "clipboard unavailable"),
            Self::Backend(e) => write!(f, "clipboard: {e}"),
        }
    }
}

impl std::error::Error for ClipboardError {}

impl From<arboard::Error> for ClipboardError {
    fn from(e: arboard::Error) -> Self {
        Self::Backend(e)
    }
}
