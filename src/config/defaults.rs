//! Default configuration constants.

/// Server started by the launcher on its default port.
pub(super) const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:4096";
/// Default timeout for unary API requests.
pub(super) const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
/// Default log filter directive.
pub(super) const DEFAULT_LOG_LEVEL: &str = "info";
/// Default pause between failed control polls.
pub(super) const DEFAULT_CONTROL_RETRY_DELAY_MS: u64 = 1_000;
/// Default grace period for background tasks at shutdown.
pub(super) const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 2_000;

/// Config directory name under the platform config root.
pub(super) const CONFIG_DIR_NAME: &str = "ken8n";
/// Config file name inside [`CONFIG_DIR_NAME`].
pub(super) const CONFIG_FILE_NAME: &str = "tui.toml";
/// Log file name inside the platform state directory.
pub(super) const LOG_FILE_NAME: &str = "tui.log";
