//! Control-queue wire types.
//!
//! External automation (editor plugins, scripts) posts commands to the server,
//! which queues them for this client. Each queued item names a TUI route and
//! carries an opaque body.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One queued automation request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControlRequest {
    /// Route such as `/tui/append-prompt` or `/tui/open-help`.
    pub path: String,
    #[serde(default)]
    pub body: Value,
}

impl ControlRequest {
    /// Route name without the `/tui/` prefix, for display.
    pub fn command(&self) -> &str {
        self.path
            .strip_prefix("/tui/")
            .unwrap_or(self.path.trim_start_matches('/'))
    }
}
