//! System clipboard.
//!
//! Initialization probes the platform clipboard once, off the main path; its
//! outcome only decides whether later copy requests are attempted.

use crate::error::ClipboardError;
use std::sync::{Arc, OnceLock};

/// Shared record of the startup probe.
#[derive(Debug, Clone, Default)]
pub struct ClipboardState {
    available: Arc<OnceLock<bool>>,
}

impl ClipboardState {
    /// `None` until the probe has finished.
    pub fn available(&self) -> Option<bool> {
        self.available.get().copied()
    }

    fn record(&self, available: bool) {
        let _ = self.available.set(available);
    }
}

/// Probe the clipboard and record the result. Blocking; run it on a
/// blocking-capable thread.
pub fn initialize(state: &ClipboardState) {
    match arboard::Clipboard::new() {
        Ok(_) => {
            tracing::debug!("clipboard initialized");
            state.record(true);
        }
        Err(err) => {
            tracing::error!(error = %err, "Failed to initialize clipboard");
            state.record(false);
        }
    }
}

/// Copy `text` to the system clipboard.
pub fn copy_text(state: &ClipboardState, text: &str) -> Result<(), ClipboardError> {
    if state.available() == Some(false) {
        return Err(ClipboardError::Unavailable);
    }
    let mut clipboard = arboard::Clipboard::new()?;
    clipboard.set_text(text.to_string())?;
    Ok(())
}
