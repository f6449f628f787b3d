//! ken8n-tui: terminal client for a running ken8n coder server.
//!
//! The crate covers the client's lifecycle around its interactive view:
//!
//! - [`bootstrap`] builds the immutable startup [`types::Snapshot`] (launcher
//!   descriptor, piped stdin, agent list) before any UI exists,
//! - [`orchestrator`] starts the background tasks ([`relay`], [`control`],
//!   [`clipboard`], log forwarding) around a [`program::TerminalProgram`],
//! - [`shutdown`] guarantees the terminal is released exactly once, whether
//!   the user quits or a signal arrives.
//!
//! # Quick start
//!
//! ```no_run
//! use ken8n_tui::api::ApiClient;
//! use ken8n_tui::bootstrap::{load_snapshot, ProcessStdin};
//! use ken8n_tui::types::LaunchOptions;
//! use std::time::Duration;
//!
//! # async fn example(app_info: &str) {
//! let api = ApiClient::new("http://127.0.0.1:4096", Duration::from_secs(10));
//! let boot = load_snapshot(&api, "v1.1.5", app_info, LaunchOptions::default(), &mut ProcessStdin)
//!     .await
//!     .unwrap();
//! println!("{} agents", boot.snapshot.agents.len());
//! # }
//! ```

pub mod api;
pub mod bootstrap;
pub mod build_info;
pub mod clipboard;
pub mod config;
pub mod control;
pub mod delivery;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod program;
pub mod relay;
pub mod shutdown;
#[cfg(test)]
pub mod testsupport;
pub mod types;
