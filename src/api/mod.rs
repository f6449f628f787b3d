//! HTTP client for the coder server.
//!
//! The API layer is split into cohesive modules:
//! - `events`: the server-pushed event union
//! - `sse`: incremental `text/event-stream` framing
//! - `control`: control-queue wire types
//! - `log`: server log-entry wire types
//! - `client`: the reqwest-backed [`RemoteApi`] implementation

use crate::error::{ApiError, StreamError};
use crate::types::Agent;
use async_trait::async_trait;
use futures_util::Stream;
use std::pin::Pin;

mod client;
pub mod control;
pub mod events;
pub mod log;
mod sse;

pub use client::ApiClient;
pub use control::ControlRequest;
pub use events::Event;
pub use log::{LogEntry, LogLevel};
pub(crate) use sse::decode_event_stream;

/// Server event stream. Ends with `None` on a clean close; an `Err` item is
/// terminal.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<Event, StreamError>> + Send>>;

/// Remote capabilities the orchestrator needs from the server.
///
/// Tests provide deterministic fakes while the production path uses
/// [`ApiClient`].
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Server address, for diagnostics.
    fn base_url(&self) -> &str;

    /// `GET /agent`. `Ok(None)` when the server answers with no result.
    async fn list_agents(&self) -> Result<Option<Vec<Agent>>, ApiError>;

    /// `GET /event`, kept open for the process lifetime.
    async fn open_event_stream(&self) -> Result<EventStream, ApiError>;

    /// `GET /tui/control/next`, a long poll for the next automation request.
    async fn next_control_request(&self) -> Result<ControlRequest, ApiError>;

    /// `POST /tui/control/response`, answering the last control request.
    async fn reply_control(&self, body: &serde_json::Value) -> Result<(), ApiError>;

    /// `POST /log`, mirroring one client log record into the server logs.
    async fn write_log(&self, entry: &LogEntry) -> Result<(), ApiError>;
}
