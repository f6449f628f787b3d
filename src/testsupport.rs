//! Shared test fixtures for the bootstrap, relay, control and API test
//! modules.

use crate::api::{ControlRequest, EventStream, LogEntry, RemoteApi};
use crate::error::ApiError;
use crate::types::Agent;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Application descriptor as exported by the launcher.
pub const APP_INFO_JSON: &str = r#"{
    "git": true,
    "hostname": "devbox",
    "path": {
        "config": "/home/dev/.config/ken8n",
        "cwd": "/work/project",
        "data": "/home/dev/.local/share/ken8n",
        "root": "/work/project",
        "state": "/home/dev/.local/state/ken8n"
    },
    "time": {"initialized": 1717000000000}
}"#;

/// One agent as served by `GET /agent`.
pub fn agent_json(name: &str, mode: &str) -> String {
    json!({
        "name": name,
        "mode": mode,
        "builtIn": true,
        "tools": {"bash": true, "webfetch": false},
        "permission": {
            "bash": {"git push": "ask", "*": "allow"},
            "edit": "allow"
        },
        "model": {"providerID": "anthropic", "modelID": "claude-sonnet"},
        "options": {}
    })
    .to_string()
}

/// Decoded agent fixture.
pub fn agent(name: &str) -> Agent {
    serde_json::from_str(&agent_json(name, "primary")).expect("agent fixture")
}

/// Build one SSE event block carrying `data`.
pub fn sse_event_block(data: &str) -> String {
    format!("data: {data}\n\n")
}

/// Scripted [`RemoteApi`] for orchestration tests.
///
/// Each capability is configured up front; calls are counted and recorded so
/// tests can assert on side effects.
pub struct FakeApi {
    agents: Mutex<Option<Result<Option<Vec<Agent>>, ApiError>>>,
    stream: Mutex<Option<Result<EventStream, ApiError>>>,
    control_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Result<ControlRequest, ApiError>>>,
    pub list_agents_calls: AtomicUsize,
    pub control_polls: AtomicUsize,
    pub replies: Mutex<Vec<Value>>,
    pub logs: Mutex<Vec<LogEntry>>,
}

/// Address reported by [`FakeApi`].
pub const FAKE_BASE_URL: &str = "http://fake.invalid:4096";

/// Feeds control-queue answers into a [`FakeApi`].
pub type ControlFeed = mpsc::UnboundedSender<Result<ControlRequest, ApiError>>;

impl FakeApi {
    pub fn new() -> (Self, ControlFeed) {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let api = Self {
            agents: Mutex::new(None),
            stream: Mutex::new(None),
            control_rx: tokio::sync::Mutex::new(control_rx),
            list_agents_calls: AtomicUsize::new(0),
            control_polls: AtomicUsize::new(0),
            replies: Mutex::new(Vec::new()),
            logs: Mutex::new(Vec::new()),
        };
        (api, control_tx)
    }

    pub fn with_agents(self, agents: Result<Option<Vec<Agent>>, ApiError>) -> Self {
        *self.agents.lock().unwrap() = Some(agents);
        self
    }

    pub fn with_stream(self, stream: Result<EventStream, ApiError>) -> Self {
        *self.stream.lock().unwrap() = Some(stream);
        self
    }
}

#[async_trait]
impl RemoteApi for FakeApi {
    fn base_url(&self) -> &str {
        FAKE_BASE_URL
    }

    async fn list_agents(&self) -> Result<Option<Vec<Agent>>, ApiError> {
        self.list_agents_calls.fetch_add(1, Ordering::SeqCst);
        self.agents
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(ApiError::InvalidResponse("no agents scripted".into())))
    }

    async fn open_event_stream(&self) -> Result<EventStream, ApiError> {
        self.stream
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(ApiError::InvalidResponse("no stream scripted".into())))
    }

    async fn next_control_request(&self) -> Result<ControlRequest, ApiError> {
        self.control_polls.fetch_add(1, Ordering::SeqCst);
        let mut rx = self.control_rx.lock().await;
        match rx.recv().await {
            Some(result) => result,
            // Nothing left to serve: behave like an idle long poll.
            None => std::future::pending().await,
        }
    }

    async fn reply_control(&self, body: &Value) -> Result<(), ApiError> {
        self.replies.lock().unwrap().push(body.clone());
        Ok(())
    }

    async fn write_log(&self, entry: &LogEntry) -> Result<(), ApiError> {
        self.logs.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sse_helper_emits_expected_wire_format() {
        let block = sse_event_block(r#"{"type":"session.idle"}"#);
        assert!(block.starts_with("data: "));
        assert!(block.ends_with("\n\n"));
    }

    #[test]
    fn agent_fixture_decodes() {
        assert_eq!(agent("build").name, "build");
    }

    #[tokio::test]
    async fn fake_api_serves_scripted_agents_once() {
        let (api, _feed) = FakeApi::new();
        let api = api.with_agents(Ok(Some(vec![agent("build")])));
        assert_eq!(api.list_agents().await.unwrap().unwrap().len(), 1);
        assert!(api.list_agents().await.is_err());
        assert_eq!(api.list_agents_calls.load(Ordering::SeqCst), 2);
    }
}
