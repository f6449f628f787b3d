//! Server-pushed event union.
//!
//! Every frame on `GET /event` is `{"type": "<tag>", "properties": {...}}`.
//! Payloads stay opaque here: the terminal program interprets them, the
//! orchestrator only routes on the tag.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire envelope shared by all events.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    properties: Value,
}

/// One event published by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawEvent", into = "RawEvent")]
pub enum Event {
    InstallationUpdated(Value),
    LspClientDiagnostics(Value),
    MessageUpdated(Value),
    MessageRemoved(Value),
    MessagePartUpdated(Value),
    MessagePartRemoved(Value),
    /// Server-side persistence notification. Internal bookkeeping that the
    /// UI never consumes.
    StorageWrite(Value),
    PermissionUpdated(Value),
    PermissionReplied(Value),
    FileEdited(Value),
    SessionUpdated(Value),
    SessionDeleted(Value),
    SessionIdle(Value),
    SessionError(Value),
    ServerConnected(Value),
    FileWatcherUpdated(Value),
    IdeInstalled(Value),
    /// A tag this client does not know yet; forwarded untouched.
    Other { kind: String, properties: Value },
}

impl Event {
    /// Build an event from its wire tag and payload.
    pub fn from_parts(kind: &str, properties: Value) -> Self {
        match kind {
            "installation.updated" => Self::InstallationUpdated(properties),
            "lsp.client.diagnostics" => Self::LspClientDiagnostics(properties),
            "message.updated" => Self::MessageUpdated(properties),
            "message.removed" => Self::MessageRemoved(properties),
            "message.part.updated" => Self::MessagePartUpdated(properties),
            "message.part.removed" => Self::MessagePartRemoved(properties),
            "storage.write" => Self::StorageWrite(properties),
            "permission.updated" => Self::PermissionUpdated(properties),
            "permission.replied" => Self::PermissionReplied(properties),
            "file.edited" => Self::FileEdited(properties),
            "session.updated" => Self::SessionUpdated(properties),
            "session.deleted" => Self::SessionDeleted(properties),
            "session.idle" => Self::SessionIdle(properties),
            "session.error" => Self::SessionError(properties),
            "server.connected" => Self::ServerConnected(properties),
            "file.watcher.updated" => Self::FileWatcherUpdated(properties),
            "ide.installed" => Self::IdeInstalled(properties),
            other => Self::Other {
                kind: other.to_string(),
                properties,
            },
        }
    }

    /// Wire tag of this event.
    pub fn kind(&self) -> &str {
        match self {
            Self::InstallationUpdated(_) => "installation.updated",
            Self::LspClientDiagnostics(_) => "lsp.client.diagnostics",
            Self::MessageUpdated(_) => "message.updated",
            Self::MessageRemoved(_) => "message.removed",
            Self::MessagePartUpdated(_) => "message.part.updated",
            Self::MessagePartRemoved(_) => "message.part.removed",
            Self::StorageWrite(_) => "storage.write",
            Self::PermissionUpdated(_) => "permission.updated",
            Self::PermissionReplied(_) => "permission.replied",
            Self::FileEdited(_) => "file.edited",
            Self::SessionUpdated(_) => "session.updated",
            Self::SessionDeleted(_) => "session.deleted",
            Self::SessionIdle(_) => "session.idle",
            Self::SessionError(_) => "session.error",
            Self::ServerConnected(_) => "server.connected",
            Self::FileWatcherUpdated(_) => "file.watcher.updated",
            Self::IdeInstalled(_) => "ide.installed",
            Self::Other { kind, .. } => kind,
        }
    }

    /// Event payload.
    pub fn properties(&self) -> &Value {
        match self {
            Self::InstallationUpdated(p)
            | Self::LspClientDiagnostics(p)
            | Self::MessageUpdated(p)
            | Self::MessageRemoved(p)
            | Self::MessagePartUpdated(p)
            | Self::MessagePartRemoved(p)
            | Self::StorageWrite(p)
            | Self::PermissionUpdated(p)
            | Self::PermissionReplied(p)
            | Self::FileEdited(p)
            | Self::SessionUpdated(p)
            | Self::SessionDeleted(p)
            | Self::SessionIdle(p)
            | Self::SessionError(p)
            | Self::ServerConnected(p)
            | Self::FileWatcherUpdated(p)
            | Self::IdeInstalled(p) => p,
            Self::Other { properties, .. } => properties,
        }
    }

    /// True for events that must never reach the terminal program.
    ///
    /// Kept exhaustive so a new variant forces a routing decision.
    pub fn is_internal(&self) -> bool {
        match self {
            Self::StorageWrite(_) => true,
            Self::InstallationUpdated(_)
            | Self::LspClientDiagnostics(_)
            | Self::MessageUpdated(_)
            | Self::MessageRemoved(_)
            | Self::MessagePartUpdated(_)
            | Self::MessagePartRemoved(_)
            | Self::PermissionUpdated(_)
            | Self::PermissionReplied(_)
            | Self::FileEdited(_)
            | Self::SessionUpdated(_)
            | Self::SessionDeleted(_)
            | Self::SessionIdle(_)
            | Self::SessionError(_)
            | Self::ServerConnected(_)
            | Self::FileWatcherUpdated(_)
            | Self::IdeInstalled(_)
            | Self::Other { .. } => false,
        }
    }
}

impl From<RawEvent> for Event {
    fn from(raw: RawEvent) -> Self {
        Self::from_parts(&raw.kind, raw.properties)
    }
}

impl From<Event> for RawEvent {
    fn from(event: Event) -> Self {
        let kind = event.kind().to_string();
        let properties = match event {
            Event::Other { properties, .. } => properties,
            other => other.properties().clone(),
        };
        Self { kind, properties }
    }
}
