//! Data model for the startup snapshot.
//!
//! These types deserialize directly from the JSON the server and the launcher
//! produce; field names follow the server's camelCase wire names.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Application descriptor
// ---------------------------------------------------------------------------

/// Description of the workspace the server was started in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppDescriptor {
    /// Whether the workspace root is a git repository.
    pub git: bool,
    pub hostname: String,
    pub path: AppPath,
    pub time: AppTime,
}

/// Filesystem locations used by the server for this workspace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppPath {
    pub config: String,
    pub cwd: String,
    pub data: String,
    pub root: String,
    pub state: String,
}

/// Workspace lifecycle timestamps.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppTime {
    /// Unix milliseconds of the first `init` run; absent for fresh workspaces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initialized: Option<f64>,
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// Where an agent may be selected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AgentMode {
    /// Only invocable by other agents.
    Subagent,
    /// Selectable by the user.
    Primary,
    All,
}

impl AgentMode {
    /// True when the user can pick this agent directly.
    pub fn is_user_selectable(self) -> bool {
        matches!(self, Self::Primary | Self::All)
    }
}

/// Permission outcome for a guarded action.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Ask,
    Allow,
    Deny,
}

/// Per-agent permission table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentPermission {
    /// Shell command pattern -> permission.
    pub bash: BTreeMap<String, Permission>,
    pub edit: Permission,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webfetch: Option<Permission>,
}

/// Model pinned by an agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentModel {
    #[serde(rename = "providerID")]
    pub provider_id: String,
    #[serde(rename = "modelID")]
    pub model_id: String,
}

/// Agent definition as listed by `GET /agent`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub name: String,
    pub mode: AgentMode,
    pub built_in: bool,
    pub tools: BTreeMap<String, bool>,
    pub permission: AgentPermission,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<AgentModel>,
    #[serde(default)]
    pub options: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Immutable startup state shared by the orchestrator and the terminal
/// program for the lifetime of the process.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Display version of this client.
    pub version: String,
    pub app_info: AppDescriptor,
    /// Agents in the order the server returned them.
    pub agents: Vec<Agent>,
}

impl Snapshot {
    /// Look up an agent by name.
    pub fn agent(&self, name: &str) -> Option<&Agent> {
        self.agents.iter().find(|agent| agent.name == name)
    }
}

/// Optional starting selections from the command line.
///
/// `prompt` already carries any piped standard input once the bootstrap has
/// run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    pub model: Option<String>,
    pub prompt: Option<String>,
    pub agent: Option<String>,
    pub session_id: Option<String>,
}
