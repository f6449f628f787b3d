//! Startup snapshot loading.
//!
//! Runs once, strictly before the terminal program exists:
//! 1. decode the launcher's application descriptor,
//! 2. fold piped standard input into the starting prompt,
//! 3. list agents from the server.
//!
//! Any failure is fatal to the process; there is no retry.

use crate::api::RemoteApi;
use crate::error::BootstrapError;
use crate::types::{Agent, AppDescriptor, LaunchOptions, Snapshot};
use std::io::{self, IsTerminal, Read};
use std::sync::Arc;

/// Standard input as seen by the bootstrap.
pub trait PipedInput {
    /// Whether input is attached to an interactive terminal.
    fn is_terminal(&self) -> io::Result<bool>;
    /// Consume the remaining input.
    fn read_all(&mut self) -> io::Result<String>;
}

/// The process's real standard input.
#[derive(Debug, Default)]
pub struct ProcessStdin;

impl PipedInput for ProcessStdin {
    fn is_terminal(&self) -> io::Result<bool> {
        Ok(io::stdin().is_terminal())
    }

    fn read_all(&mut self) -> io::Result<String> {
        let mut text = String::new();
        io::stdin().lock().read_to_string(&mut text)?;
        Ok(text)
    }
}

/// Result of a successful bootstrap.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    pub snapshot: Arc<Snapshot>,
    /// Launch options with piped input already merged into `prompt`.
    pub launch: LaunchOptions,
}

/// Decode the launcher-provided application descriptor.
pub fn decode_app_descriptor(json: &str) -> Result<AppDescriptor, BootstrapError> {
    Ok(serde_json::from_str(json)?)
}

/// Merge piped text into the command-line prompt.
///
/// Trailing whitespace is dropped from the piped text. Without a CLI prompt
/// the piped text becomes the prompt; otherwise it is appended after a single
/// newline. Blank piped text leaves the prompt untouched.
pub fn merge_prompt(cli_prompt: Option<String>, piped: &str) -> Option<String> {
    let piped = piped.trim_end();
    if piped.is_empty() {
        return cli_prompt;
    }
    match cli_prompt {
        Some(prompt) if !prompt.is_empty() => Some(format!("{prompt}\n{piped}")),
        _ => Some(piped.to_string()),
    }
}

/// Read piped standard input (if any) exactly once and merge it into
/// `cli_prompt`. Interactive terminals are left untouched.
pub fn absorb_piped_input<I>(
    input: &mut I,
    cli_prompt: Option<String>,
) -> Result<Option<String>, BootstrapError>
where
    I: PipedInput + ?Sized,
{
    if input.is_terminal().map_err(BootstrapError::StdinStat)? {
        return Ok(cli_prompt);
    }
    let piped = input.read_all().map_err(BootstrapError::StdinRead)?;
    Ok(merge_prompt(cli_prompt, &piped))
}

/// List agents, treating an empty answer as fatal.
pub async fn fetch_agents(api: &dyn RemoteApi) -> Result<Vec<Agent>, BootstrapError> {
    api.list_agents().await?.ok_or(BootstrapError::NoAgents)
}

/// Build the immutable startup [`Snapshot`].
///
/// Reads standard input synchronously; call before any other task is running.
pub async fn load_snapshot<I>(
    api: &dyn RemoteApi,
    version: &str,
    app_info_json: &str,
    mut launch: LaunchOptions,
    input: &mut I,
) -> Result<Bootstrap, BootstrapError>
where
    I: PipedInput + ?Sized,
{
    let app_info = decode_app_descriptor(app_info_json)?;
    launch.prompt = absorb_piped_input(input, launch.prompt.take())?;
    let agents = fetch_agents(api).await?;

    tracing::debug!(
        app = app_info_json,
        agents_count = agents.len(),
        url = api.base_url(),
        "TUI launched"
    );

    Ok(Bootstrap {
        snapshot: Arc::new(Snapshot {
            version: version.to_string(),
            app_info,
            agents,
        }),
        launch,
    })
}
