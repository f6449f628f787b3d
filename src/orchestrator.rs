//! Session lifecycle once the snapshot is loaded.
//!
//! Starts the background work around a constructed terminal program, runs the
//! program on the calling thread, then hands over to the shutdown sequence.
//! Start order:
//!
//! 1. clipboard probe (blocking pool, fire and forget),
//! 2. server log forwarding, when enabled,
//! 3. signal watcher,
//! 4. event relay,
//! 5. control listener, when enabled,
//! 6. the program's run loop, blocking until it exits.

use crate::api::RemoteApi;
use crate::clipboard::{self, ClipboardState};
use crate::config::ControlConfig;
use crate::control::ControlListener;
use crate::error::ProgramError;
use crate::logging::{self, LogQueue};
use crate::program::{RunSummary, TerminalProgram};
use crate::relay::EventRelay;
use crate::shutdown::{ShutdownCoordinator, ShutdownReport};
use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::Dispatch;

/// Inputs for the background side of a session.
pub struct SessionParts {
    pub api: Arc<dyn RemoteApi>,
    pub control: ControlConfig,
    /// How long background tasks get to stop after the program exits.
    pub grace: Duration,
    pub clipboard: ClipboardState,
    /// Records to mirror to the server, if forwarding is enabled.
    pub log_queue: Option<LogQueue>,
}

/// How a session ended.
#[derive(Debug)]
pub struct SessionEnd {
    pub outcome: Result<RunSummary, ProgramError>,
    pub report: ShutdownReport,
}

impl SessionEnd {
    /// Process status for a session that got as far as running the program.
    /// Run-loop errors were already logged; they do not change the status.
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::SUCCESS
    }
}

/// Run `program` to completion with its supporting tasks.
///
/// Must be called from a thread that is not driving `runtime`; the program's
/// run loop blocks this thread.
pub fn run_session<P, S>(
    runtime: &Handle,
    dispatch: Dispatch,
    program: &mut P,
    parts: SessionParts,
    signal: S,
) -> SessionEnd
where
    P: TerminalProgram,
    S: Future<Output = Option<&'static str>> + Send + 'static,
{
    let SessionParts {
        api,
        control,
        grace,
        clipboard,
        log_queue,
    } = parts;

    let mut coordinator = ShutdownCoordinator::new(runtime.clone(), dispatch, program.cleanup(), grace);
    let scope = coordinator.scope();
    let handle = program.handle();

    coordinator.spawn_blocking("clipboard", move || clipboard::initialize(&clipboard));

    if let Some(queue) = log_queue {
        coordinator.spawn(
            "log-forwarder",
            logging::forward_logs(api.clone(), queue, scope.clone()),
        );
    }

    coordinator.watch_signals(signal, handle.clone());

    let relay_api = api.clone();
    let relay_sender = handle.sender();
    let relay_scope = scope.clone();
    coordinator.spawn("event-relay", async move {
        let mut relay = EventRelay::new(relay_api, relay_sender, relay_scope);
        relay.run().await;
    });

    if control.enabled {
        let listener = ControlListener::new(api, handle.sender(), scope, control.retry_delay());
        coordinator.spawn("control-listener", async move {
            let exit = listener.run().await;
            tracing::debug!(?exit, "control listener stopped");
        });
    } else {
        tracing::debug!("control listener disabled");
    }

    let outcome = program.run();
    let report = coordinator.finish(&outcome);
    SessionEnd { outcome, report }
}
