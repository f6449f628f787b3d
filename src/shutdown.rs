//! Shutdown coordination.
//!
//! Two paths lead to exit: a termination signal while the terminal program is
//! running, and the program's run loop returning on its own. Both release the
//! terminal through the same [`CleanupLatch`], so the release happens exactly
//! once whichever path gets there first (or if both race).
//!
//! The coordinator also owns the cancellation scope and every background task
//! started for the session; on exit it cancels the scope, gives tasks a grace
//! period to wind down, and aborts the rest.

use crate::error::ProgramError;
use crate::program::{ProgramHandle, RunSummary};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::instrument::{Instrument, WithSubscriber};
use tracing::Dispatch;

type CleanupAction = Box<dyn FnOnce() + Send>;

/// A release routine that runs at most once, from any thread.
///
/// Concurrent callers block until the first call has finished, so nobody
/// proceeds while the terminal is half restored.
#[derive(Clone)]
pub struct CleanupLatch {
    inner: Arc<LatchInner>,
}

struct LatchInner {
    once: Once,
    action: Mutex<Option<CleanupAction>>,
}

impl CleanupLatch {
    pub fn new(action: impl FnOnce() + Send + 'static) -> Self {
        Self {
            inner: Arc::new(LatchInner {
                once: Once::new(),
                action: Mutex::new(Some(Box::new(action))),
            }),
        }
    }

    /// Run the action if nobody has yet. Returns `true` for the call that ran it.
    pub fn run(&self) -> bool {
        let mut ran = false;
        self.inner.once.call_once(|| {
            let action = self
                .inner
                .action
                .lock()
                .ok()
                .and_then(|mut slot| slot.take());
            if let Some(action) = action {
                action();
            }
            ran = true;
        });
        ran
    }

    pub fn is_done(&self) -> bool {
        self.inner.once.is_completed()
    }
}

impl fmt::Debug for CleanupLatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CleanupLatch")
            .field("done", &self.is_done())
            .finish()
    }
}

/// Wait for SIGINT or SIGTERM (Ctrl-C elsewhere) and report which arrived.
///
/// Resolves to `None` when handlers cannot be installed.
pub async fn termination_signal() -> Option<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut interrupt = match signal(SignalKind::interrupt()) {
            Ok(stream) => stream,
            Err(err) => {
                tracing::warn!(error = %err, "cannot install SIGINT handler");
                return None;
            }
        };
        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(err) => {
                tracing::warn!(error = %err, "cannot install SIGTERM handler");
                return None;
            }
        };
        tokio::select! {
            _ = interrupt.recv() => Some("SIGINT"),
            _ = terminate.recv() => Some("SIGTERM"),
        }
    }
    #[cfg(not(unix))]
    {
        match tokio::signal::ctrl_c().await {
            Ok(()) => Some("ctrl-c"),
            Err(err) => {
                tracing::warn!(error = %err, "cannot install ctrl-c handler");
                None
            }
        }
    }
}

/// What the exit sequence did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// This call ran the terminal release (false if the signal path already had).
    pub released_here: bool,
    /// Background tasks that finished within the grace period.
    pub joined: usize,
    /// Background tasks aborted after the grace period.
    pub aborted: usize,
}

/// Owner of the session's cancellation scope and background tasks.
pub struct ShutdownCoordinator {
    runtime: Handle,
    dispatch: Dispatch,
    scope: CancellationToken,
    tasks: JoinSet<()>,
    cleanup: CleanupLatch,
    grace: Duration,
}

impl ShutdownCoordinator {
    pub fn new(runtime: Handle, dispatch: Dispatch, cleanup: CleanupLatch, grace: Duration) -> Self {
        Self {
            runtime,
            dispatch,
            scope: CancellationToken::new(),
            tasks: JoinSet::new(),
            cleanup,
            grace,
        }
    }

    /// The session-wide cancellation scope.
    pub fn scope(&self) -> CancellationToken {
        self.scope.clone()
    }

    /// Number of background tasks still tracked.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    fn task_span(&self, name: &'static str) -> tracing::Span {
        tracing::dispatcher::with_default(&self.dispatch, || {
            tracing::info_span!(parent: None, "task", task = name)
        })
    }

    /// Start a background task that logs through the session dispatcher.
    pub fn spawn<F>(&mut self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let span = self.task_span(name);
        self.tasks.spawn_on(
            task.instrument(span).with_subscriber(self.dispatch.clone()),
            &self.runtime,
        );
    }

    /// Start blocking work on the runtime's blocking pool.
    pub fn spawn_blocking<F>(&mut self, name: &'static str, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let span = self.task_span(name);
        let dispatch = self.dispatch.clone();
        self.tasks.spawn_blocking_on(
            move || tracing::dispatcher::with_default(&dispatch, || span.in_scope(work)),
            &self.runtime,
        );
    }

    /// Watch for a termination signal while the program runs.
    ///
    /// On a signal: log it, release the terminal, then ask the program to
    /// quit. The watcher ends quietly when the scope is cancelled first.
    pub fn watch_signals<S>(&mut self, signal: S, program: ProgramHandle)
    where
        S: Future<Output = Option<&'static str>> + Send + 'static,
    {
        let scope = self.scope.clone();
        let cleanup = self.cleanup.clone();
        self.spawn("signal-watcher", async move {
            let received = tokio::select! {
                biased;
                _ = scope.cancelled() => return,
                received = signal => received,
            };
            let Some(name) = received else {
                return;
            };
            tracing::info!(signal = name, "Received signal, shutting down gracefully");
            cleanup.run();
            program.quit();
        });
    }

    /// Run the exit sequence after the program's run loop returned.
    pub async fn shutdown(&mut self, outcome: &Result<RunSummary, ProgramError>) -> ShutdownReport {
        match outcome {
            Ok(summary) => tracing::debug!(reason = ?summary.reason, messages = summary.messages, "terminal program returned"),
            Err(err) => tracing::error!(error = %err, "TUI error"),
        }

        let released_here = self.cleanup.run();
        // Logged while the forwarder still runs so the record reaches the server.
        tracing::info!(ok = outcome.is_ok(), "TUI exited");
        self.scope.cancel();
        let (joined, aborted) = self.drain_tasks().await;
        tracing::debug!(joined, aborted, "background tasks stopped");

        ShutdownReport {
            released_here,
            joined,
            aborted,
        }
    }

    /// Blocking wrapper around [`Self::shutdown`] for the main thread.
    pub fn finish(mut self, outcome: &Result<RunSummary, ProgramError>) -> ShutdownReport {
        let runtime = self.runtime.clone();
        runtime.block_on(self.shutdown(outcome))
    }

    async fn drain_tasks(&mut self) -> (usize, usize) {
        let deadline = tokio::time::Instant::now() + self.grace;
        let mut joined = 0;
        loop {
            match tokio::time::timeout_at(deadline, self.tasks.join_next()).await {
                Ok(Some(Ok(()))) => joined += 1,
                Ok(Some(Err(err))) => {
                    joined += 1;
                    if err.is_panic() {
                        tracing::error!(error = %err, "background task panicked");
                    }
                }
                Ok(None) => return (joined, 0),
                Err(_) => break,
            }
        }

        let aborted = self.tasks.len();
        tracing::warn!(aborted, "background tasks did not stop in time");
        self.tasks.abort_all();
        // Blocking work cannot be aborted; let it finish detached.
        self.tasks.detach_all();
        (joined, aborted)
    }
}
