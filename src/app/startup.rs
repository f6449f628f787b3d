//! Runtime construction and fatal startup reporting.

use ken8n_tui::error::BootstrapError;
use std::io;
use std::process::ExitCode;
use tokio::runtime::Runtime;

/// Multi-threaded runtime for background tasks. The main thread stays free
/// for the terminal program's blocking run loop.
pub(crate) fn build_runtime() -> io::Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("ken8n-tui-worker")
        .build()
}

/// Log a fatal startup error, echo it to stderr, and map it to an exit status.
pub(crate) fn fatal(err: &BootstrapError) -> ExitCode {
    tracing::error!(error = %err, "startup failed");
    eprintln!("error: {err}");
    ExitCode::from(err.exit_code())
}
