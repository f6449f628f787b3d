//! Binary-local process wiring.
//!
//! Owns the process-level concerns the library leaves to its caller:
//! configuration, the log dispatcher, the tokio runtime and exit status.

mod startup;

use crate::cli::Args;
use ken8n_tui::api::ApiClient;
use ken8n_tui::bootstrap::{self, ProcessStdin};
use ken8n_tui::build_info;
use ken8n_tui::clipboard::ClipboardState;
use ken8n_tui::config::load_config;
use ken8n_tui::logging;
use ken8n_tui::orchestrator::{self, SessionParts};
use ken8n_tui::program::viewer::Viewer;
use ken8n_tui::shutdown;
use std::process::ExitCode;
use std::sync::Arc;

/// Run the client to completion and report the process exit status.
pub(crate) fn run(args: Args) -> ExitCode {
    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => return startup::fatal(&err.into()),
    };

    let telemetry = logging::build_telemetry(&config.log);
    let _log_scope = tracing::dispatcher::set_default(&telemetry.dispatch);
    tracing::debug!(
        config = %config.source,
        log_file = ?telemetry.log_file,
        "configuration loaded"
    );

    let runtime = match startup::build_runtime() {
        Ok(runtime) => runtime,
        Err(err) => {
            tracing::error!(error = %err, "failed to start async runtime");
            eprintln!("error: failed to start async runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    let api = Arc::new(ApiClient::new(
        &config.server.url,
        config.server.request_timeout(),
    ));
    let version = build_info::display_version();
    let boot = runtime.block_on(bootstrap::load_snapshot(
        api.as_ref(),
        &version,
        &config.server.app_info,
        args.launch_options(),
        &mut ProcessStdin,
    ));
    let boot = match boot {
        Ok(boot) => boot,
        Err(err) => return startup::fatal(&err),
    };

    let clipboard = ClipboardState::default();
    let mut viewer = Viewer::new(boot.snapshot, boot.launch, clipboard.clone());
    let grace = config.shutdown.task_grace();

    let end = orchestrator::run_session(
        runtime.handle(),
        telemetry.dispatch.clone(),
        &mut viewer,
        SessionParts {
            api,
            control: config.control,
            grace,
            clipboard,
            log_queue: telemetry.forward_queue,
        },
        shutdown::termination_signal(),
    );

    runtime.shutdown_timeout(grace);
    end.exit_code()
}
