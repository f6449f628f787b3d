//! CLI entry point for ken8n-tui.

mod app;
mod cli;

use clap::Parser;
use ken8n_tui::build_info;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = cli::Args::parse();
    if args.version {
        println!("{}", build_info::cli_version_text());
        return ExitCode::SUCCESS;
    }
    app::run(args)
}
