//! CLI argument parsing via clap.

use clap::Parser;
use ken8n_tui::build_info::HELP_BUILD_METADATA;
use ken8n_tui::types::LaunchOptions;

/// Terminal client for a running ken8n coder server.
#[derive(Debug, Parser)]
#[command(
    name = "ken8n-tui",
    disable_version_flag = true,
    after_help = HELP_BUILD_METADATA
)]
pub struct Args {
    /// Print version and build metadata.
    #[arg(short = 'V', long = "version")]
    pub version: bool,

    /// Model to begin with (`provider/model`).
    #[arg(long = "model")]
    pub model: Option<String>,

    /// Prompt to begin with. Piped stdin is appended to it.
    #[arg(long = "prompt")]
    pub prompt: Option<String>,

    /// Agent to begin with.
    #[arg(long = "agent")]
    pub agent: Option<String>,

    /// Session ID to open.
    #[arg(long = "session")]
    pub session: Option<String>,

    /// Path to config file (default: ~/.config/ken8n/tui.toml).
    #[arg(short = 'c', long = "config")]
    pub config: Option<String>,
}

impl Args {
    /// Launch options handed to the bootstrap and the terminal program.
    ///
    /// Empty flag values are treated as absent.
    pub fn launch_options(&self) -> LaunchOptions {
        LaunchOptions {
            model: non_empty(&self.model),
            prompt: non_empty(&self.prompt),
            agent: non_empty(&self.agent),
            session_id: non_empty(&self.session),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|v| !v.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::Args;
    use clap::Parser;

    #[test]
    fn flags_map_to_launch_options() {
        let args = Args::parse_from([
            "ken8n-tui",
            "--model",
            "anthropic/claude",
            "--prompt",
            "hello",
            "--agent",
            "build",
            "--session",
            "ses_1",
        ]);
        let launch = args.launch_options();
        assert_eq!(launch.model.as_deref(), Some("anthropic/claude"));
        assert_eq!(launch.prompt.as_deref(), Some("hello"));
        assert_eq!(launch.agent.as_deref(), Some("build"));
        assert_eq!(launch.session_id.as_deref(), Some("ses_1"));
    }

    #[test]
    fn version_flag_is_handled_by_the_binary() {
        assert!(Args::parse_from(["ken8n-tui", "--version"]).version);
        assert!(Args::parse_from(["ken8n-tui", "-V"]).version);
        assert!(!Args::parse_from(["ken8n-tui"]).version);
    }

    #[test]
    fn empty_prompt_flag_counts_as_absent() {
        let args = Args::parse_from(["ken8n-tui", "--prompt", ""]);
        assert_eq!(args.launch_options().prompt, None);
    }
}
