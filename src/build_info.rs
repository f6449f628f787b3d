//! Compile-time build metadata exposed to CLI/runtime surfaces.

/// Release version stamped at build time (falls back to the package version).
pub const VERSION: &str = env!("KEN8N_TUI_VERSION");

/// VCS commit hash captured at build time.
pub const GIT_COMMIT: &str = env!("KEN8N_TUI_BUILD_GIT_HASH");

/// Build timestamp captured at compile time.
pub const BUILD_TIMESTAMP: &str = env!("KEN8N_TUI_BUILD_TIMESTAMP");

/// Help trailer block that surfaces build metadata in `ken8n-tui --help`.
pub const HELP_BUILD_METADATA: &str = concat!(
    "Build metadata:\n  commit: ",
    env!("KEN8N_TUI_BUILD_GIT_HASH"),
    "\n  built: ",
    env!("KEN8N_TUI_BUILD_TIMESTAMP")
);

/// Version string shown in the UI and carried by the snapshot.
pub fn display_version() -> String {
    display_version_for(VERSION)
}

/// `dev` builds and already-prefixed versions are shown verbatim; everything
/// else gains a `v` prefix.
pub fn display_version_for(version: &str) -> String {
    if version == "dev" || version.starts_with('v') {
        version.to_string()
    } else {
        format!("v{version}")
    }
}

/// Render CLI version block used by `ken8n-tui --version`.
pub fn cli_version_text() -> String {
    format!(
        "ken8n-tui {}\ncommit: {GIT_COMMIT}\nbuilt: {BUILD_TIMESTAMP}",
        display_version()
    )
}
