use crate::vendors::cli::{CliConfig, CliVendor};

/// Environment names and defaults of the Claude agent CLI.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClaudeCli;

impl CliVendor for ClaudeCli {
    const DEFAULT_BINARY: &'static str = "claude";
    const BIN_VAR: &'static str = "RELAY_CLAUDE_BIN";
    const ARGS_VAR: &'static str = "RELAY_CLAUDE_ARGS";
    const WORKDIR_VAR: &'static str = "RELAY_CLAUDE_WORKDIR";
}

/// How to invoke the Claude agent CLI.
pub type ClaudeConfig = CliConfig<ClaudeCli>;
