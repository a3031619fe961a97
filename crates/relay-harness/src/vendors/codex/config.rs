use crate::vendors::cli::{CliConfig, CliVendor};

/// Environment names and defaults of the Codex CLI.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CodexCli;

impl CliVendor for CodexCli {
    const DEFAULT_BINARY: &'static str = "codex";
    const BIN_VAR: &'static str = "RELAY_CODEX_BIN";
    const ARGS_VAR: &'static str = "RELAY_CODEX_ARGS";
    const WORKDIR_VAR: &'static str = "RELAY_CODEX_WORKDIR";
}

/// How to invoke the Codex CLI.
pub type CodexConfig = CliConfig<CodexCli>;
