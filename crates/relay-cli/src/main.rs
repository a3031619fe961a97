//! `relay`: drive an AI coding-agent CLI and render its activity.

use std::io::IsTerminal as _;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use futures::StreamExt as _;
use relay_harness::prelude::*;
use relay_harness::init_observability;
use tokio::io::BufReader;
use tracing::{debug, warn};

/// Exit status used when the user interrupts with Ctrl-C.
const INTERRUPTED: u8 = 130;

#[derive(Parser, Debug)]
#[command(name = "relay", version, about = "Drive an AI coding-agent CLI from the terminal")]
struct Cli {
    /// Provider to use.
    #[arg(long, global = true, env = "RELAY_PROVIDER", default_value = "claude")]
    provider: String,

    /// Model id or alias (see `relay providers`).
    #[arg(long, global = true)]
    model: Option<String>,

    /// File prepended to the first prompt as context. Repeatable.
    #[arg(long = "context", value_name = "FILE", global = true)]
    context: Vec<PathBuf>,

    /// Directory the agent runs in; defaults to the provider's
    /// `RELAY_*_WORKDIR`, then the current directory.
    #[arg(long, value_name = "DIR", global = true)]
    cwd: Option<PathBuf>,

    /// Disable ANSI colors.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Run a single prompt and exit.
    Run {
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },
    /// Start an interactive conversation on stdin.
    Chat,
    /// List providers, their availability and model aliases.
    Providers,
}

fn main() -> anyhow::Result<ExitCode> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_observability();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;
    let outcome = runtime.block_on(dispatch(cli));
    // The stdin reader of an interrupted chat may still be parked on a read.
    runtime.shutdown_background();
    outcome
}

async fn dispatch(cli: Cli) -> anyhow::Result<ExitCode> {
    let registry = ProviderRegistry::from_env()?;
    if cli.command == Command::Providers {
        list_providers(&registry);
        return Ok(ExitCode::SUCCESS);
    }

    let provider = registry.get(&cli.provider)?;
    let context = load_context(&cli.context)?;
    let renderer = Renderer::new(!cli.no_color && std::io::stdout().is_terminal());
    if !provider.is_available() {
        warn!(provider = %provider.id(), "provider binary not found on PATH");
    }

    match cli.command {
        Command::Run { prompt } => {
            let config = SessionConfig {
                prompt: prompt.join(" "),
                model: cli.model,
                context,
                working_dir: cli.cwd,
            };
            run_once(provider, config, renderer).await
        }
        Command::Chat => {
            let config = InteractiveSessionConfig {
                model: cli.model,
                context,
                working_dir: cli.cwd,
            };
            chat(provider, config, renderer).await
        }
        Command::Providers => Ok(ExitCode::SUCCESS),
    }
}

fn load_context(paths: &[PathBuf]) -> anyhow::Result<Vec<ContextItem>> {
    paths
        .iter()
        .map(|path| {
            ContextItem::from_path(path)
                .with_context(|| format!("failed to read context file {}", path.display()))
        })
        .collect()
}

fn list_providers(registry: &ProviderRegistry) {
    for provider in registry.providers() {
        let status = if provider.is_available() {
            "available"
        } else {
            "not installed"
        };
        println!(
            "{:<8} {:<14} aliases: {}",
            provider.id(),
            status,
            provider.known_aliases().join(", ")
        );
    }
}

async fn run_once(
    provider: Arc<dyn Provider>,
    config: SessionConfig,
    renderer: Renderer,
) -> anyhow::Result<ExitCode> {
    let mut events = provider.create_session(config);
    let mut state = RenderState::new();
    let mut sinks = Sinks::stdio();
    let mut succeeded = false;

    let drained = async {
        while let Some(item) = events.next().await {
            let event = item.unwrap_or_else(|err| AgentEvent::error(err.to_string()));
            if let AgentEvent::Result { success, .. } = &event {
                succeeded = *success;
            }
            renderer.render(&event, &mut state, &mut sinks);
        }
    };
    tokio::select! {
        () = drained => {}
        _ = tokio::signal::ctrl_c() => {
            debug!("interrupted one-shot run");
            return Ok(ExitCode::from(INTERRUPTED));
        }
    }

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn chat(
    provider: Arc<dyn Provider>,
    config: InteractiveSessionConfig,
    renderer: Renderer,
) -> anyhow::Result<ExitCode> {
    let mut session = provider.create_interactive_session(config)?;
    let (handle, signal) = interrupt_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.interrupt();
        }
    });

    let mut sinks = Sinks::stdio();
    let exit = Repl::new(renderer)
        .run(
            session.as_mut(),
            BufReader::new(tokio::io::stdin()),
            &mut sinks,
            signal,
        )
        .await?;
    Ok(match exit {
        ReplExit::Interrupted => {
            sinks.write_out("\n");
            ExitCode::from(INTERRUPTED)
        }
        ReplExit::Quit | ReplExit::EndOfInput => ExitCode::SUCCESS,
    })
}
