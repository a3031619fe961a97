use std::collections::VecDeque;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;

use futures::stream;
use tokio::io::{AsyncBufReadExt as _, BufReader, Lines};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::errors::ProviderError;
use crate::model::ProviderId;

/// Lines of stderr kept for the error message of a failed process.
const STDERR_TAIL_LINES: usize = 20;

/// Non-blank stdout lines of a vendor call, in arrival order.
pub type LineStream =
    Pin<Box<dyn futures::Stream<Item = Result<String, ProviderError>> + Send + 'static>>;

/// Command line of one vendor call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

/// Starts vendor calls. Swapped for a scripted launcher in tests.
#[async_trait::async_trait]
pub trait Launcher: Send + Sync {
    async fn launch(
        &self,
        provider: &ProviderId,
        invocation: Invocation,
    ) -> Result<LineStream, ProviderError>;
}

/// Runs vendor CLIs as child processes and streams their stdout.
///
/// Dropping the returned stream kills the child.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessLauncher;

#[async_trait::async_trait]
impl Launcher for ProcessLauncher {
    async fn launch(
        &self,
        provider: &ProviderId,
        invocation: Invocation,
    ) -> Result<LineStream, ProviderError> {
        debug!(
            provider = %provider,
            program = %invocation.program.display(),
            args_count = invocation.args.len(),
            "launching vendor process"
        );

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &invocation.current_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| {
            ProviderError::unavailable(
                provider.clone(),
                format!("failed to spawn '{}': {e}", invocation.program.display()),
            )
        })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ProviderError::transport(provider.clone(), "failed to capture stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ProviderError::transport(provider.clone(), "failed to capture stderr"))?;

        // Drained concurrently so a chatty stderr cannot block stdout.
        let stderr_tail = tokio::spawn(collect_stderr_tail(stderr));

        Ok(Box::pin(child_lines(ChildLines {
            provider: provider.clone(),
            child,
            lines: BufReader::new(stdout).lines(),
            stderr_tail: Some(stderr_tail),
        })))
    }
}

struct ChildLines {
    provider: ProviderId,
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
    stderr_tail: Option<JoinHandle<String>>,
}

fn child_lines(
    state: ChildLines,
) -> impl futures::Stream<Item = Result<String, ProviderError>> + Send {
    stream::try_unfold(state, |mut state| async move {
        loop {
            match state.lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => return Ok(Some((line, state))),
                Ok(None) => {
                    finish_child(&mut state).await?;
                    return Ok(None);
                }
                Err(e) => {
                    return Err(ProviderError::transport(
                        state.provider.clone(),
                        format!("failed to read vendor output: {e}"),
                    ));
                }
            }
        }
    })
}

async fn finish_child(state: &mut ChildLines) -> Result<(), ProviderError> {
    let status = state.child.wait().await.map_err(|e| {
        ProviderError::transport(
            state.provider.clone(),
            format!("failed to wait for vendor process: {e}"),
        )
    })?;
    let stderr = match state.stderr_tail.take() {
        Some(handle) => handle.await.unwrap_or_default(),
        None => String::new(),
    };
    if status.success() {
        debug!(provider = %state.provider, "vendor process exited");
        return Ok(());
    }
    warn!(
        provider = %state.provider,
        exit_code = ?status.code(),
        stderr = %stderr,
        "vendor process failed"
    );
    Err(ProviderError::process(
        state.provider.clone(),
        status.code(),
        stderr,
    ))
}

async fn collect_stderr_tail(stderr: ChildStderr) -> String {
    let mut lines = BufReader::new(stderr).lines();
    let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
    while let Ok(Some(line)) = lines.next_line().await {
        if tail.len() == STDERR_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    tail.into_iter().collect::<Vec<_>>().join("\n")
}
