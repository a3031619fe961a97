//! Turn-taking loop for interactive sessions: prompt, read a line, send it,
//! render the turn, repeat.

use futures::StreamExt as _;
use tokio::io::{AsyncBufRead, AsyncBufReadExt as _};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::errors::HarnessError;
use crate::event::AgentEvent;
use crate::render::{RenderState, Renderer, Sinks};
use crate::session::InteractiveSession;

const PROMPT: &str = "> ";
const EXIT_COMMANDS: &[&str] = &["/exit", "/quit"];

/// Handle used to interrupt a running [`Repl`] (for example from Ctrl-C).
#[derive(Clone)]
pub struct InterruptHandle {
    tx: watch::Sender<bool>,
}

impl InterruptHandle {
    /// Requests the loop to stop. The in-flight turn is abandoned.
    pub fn interrupt(&self) {
        let _ = self.tx.send(true);
    }
}

/// Receiving side of an [`InterruptHandle`].
pub struct InterruptSignal {
    rx: watch::Receiver<bool>,
}

impl InterruptSignal {
    /// Resolves once an interrupt was requested. Never resolves if every
    /// handle is dropped without interrupting.
    pub async fn triggered(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Creates a connected interrupt handle and signal.
pub fn interrupt_channel() -> (InterruptHandle, InterruptSignal) {
    let (tx, rx) = watch::channel(false);
    (InterruptHandle { tx }, InterruptSignal { rx })
}

/// Why [`Repl::run`] returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplExit {
    /// The user typed `/exit` or `/quit`.
    Quit,
    /// Input reached end of file.
    EndOfInput,
    Interrupted,
}

/// Interactive driver over any [`InteractiveSession`].
#[derive(Clone, Copy, Debug)]
pub struct Repl {
    renderer: Renderer,
}

impl Repl {
    pub fn new(renderer: Renderer) -> Self {
        Self { renderer }
    }

    /// Runs the loop until exit, end of input or interrupt. The session is
    /// closed on every path, including input errors.
    pub async fn run<R>(
        &self,
        session: &mut dyn InteractiveSession,
        input: R,
        sinks: &mut Sinks<'_>,
        mut interrupt: InterruptSignal,
    ) -> Result<ReplExit, HarnessError>
    where
        R: AsyncBufRead + Unpin,
    {
        let outcome = self.drive(session, input, sinks, &mut interrupt).await;
        session.close().await;
        match &outcome {
            Ok(exit) => info!(?exit, "interactive session ended"),
            Err(err) => debug!(error = %err, "interactive session failed"),
        }
        outcome
    }

    async fn drive<R>(
        &self,
        session: &mut dyn InteractiveSession,
        input: R,
        sinks: &mut Sinks<'_>,
        interrupt: &mut InterruptSignal,
    ) -> Result<ReplExit, HarnessError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        loop {
            sinks.write_out(PROMPT);
            let line = tokio::select! {
                biased;
                () = interrupt.triggered() => return Ok(ReplExit::Interrupted),
                line = lines.next_line() => line?,
            };
            let Some(line) = line else {
                return Ok(ReplExit::EndOfInput);
            };
            let message = line.trim();
            if message.is_empty() {
                continue;
            }
            if EXIT_COMMANDS.contains(&message) {
                return Ok(ReplExit::Quit);
            }

            let mut state = RenderState::new();
            if let Err(err) = session.send(message) {
                self.renderer
                    .render(&AgentEvent::error(err.to_string()), &mut state, sinks);
                continue;
            }
            tokio::select! {
                biased;
                () = interrupt.triggered() => {
                    debug!("abandoning in-flight turn");
                    return Ok(ReplExit::Interrupted);
                }
                () = self.render_turn(session, &mut state, sinks) => {}
            }
        }
    }

    async fn render_turn(
        &self,
        session: &mut dyn InteractiveSession,
        state: &mut RenderState,
        sinks: &mut Sinks<'_>,
    ) {
        let mut events = session.stream();
        while let Some(item) = events.next().await {
            let event = item.unwrap_or_else(|err| AgentEvent::error(err.to_string()));
            self.renderer.render(&event, state, sinks);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProviderError;
    use crate::event::{EventStream, TurnSummary};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use futures::stream;
    use tokio::io::AsyncReadExt as _;
    use tokio::io::BufReader;

    #[derive(Default)]
    struct Record {
        sent: Vec<String>,
        closed: usize,
    }

    /// Replays one scripted turn per `send`; a turn marked `hang` never ends.
    struct ScriptedSession {
        turns: VecDeque<ScriptedTurn>,
        queued: Option<ScriptedTurn>,
        record: Arc<Mutex<Record>>,
    }

    type ScriptedTurn = (Vec<Result<AgentEvent, ProviderError>>, bool);

    impl ScriptedSession {
        fn new(turns: Vec<ScriptedTurn>) -> (Self, Arc<Mutex<Record>>) {
            let record = Arc::new(Mutex::new(Record::default()));
            (
                Self {
                    turns: turns.into(),
                    queued: None,
                    record: record.clone(),
                },
                record,
            )
        }
    }

    #[async_trait::async_trait]
    impl InteractiveSession for ScriptedSession {
        fn send(&mut self, message: &str) -> Result<(), ProviderError> {
            if self.queued.is_some() {
                return Err(ProviderError::protocol("script", "a turn is already in progress"));
            }
            self.record.lock().expect("record").sent.push(message.to_string());
            self.queued = self.turns.pop_front();
            Ok(())
        }

        fn stream(&mut self) -> EventStream<'_> {
            match self.queued.take() {
                Some((events, false)) => Box::pin(stream::iter(events)),
                Some((events, true)) => Box::pin(stream::iter(events).chain(stream::pending())),
                None => Box::pin(stream::empty()),
            }
        }

        async fn close(&mut self) {
            self.record.lock().expect("record").closed += 1;
        }
    }

    fn done() -> Result<AgentEvent, ProviderError> {
        Ok(AgentEvent::success(TurnSummary {
            input_tokens: 1,
            output_tokens: 1,
            num_turns: 1,
            duration_ms: 100,
        }))
    }

    async fn run_repl(
        session: &mut ScriptedSession,
        input: &'static str,
    ) -> (Result<ReplExit, HarnessError>, String, String) {
        let (_handle, signal) = interrupt_channel();
        let mut out = String::new();
        let mut err = String::new();
        let exit = {
            let mut sinks = Sinks::new(|s| out.push_str(s)).with_error(|s| err.push_str(s));
            Repl::new(Renderer::plain())
                .run(session, BufReader::new(input.as_bytes()), &mut sinks, signal)
                .await
        };
        (exit, out, err)
    }

    #[tokio::test]
    async fn renders_each_turn_and_exits_on_command() {
        let (mut session, record) = ScriptedSession::new(vec![
            (vec![Ok(AgentEvent::text("hello")), done()], false),
            (vec![Ok(AgentEvent::tool_end("Bash", Some("ls".into()))), done()], false),
        ]);
        let input = "hi\n\n   \nlist files\n/exit\nignored\n";
        let (exit, out, _) = run_repl(&mut session, input).await;

        assert_eq!(exit.expect("repl"), ReplExit::Quit);
        assert_eq!(
            out,
            "> hello\n2 tokens · 1 turn · 0.1s\n> > > [Bash] ls\n2 tokens · 1 turn · 0.1s\n> "
        );
        let record = record.lock().expect("record");
        assert_eq!(record.sent, vec!["hi", "list files"]);
        assert_eq!(record.closed, 1);
    }

    #[tokio::test]
    async fn end_of_input_closes_session() {
        let (mut session, record) = ScriptedSession::new(vec![]);
        let (exit, out, _) = run_repl(&mut session, "").await;
        assert_eq!(exit.expect("repl"), ReplExit::EndOfInput);
        assert_eq!(out, "> ");
        assert_eq!(record.lock().expect("record").closed, 1);
    }

    #[tokio::test]
    async fn quit_alias_is_accepted() {
        let (mut session, _) = ScriptedSession::new(vec![]);
        let (exit, _, _) = run_repl(&mut session, "  /quit  \n").await;
        assert_eq!(exit.expect("repl"), ReplExit::Quit);
    }

    #[tokio::test]
    async fn transport_error_is_rendered_and_loop_continues() {
        let (mut session, record) = ScriptedSession::new(vec![
            (vec![Err(ProviderError::unavailable("claude", "binary not found"))], false),
            (vec![done()], false),
        ]);
        let (exit, out, err) = run_repl(&mut session, "one\ntwo\n").await;
        assert_eq!(exit.expect("repl"), ReplExit::EndOfInput);
        assert!(err.contains("Error: "), "{err}");
        assert!(err.contains("binary not found"), "{err}");
        assert!(out.contains("2 tokens"), "{out}");
        assert_eq!(record.lock().expect("record").sent.len(), 2);
    }

    #[tokio::test]
    async fn interrupt_abandons_turn_and_closes_session() {
        let (mut session, record) =
            ScriptedSession::new(vec![(vec![Ok(AgentEvent::text("partial"))], true)]);
        let (handle, signal) = interrupt_channel();
        let (_writer, reader) = tokio::io::duplex(64);
        let input = b"go\n".as_slice().chain(reader);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.interrupt();
        });

        let mut out = String::new();
        let exit = {
            let mut sinks = Sinks::new(|s| out.push_str(s));
            Repl::new(Renderer::plain())
                .run(&mut session, BufReader::new(input), &mut sinks, signal)
                .await
        };
        assert_eq!(exit.expect("repl"), ReplExit::Interrupted);
        assert_eq!(out, "> partial");
        assert_eq!(record.lock().expect("record").closed, 1);
    }

    #[tokio::test]
    async fn interrupt_while_waiting_for_input() {
        let (mut session, record) = ScriptedSession::new(vec![]);
        let (handle, signal) = interrupt_channel();
        let (_writer, reader) = tokio::io::duplex(64);
        handle.interrupt();

        let mut sinks = Sinks::new(|_| {});
        let exit = Repl::new(Renderer::plain())
            .run(&mut session, BufReader::new(reader), &mut sinks, signal)
            .await;
        assert_eq!(exit.expect("repl"), ReplExit::Interrupted);
        assert!(record.lock().expect("record").sent.is_empty());
        assert_eq!(record.lock().expect("record").closed, 1);
    }
}
