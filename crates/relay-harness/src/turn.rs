//! Turn protocol shared by every provider.
//!
//! A [`TurnSession`] owns one vendor conversation (through a [`TurnDriver`])
//! and runs it one turn at a time: `send` queues a message, the event stream
//! launches the vendor call, feeds each output line through a fresh
//! [`TurnAdapter`] and stops after the first `Result`.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use futures::StreamExt as _;
use futures::stream;
use tracing::{debug, warn};

use crate::context::{ContextItem, build_prompt};
use crate::errors::ProviderError;
use crate::event::{AgentEvent, EventStream};
use crate::launcher::LineStream;
use crate::model::ProviderId;
use crate::session::InteractiveSession;

/// Translates vendor output lines into events for a single turn.
pub trait TurnAdapter: Send {
    /// Handles one line. `elapsed` is the wall-clock time since the turn
    /// started, for vendors that do not report a duration.
    fn on_line(&mut self, line: &str, elapsed: Duration) -> Vec<AgentEvent>;
}

/// Vendor side of a session: starts one call per turn and keeps the
/// conversation handle between turns.
#[async_trait::async_trait]
pub trait TurnDriver: Send {
    type Adapter: TurnAdapter + 'static;

    fn provider_id(&self) -> ProviderId;

    /// Adapter state is turn-scoped; a new one is built for every turn.
    fn new_adapter(&self) -> Self::Adapter;

    /// Starts the vendor call for one turn.
    async fn launch(&mut self, prompt: &str) -> Result<LineStream, ProviderError>;

    /// Sees every raw line before adaptation (for example to capture ids).
    fn observe(&mut self, _line: &str) {}

    /// Drops the conversation handle.
    fn release(&mut self) {}
}

/// Observable protocol state of a [`TurnSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Queued,
    Running,
    Closed,
}

enum Phase<A> {
    Idle,
    Queued(String),
    Running {
        lines: LineStream,
        adapter: A,
        started: Instant,
    },
    Closed,
}

/// Generic multi-turn session over a [`TurnDriver`].
pub struct TurnSession<D: TurnDriver> {
    driver: D,
    context: Vec<ContextItem>,
    sent_first: bool,
    phase: Phase<D::Adapter>,
    pending: VecDeque<AgentEvent>,
    /// Output left over after a turn's `Result`; drained before the next
    /// launch so two vendor calls never overlap.
    tail: Option<LineStream>,
}

impl<D: TurnDriver> TurnSession<D> {
    pub fn new(driver: D, context: Vec<ContextItem>) -> Self {
        Self {
            driver,
            context,
            sent_first: false,
            phase: Phase::Idle,
            pending: VecDeque::new(),
            tail: None,
        }
    }

    pub fn state(&self) -> TurnState {
        match self.phase {
            Phase::Idle => TurnState::Idle,
            Phase::Queued(_) => TurnState::Queued,
            Phase::Running { .. } => TurnState::Running,
            Phase::Closed => TurnState::Closed,
        }
    }

    /// Queues a message. Context is prefixed only on the first call of the
    /// session's lifetime.
    pub fn queue(&mut self, message: &str) -> Result<(), ProviderError> {
        match self.phase {
            Phase::Idle => {}
            Phase::Closed => {
                return Err(ProviderError::protocol(
                    self.driver.provider_id(),
                    "session is closed",
                ));
            }
            Phase::Queued(_) | Phase::Running { .. } => {
                return Err(ProviderError::protocol(
                    self.driver.provider_id(),
                    "a turn is already in progress",
                ));
            }
        }
        let prompt = if self.sent_first {
            message.to_string()
        } else {
            self.sent_first = true;
            build_prompt(&self.context, message)
        };
        self.pending.clear();
        self.phase = Phase::Queued(prompt);
        Ok(())
    }

    /// Returns the next event of the current turn, or `None` once the turn's
    /// `Result` has been returned (or nothing is queued).
    pub async fn next_event(&mut self) -> Option<Result<AgentEvent, ProviderError>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                if event.is_result() {
                    self.finish_turn();
                }
                return Some(Ok(event));
            }

            // An abandoned await leaves the session idle; dropping the
            // running line stream kills the vendor call.
            match std::mem::replace(&mut self.phase, Phase::Idle) {
                Phase::Idle => return None,
                Phase::Closed => {
                    self.phase = Phase::Closed;
                    return None;
                }
                Phase::Queued(prompt) => {
                    self.drain_tail().await;
                    let started = Instant::now();
                    match self.driver.launch(&prompt).await {
                        Ok(lines) => {
                            self.phase = Phase::Running {
                                lines,
                                adapter: self.driver.new_adapter(),
                                started,
                            };
                        }
                        Err(err) => return Some(Err(err)),
                    }
                }
                Phase::Running {
                    mut lines,
                    mut adapter,
                    started,
                } => match lines.next().await {
                    Some(Ok(line)) => {
                        self.driver.observe(&line);
                        let events = adapter.on_line(&line, started.elapsed());
                        self.enqueue(events);
                        self.phase = Phase::Running {
                            lines,
                            adapter,
                            started,
                        };
                    }
                    Some(Err(err)) => return Some(Err(err)),
                    None => {
                        let provider = self.driver.provider_id();
                        warn!(provider = %provider, "vendor output ended without a result");
                        self.pending.push_back(AgentEvent::failure(Some(vec![format!(
                            "{provider} ended the turn without a result"
                        )])));
                    }
                },
            }
        }
    }

    /// Waits for the last vendor call to exit.
    pub async fn finish(&mut self) {
        self.drain_tail().await;
    }

    pub fn close_now(&mut self) {
        self.phase = Phase::Closed;
        self.pending.clear();
        self.tail = None;
        self.driver.release();
    }

    fn enqueue(&mut self, events: Vec<AgentEvent>) {
        for event in events {
            let is_result = event.is_result();
            self.pending.push_back(event);
            if is_result {
                break;
            }
        }
    }

    fn finish_turn(&mut self) {
        self.pending.clear();
        if let Phase::Running { lines, .. } = std::mem::replace(&mut self.phase, Phase::Idle) {
            self.tail = Some(lines);
        }
    }

    async fn drain_tail(&mut self) {
        if let Some(mut tail) = self.tail.take() {
            while let Some(item) = tail.next().await {
                if let Err(err) = item {
                    debug!(error = %err, "vendor call failed after its result");
                }
            }
        }
    }
}

impl<D: TurnDriver + 'static> TurnSession<D> {
    /// One-shot stream: a fresh session with `prompt` queued, ending after the
    /// vendor call exits.
    pub fn one_shot(driver: D, context: Vec<ContextItem>, prompt: &str) -> EventStream<'static> {
        let mut session = Self::new(driver, context);
        session.sent_first = true;
        session.phase = Phase::Queued(build_prompt(&session.context, prompt));
        Box::pin(stream::unfold(Some(session), |session| async move {
            let mut session = session?;
            match session.next_event().await {
                Some(event) => Some((event, Some(session))),
                None => {
                    session.finish().await;
                    None
                }
            }
        }))
    }
}

#[async_trait::async_trait]
impl<D: TurnDriver + 'static> InteractiveSession for TurnSession<D> {
    fn send(&mut self, message: &str) -> Result<(), ProviderError> {
        self.queue(message)
    }

    fn stream(&mut self) -> EventStream<'_> {
        Box::pin(stream::unfold(self, |session| async move {
            let event = session.next_event().await?;
            Some((event, session))
        }))
    }

    async fn close(&mut self) {
        self.close_now();
    }
}
