//! Multi-agent router: planner-driven hand-offs to specialists

use super::planner::{Planner, RouterDecision};
use super::specialist::{Specialist, SpecialistInfo, SpecialistKind};
use crate::error::{LeadQualError, Result};
use crate::llm::{ChatMessage, LLMClient};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Name used for the router itself in hand-off events
pub const ROUTER_NAME: &str = "router";

/// Default bound on hand-offs per turn
pub const DEFAULT_MAX_HANDOFFS: usize = 6;

const EVENT_BUFFER: usize = 64;

/// One delegation from the router to a specialist.
///
/// `from` is always [`ROUTER_NAME`]; specialists never hand off to each other.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandoffEvent {
    pub from: String,
    pub to: String,
    pub argument: String,
    pub at: DateTime<Utc>,
}

/// Items emitted while a turn is running
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum RouterEvent {
    Handoff(HandoffEvent),
    /// Increment of the reply text
    Delta(String),
}

/// Final result of a turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouterReply {
    pub content: String,
    pub handoffs: Vec<HandoffEvent>,
}

/// Shared router configuration. Cheap to clone.
#[derive(Clone)]
pub struct Router {
    planner: Arc<dyn Planner>,
    specialists: Arc<Vec<Specialist>>,
    max_handoffs: usize,
}

impl Router {
    /// Router with all three specialists bound to `client`
    pub fn new(planner: Arc<dyn Planner>, client: Arc<dyn LLMClient>) -> Self {
        let specialists = SpecialistKind::ALL
            .into_iter()
            .map(|kind| Specialist::new(kind, client.clone()))
            .collect();
        Self {
            planner,
            specialists: Arc::new(specialists),
            max_handoffs: DEFAULT_MAX_HANDOFFS,
        }
    }

    pub fn with_max_handoffs(mut self, max_handoffs: usize) -> Self {
        self.max_handoffs = max_handoffs.max(1);
        self
    }

    pub fn specialists(&self) -> Vec<SpecialistInfo> {
        self.specialists.iter().map(|s| s.kind().info()).collect()
    }

    fn specialist(&self, kind: SpecialistKind) -> Result<&Specialist> {
        self.specialists
            .iter()
            .find(|s| s.kind() == kind)
            .ok_or_else(|| LeadQualError::Router(format!("specialist {} not registered", kind)))
    }

    /// Start a conversation that keeps its history across turns
    pub fn session(&self) -> RouterSession {
        RouterSession {
            router: self.clone(),
            conversation: Vec::new(),
        }
    }

    /// Run one turn in the background.
    ///
    /// The receiver yields hand-off events and reply increments and closes when
    /// the turn ends; the handle yields the final reply.
    pub fn stream(
        &self,
        input: impl Into<String>,
    ) -> (mpsc::Receiver<RouterEvent>, JoinHandle<Result<RouterReply>>) {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let mut session = self.session();
        let input = input.into();
        let handle = tokio::spawn(async move { session.turn(&input, &tx).await });
        (rx, handle)
    }

    /// Like [`Router::stream`], but the turn is abandoned after `deadline`.
    ///
    /// On expiry the in-flight calls are dropped, the receiver closes and the
    /// handle yields [`LeadQualError::DeadlineExceeded`].
    pub fn stream_with_deadline(
        &self,
        input: impl Into<String>,
        deadline: Duration,
    ) -> (mpsc::Receiver<RouterEvent>, JoinHandle<Result<RouterReply>>) {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let mut session = self.session();
        let input = input.into();
        let handle = tokio::spawn(async move {
            match tokio::time::timeout(deadline, session.turn(&input, &tx)).await {
                Ok(reply) => reply,
                Err(_) => {
                    tracing::warn!("Router turn exceeded deadline of {:?}", deadline);
                    Err(LeadQualError::DeadlineExceeded(deadline.as_millis() as u64))
                }
            }
        });
        (rx, handle)
    }

    /// Run one turn and return only the final reply
    pub async fn run(&self, input: &str) -> Result<RouterReply> {
        let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);
        let mut session = self.session();

        let turn = async move { session.turn(input, &tx).await };
        let drain = async move { while rx.recv().await.is_some() {} };
        let (reply, _) = tokio::join!(turn, drain);
        reply
    }
}

/// A conversation with the router
pub struct RouterSession {
    router: Router,
    conversation: Vec<ChatMessage>,
}

impl RouterSession {
    pub fn history(&self) -> &[ChatMessage] {
        &self.conversation
    }

    /// Process one user message.
    ///
    /// Every hand-off is announced on `tx` before its specialist runs. The
    /// reply text is sent as [`RouterEvent::Delta`] increments; the drafting
    /// specialist streams, anything else arrives as one increment.
    pub async fn turn(&mut self, input: &str, tx: &mpsc::Sender<RouterEvent>) -> Result<RouterReply> {
        if input.trim().is_empty() {
            return Err(LeadQualError::InvalidInput("message cannot be empty".to_string()));
        }

        self.conversation.push(ChatMessage::user(input));
        let infos = self.router.specialists();
        let mut handoffs: Vec<HandoffEvent> = Vec::new();
        let mut last_output: Option<String> = None;

        loop {
            if handoffs.len() >= self.router.max_handoffs {
                tracing::warn!(
                    "Router reached {} hand-offs without a final answer",
                    self.router.max_handoffs
                );
                let content = last_output.ok_or_else(|| {
                    LeadQualError::Router("hand-off limit reached without output".to_string())
                })?;
                return Ok(self.finish(content, handoffs, tx).await);
            }

            let decision = self.router.planner.plan(&self.conversation, &infos).await?;

            let (kind, argument) = match decision {
                RouterDecision::Respond(text) => {
                    // Intermediate specialist output is the answer, not the planner's summary
                    let content = last_output.unwrap_or(text);
                    return Ok(self.finish(content, handoffs, tx).await);
                }
                RouterDecision::Handoff {
                    specialist,
                    argument,
                } => (specialist, argument),
            };

            let argument = if argument.trim().is_empty() {
                self.transcript()
            } else {
                argument
            };

            let event = HandoffEvent {
                from: ROUTER_NAME.to_string(),
                to: kind.name().to_string(),
                argument: argument.clone(),
                at: Utc::now(),
            };
            tracing::info!("Hand-off {} -> {}", event.from, event.to);
            let _ = tx.send(RouterEvent::Handoff(event.clone())).await;
            handoffs.push(event);

            let specialist = self.router.specialist(kind)?.clone();

            if kind.is_terminal() {
                let output = run_forwarding(&specialist, &argument, tx).await?;
                self.conversation.push(ChatMessage::assistant(output.clone()));
                return Ok(RouterReply {
                    content: output,
                    handoffs,
                });
            }

            let output = specialist.run(&argument).await?;
            tracing::debug!("{} returned {} chars", kind, output.len());
            self.conversation.push(ChatMessage::assistant(format!(
                "Called {} with: {}",
                kind, argument
            )));
            self.conversation
                .push(ChatMessage::user(format!("Result from {}:\n{}", kind, output)));
            last_output = Some(output);
        }
    }

    async fn finish(
        &mut self,
        content: String,
        handoffs: Vec<HandoffEvent>,
        tx: &mpsc::Sender<RouterEvent>,
    ) -> RouterReply {
        let _ = tx.send(RouterEvent::Delta(content.clone())).await;
        self.conversation.push(ChatMessage::assistant(content.clone()));
        RouterReply { content, handoffs }
    }

    /// User and assistant text of the conversation so far
    fn transcript(&self) -> String {
        self.conversation
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Run a specialist in streaming mode, relaying increments as router events
async fn run_forwarding(
    specialist: &Specialist,
    argument: &str,
    tx: &mpsc::Sender<RouterEvent>,
) -> Result<String> {
    let (delta_tx, mut delta_rx) = mpsc::channel::<String>(EVENT_BUFFER);

    let produce = specialist.run_streaming(argument, delta_tx);
    // Owns the receiver so a gone consumer closes the channel and unblocks the producer
    let forward = async move {
        while let Some(delta) = delta_rx.recv().await {
            if tx.send(RouterEvent::Delta(delta)).await.is_err() {
                break;
            }
        }
    };

    let (output, _) = tokio::join!(produce, forward);
    output
}
