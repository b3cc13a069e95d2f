//! Specialist sub-agents the router can delegate to

use crate::error::Result;
use crate::llm::{prompts, ChatMessage, CompletionOptions, LLMClient};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Prefix applied to every enrichment result
pub const ENRICHED_PREFIX: &str = "Enriched Lead:\n";

/// The closed set of specialists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialistKind {
    #[serde(rename = "lead_enricher")]
    Enrich,
    #[serde(rename = "lead_scorer")]
    Score,
    #[serde(rename = "email_writer")]
    Draft,
}

impl SpecialistKind {
    pub const ALL: [SpecialistKind; 3] = [Self::Enrich, Self::Score, Self::Draft];

    pub fn name(self) -> &'static str {
        match self {
            Self::Enrich => "lead_enricher",
            Self::Score => "lead_scorer",
            Self::Draft => "email_writer",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name.trim())
    }

    /// Intended use, shown to the planner
    pub fn description(self) -> &'static str {
        match self {
            Self::Enrich => {
                "Enrich basic lead info (name, email, company) with company details and role guesses"
            }
            Self::Score => {
                "Evaluate and score a lead on title, company size, industry and product relevance"
            }
            Self::Draft => "Take an enriched lead profile and write an initial outreach email",
        }
    }

    pub fn system_prompt(self) -> &'static str {
        match self {
            Self::Enrich => prompts::ENRICHER_SYSTEM,
            Self::Score => prompts::SCORER_SYSTEM,
            Self::Draft => prompts::WRITER_SYSTEM,
        }
    }

    pub fn temperature(self) -> f32 {
        match self {
            Self::Score => 0.2,
            Self::Enrich | Self::Draft => 0.7,
        }
    }

    /// Whether running this specialist ends the turn
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Draft)
    }

    pub fn info(self) -> SpecialistInfo {
        SpecialistInfo {
            name: self.name().to_string(),
            description: self.description().to_string(),
        }
    }
}

impl fmt::Display for SpecialistKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the planner knows about a specialist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialistInfo {
    pub name: String,
    pub description: String,
}

/// A specialist bound to a completion client
#[derive(Clone)]
pub struct Specialist {
    kind: SpecialistKind,
    client: Arc<dyn LLMClient>,
}

impl Specialist {
    pub fn new(kind: SpecialistKind, client: Arc<dyn LLMClient>) -> Self {
        Self { kind, client }
    }

    pub fn kind(&self) -> SpecialistKind {
        self.kind
    }

    fn messages(&self, argument: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.kind.system_prompt()),
            ChatMessage::user(argument),
        ]
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions::with_temperature(self.kind.temperature())
    }

    fn finish(&self, output: String) -> String {
        match self.kind {
            SpecialistKind::Enrich => format!("{}{}", ENRICHED_PREFIX, output),
            _ => output,
        }
    }

    pub async fn run(&self, argument: &str) -> Result<String> {
        let output = self
            .client
            .chat_completion_with(self.messages(argument), &self.options())
            .await?;
        Ok(self.finish(output))
    }

    /// Like [`run`](Self::run), forwarding increments to `tx` as they arrive
    pub async fn run_streaming(&self, argument: &str, tx: mpsc::Sender<String>) -> Result<String> {
        if self.kind == SpecialistKind::Enrich {
            let _ = tx.send(ENRICHED_PREFIX.to_string()).await;
        }
        let output = self
            .client
            .chat_completion_stream(self.messages(argument), &self.options(), tx)
            .await?;
        Ok(self.finish(output))
    }
}
