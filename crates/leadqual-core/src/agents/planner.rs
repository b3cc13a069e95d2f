//! Routing decisions

use super::specialist::{SpecialistInfo, SpecialistKind};
use crate::error::{LeadQualError, Result};
use crate::llm::{extract_json_object, prompts, ChatMessage, CompletionOptions, LLMClient};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

/// What the router does next
#[derive(Debug, Clone, PartialEq)]
pub enum RouterDecision {
    /// Delegate to a specialist with the given argument
    Handoff {
        specialist: SpecialistKind,
        argument: String,
    },
    /// Answer the user directly
    Respond(String),
}

/// Chooses the next step from the conversation so far
#[async_trait]
pub trait Planner: Send + Sync {
    async fn plan(
        &self,
        conversation: &[ChatMessage],
        specialists: &[SpecialistInfo],
    ) -> Result<RouterDecision>;
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum PlannerAnswer {
    Handoff {
        specialist: String,
        #[serde(default)]
        argument: String,
    },
    Respond {
        #[serde(default)]
        content: String,
    },
}

/// Planner backed by a completion model and the host instruction
pub struct LlmPlanner {
    client: Arc<dyn LLMClient>,
    options: CompletionOptions,
}

impl LlmPlanner {
    pub fn new(client: Arc<dyn LLMClient>) -> Self {
        Self {
            client,
            options: CompletionOptions::with_temperature(0.0),
        }
    }

    fn system_prompt(specialists: &[SpecialistInfo]) -> String {
        let catalogue = specialists
            .iter()
            .map(|s| format!("- {}: {}", s.name, s.description))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "{}\n\nAvailable tools:\n{}\n\n\
             Answer with a single JSON object and nothing else.\n\
             To call a tool: {{\"action\": \"handoff\", \"specialist\": \"<tool name>\", \"argument\": \"<input for the tool>\"}}\n\
             To answer the user directly: {{\"action\": \"respond\", \"content\": \"<answer>\"}}",
            prompts::ROUTER_SYSTEM,
            catalogue
        )
    }
}

#[async_trait]
impl Planner for LlmPlanner {
    async fn plan(
        &self,
        conversation: &[ChatMessage],
        specialists: &[SpecialistInfo],
    ) -> Result<RouterDecision> {
        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(ChatMessage::system(Self::system_prompt(specialists)));
        messages.extend_from_slice(conversation);

        let response = self
            .client
            .chat_completion_with(messages, &self.options)
            .await?;
        parse_decision(&response)
    }
}

/// Parse a planner answer. Text without a JSON object is a direct response.
pub(crate) fn parse_decision(response: &str) -> Result<RouterDecision> {
    let Some(json) = extract_json_object(response) else {
        tracing::warn!("Planner answered without JSON, treating it as a direct response");
        return Ok(RouterDecision::Respond(response.trim().to_string()));
    };

    let answer: PlannerAnswer = serde_json::from_str(json)
        .map_err(|e| LeadQualError::Router(format!("unreadable planner decision: {}", e)))?;

    match answer {
        PlannerAnswer::Handoff {
            specialist,
            argument,
        } => {
            let kind = SpecialistKind::from_name(&specialist).ok_or_else(|| {
                LeadQualError::Router(format!("unknown specialist: {}", specialist))
            })?;
            Ok(RouterDecision::Handoff {
                specialist: kind,
                argument,
            })
        }
        PlannerAnswer::Respond { content } => Ok(RouterDecision::Respond(content)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_handoff() {
        let decision = parse_decision(
            r#"{"action": "handoff", "specialist": "lead_scorer", "argument": "Jane, CTO"}"#,
        )
        .unwrap();
        assert_eq!(
            decision,
            RouterDecision::Handoff {
                specialist: SpecialistKind::Score,
                argument: "Jane, CTO".into()
            }
        );
    }

    #[test]
    fn test_parse_respond_and_prose() {
        assert_eq!(
            parse_decision(r#"{"action": "respond", "content": "Hello"}"#).unwrap(),
            RouterDecision::Respond("Hello".into())
        );
        assert_eq!(
            parse_decision("  Just text  ").unwrap(),
            RouterDecision::Respond("Just text".into())
        );
    }

    #[test]
    fn test_unknown_specialist_rejected() {
        let err = parse_decision(r#"{"action": "handoff", "specialist": "web_search"}"#).unwrap_err();
        assert!(matches!(err, LeadQualError::Router(_)));
    }

    #[test]
    fn test_system_prompt_lists_specialists() {
        let infos: Vec<_> = SpecialistKind::ALL.iter().map(|k| k.info()).collect();
        let prompt = LlmPlanner::system_prompt(&infos);
        assert!(prompt.contains("- lead_enricher:"));
        assert!(prompt.contains("- email_writer:"));
        assert!(prompt.contains("\"action\": \"handoff\""));
    }
}
