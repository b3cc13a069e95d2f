//! Concurrent scoring and email drafting

use super::SelectedLead;
use crate::error::Result;
use crate::llm::{prompts, run_prompt, CompletionOptions, LLMClient, PromptVars};
use std::sync::Arc;

/// Independent outcomes of the two qualification calls
#[derive(Debug)]
pub struct Qualification {
    pub score_justification: Result<String>,
    pub draft_email: Result<String>,
}

/// Scores a lead and drafts an outreach email
pub struct Qualifier {
    client: Arc<dyn LLMClient>,
    scoring_options: CompletionOptions,
    email_options: CompletionOptions,
}

impl Qualifier {
    pub fn new(client: Arc<dyn LLMClient>) -> Self {
        Self {
            client,
            scoring_options: CompletionOptions::with_temperature(0.2),
            email_options: CompletionOptions::with_temperature(0.7),
        }
    }

    /// Run both calls concurrently and wait for both.
    ///
    /// A failure in one half never affects the other.
    pub async fn qualify(&self, lead: &SelectedLead, product: &str) -> Qualification {
        let vars = PromptVars::from([("lead", lead.text.as_str()), ("product", product)]);

        let (score_justification, draft_email) = tokio::join!(
            run_prompt(
                self.client.as_ref(),
                prompts::SCORING_PROMPT,
                &vars,
                &self.scoring_options
            ),
            run_prompt(
                self.client.as_ref(),
                prompts::EMAIL_PROMPT,
                &vars,
                &self.email_options
            ),
        );

        Qualification {
            score_justification,
            draft_email,
        }
    }
}
