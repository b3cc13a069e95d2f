//! Description → LeadFilter

use super::LeadFilter;
use crate::error::{LeadQualError, Result};
use crate::llm::{extract_json_object, prompts, run_prompt, CompletionOptions, LLMClient, PromptVars};
use std::sync::Arc;

/// Extracts a [`LeadFilter`] from a free-text lead description
pub struct FilterExtractor {
    client: Arc<dyn LLMClient>,
    options: CompletionOptions,
}

impl FilterExtractor {
    pub fn new(client: Arc<dyn LLMClient>) -> Self {
        Self {
            client,
            // Extraction wants the most literal answer the model can give
            options: CompletionOptions::with_temperature(0.0),
        }
    }

    /// One completion call; the answer must contain a single JSON object.
    ///
    /// Completion failures propagate as-is. An answer that does not parse
    /// into a filter is [`LeadQualError::MalformedExtraction`] and is not retried.
    pub async fn extract(&self, description: &str) -> Result<LeadFilter> {
        let vars = PromptVars::from([("input", description)]);
        let response = run_prompt(
            self.client.as_ref(),
            prompts::FILTER_PROMPT,
            &vars,
            &self.options,
        )
        .await?;

        parse_filter(&response)
    }
}

fn parse_filter(response: &str) -> Result<LeadFilter> {
    let json = extract_json_object(response).ok_or_else(|| {
        LeadQualError::MalformedExtraction(format!("no JSON object in response: {}", preview(response)))
    })?;

    serde_json::from_str(json).map_err(|e| {
        tracing::warn!("Filter extraction returned unparseable JSON: {}", e);
        LeadQualError::MalformedExtraction(format!("{}: {}", e, preview(response)))
    })
}

fn preview(text: &str) -> String {
    const MAX: usize = 120;
    let text = text.trim();
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let filter = parse_filter(
            r#"{"company": "Acme", "department": "procurement", "title_keywords": ["buyer"]}"#,
        )
        .unwrap();
        assert_eq!(filter.company.as_deref(), Some("Acme"));
        assert_eq!(filter.department.as_deref(), Some("procurement"));
        assert_eq!(filter.title_keywords, vec!["buyer"]);
    }

    #[test]
    fn test_parse_fenced_json() {
        let filter = parse_filter("Here you go:\n```json\n{\"company\": \"Globex\"}\n```").unwrap();
        assert_eq!(filter.company.as_deref(), Some("Globex"));
        assert!(filter.title_keywords.is_empty());
    }

    #[test]
    fn test_parse_garbage_is_malformed() {
        assert!(matches!(
            parse_filter("I could not find anything."),
            Err(LeadQualError::MalformedExtraction(_))
        ));
        assert!(matches!(
            parse_filter(r#"{"company": 42}"#),
            Err(LeadQualError::MalformedExtraction(_))
        ));
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let long = "é".repeat(200);
        let p = preview(&long);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), 123);
    }
}
