//! LLM integration
//!
//! Provides traits and implementations for:
//! - Chat completion via OpenAI-compatible services (Ollama, vLLM, OpenAI)
//! - Streaming completion for the multi-agent router
//! - Embedding generation for the vector store
//! - Prompt templates with named placeholders

mod cache;
mod client;
mod prompt;
pub mod prompts;
mod traits;

pub use cache::{CacheStats, TtlCache};
pub use client::{ChatMessage, MetricsSnapshot, VLLMClient};
pub use prompt::{render_template, run_prompt, template_variables, PromptVars};
pub use traits::*;

/// Extract the outermost JSON object from an LLM answer.
///
/// Models often wrap JSON in markdown fences or a sentence of prose; the text
/// between the first `{` and the last `}` is returned when both exist.
pub fn extract_json_object(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (start < end).then(|| &response[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_from_fence() {
        let answer = "Sure!\n```json\n{\"company\": \"Acme\"}\n```";
        assert_eq!(extract_json_object(answer), Some("{\"company\": \"Acme\"}"));
    }

    #[test]
    fn test_extract_json_missing() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }
}
