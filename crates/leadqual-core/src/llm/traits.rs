//! LLM trait definitions

use super::ChatMessage;
use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Sampling options for a single completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionOptions {
    pub fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature,
            ..Self::default()
        }
    }
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1024,
        }
    }
}

/// Chat completion service
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate chat completion with explicit sampling options
    async fn chat_completion_with(
        &self,
        messages: Vec<ChatMessage>,
        options: &CompletionOptions,
    ) -> Result<String>;

    /// Generate chat completion with default sampling options
    async fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<String> {
        self.chat_completion_with(messages, &CompletionOptions::default())
            .await
    }

    /// Generate chat completion, forwarding text increments to `tx` as they arrive.
    ///
    /// Returns the full text. Clients without native streaming send the whole
    /// answer as a single increment.
    async fn chat_completion_stream(
        &self,
        messages: Vec<ChatMessage>,
        options: &CompletionOptions,
        tx: mpsc::Sender<String>,
    ) -> Result<String> {
        let content = self.chat_completion_with(messages, options).await?;
        // A dropped receiver only means nobody is listening anymore
        let _ = tx.send(content.clone()).await;
        Ok(content)
    }

    /// Chat model name
    fn chat_model(&self) -> &str;
}

/// Embedding generation trait
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embedding for single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for batch of texts
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Get model name
    fn model_name(&self) -> &str;
}
