//! HTTP client for OpenAI-compatible LLM services (Ollama, vLLM, OpenAI, etc.)

use super::cache::{embedding_cache_key, TtlCache};
use super::{CompletionOptions, Embedder, LLMClient};
use crate::config::LLMServiceConfig;
use crate::error::{LeadQualError, Result};
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Chat message for completion requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// API metrics for monitoring
#[derive(Debug, Default)]
pub struct APIMetrics {
    pub total_requests: AtomicU64,
    pub total_errors: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    pub total_latency_ms: AtomicU64,
}

/// Snapshot of API metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub total_errors: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate: f64,
    pub avg_latency_ms: f64,
}

/// OpenAI-compatible client used for both chat completions and embeddings
pub struct VLLMClient {
    http_client: reqwest::Client,
    config: LLMServiceConfig,
    embedding_dimensions: usize,
    cache: Arc<TtlCache<Vec<f32>>>,
    metrics: Arc<APIMetrics>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatStreamChunk {
    choices: Vec<ChatStreamChoice>,
}

#[derive(Deserialize)]
struct ChatStreamChoice {
    #[serde(default)]
    delta: ChatDelta,
}

#[derive(Deserialize, Default)]
struct ChatDelta {
    #[serde(default)]
    content: Option<String>,
}

impl VLLMClient {
    /// Create new client from configuration
    pub fn new(config: LLMServiceConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        // nomic-embed-text produces 768-dimensional vectors
        let embedding_dimensions = config.embedding_dimensions.unwrap_or(768);

        Ok(Self {
            http_client,
            config,
            embedding_dimensions,
            cache: Arc::new(TtlCache::new()),
            metrics: Arc::new(APIMetrics::default()),
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(LLMServiceConfig::default())
    }

    /// Copy of this client that talks to a different chat model
    pub fn with_chat_model(&self, model: impl Into<String>) -> Self {
        let mut config = self.config.clone();
        config.model = model.into();
        Self {
            http_client: self.http_client.clone(),
            config,
            embedding_dimensions: self.embedding_dimensions,
            cache: Arc::clone(&self.cache),
            metrics: Arc::clone(&self.metrics),
        }
    }

    /// Get current API metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        let total = self.metrics.total_requests.load(Ordering::Relaxed);
        let hits = self.metrics.cache_hits.load(Ordering::Relaxed);
        let misses = self.metrics.cache_misses.load(Ordering::Relaxed);

        MetricsSnapshot {
            total_requests: total,
            total_errors: self.metrics.total_errors.load(Ordering::Relaxed),
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate: if hits + misses > 0 {
                hits as f64 / (hits + misses) as f64 * 100.0
            } else {
                0.0
            },
            avg_latency_ms: if total > 0 {
                self.metrics.total_latency_ms.load(Ordering::Relaxed) as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    fn record_error(&self) {
        self.metrics.total_errors.fetch_add(1, Ordering::Relaxed);
    }

    fn record_latency(&self, start: Instant) {
        let elapsed = start.elapsed().as_millis() as u64;
        self.metrics
            .total_latency_ms
            .fetch_add(elapsed, Ordering::Relaxed);
    }

    async fn post_chat(&self, request: &ChatRequest<'_>) -> Result<reqwest::Response> {
        self.metrics.total_requests.fetch_add(1, Ordering::Relaxed);

        let url = format!("{}/v1/chat/completions", self.config.url);
        let mut req = self.http_client.post(&url).json(request);
        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req.send().await.map_err(|e| {
            self.record_error();
            LeadQualError::Completion(format!("request to {} failed: {}", url, e))
        })?;

        if !response.status().is_success() {
            self.record_error();
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LeadQualError::Completion(format!(
                "LLM service error (HTTP {}): {}",
                status, body
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl LLMClient for VLLMClient {
    async fn chat_completion_with(
        &self,
        messages: Vec<ChatMessage>,
        options: &CompletionOptions,
    ) -> Result<String> {
        let start = Instant::now();
        let request = ChatRequest {
            model: &self.config.model,
            messages: &messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stream: false,
        };

        let response = self.post_chat(&request).await?;
        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            self.record_error();
            LeadQualError::Completion(format!("invalid completion payload: {}", e))
        })?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| {
                self.record_error();
                LeadQualError::Completion("No response from LLM".to_string())
            })?
            .message
            .content;

        self.record_latency(start);
        Ok(content)
    }

    async fn chat_completion_stream(
        &self,
        messages: Vec<ChatMessage>,
        options: &CompletionOptions,
        tx: mpsc::Sender<String>,
    ) -> Result<String> {
        let start = Instant::now();
        let request = ChatRequest {
            model: &self.config.model,
            messages: &messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stream: true,
        };

        let response = self.post_chat(&request).await?;
        let mut body = response.bytes_stream();
        let mut lines = SseLineBuffer::default();
        let mut full = String::new();
        let mut finished = false;

        'read: while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| {
                self.record_error();
                LeadQualError::Completion(format!("stream interrupted: {}", e))
            })?;
            lines.extend(&chunk);

            while let Some(line) = lines.next_line() {
                match line {
                    SseLine::Done => {
                        finished = true;
                        break 'read;
                    }
                    SseLine::Delta(delta) => {
                        full.push_str(&delta);
                        if tx.send(delta).await.is_err() {
                            tracing::debug!("Stream consumer went away, stopping early");
                            finished = true;
                            break 'read;
                        }
                    }
                    SseLine::Skip => {}
                }
            }
        }

        // The last event may arrive without a trailing newline
        if !finished {
            if let Some(SseLine::Delta(delta)) = lines.finish() {
                full.push_str(&delta);
                let _ = tx.send(delta).await;
            }
        }

        self.record_latency(start);
        Ok(full)
    }

    fn chat_model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl Embedder for VLLMClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| LeadQualError::Completion("No embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = Instant::now();

        let mut results: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut uncached_texts = Vec::new();
        let mut uncached_indices = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            let key = embedding_cache_key(&self.config.embedding_model, text);
            if let Some(cached) = self.cache.get(&key) {
                self.metrics.cache_hits.fetch_add(1, Ordering::Relaxed);
                results.push(Some(cached));
                continue;
            }
            self.metrics.cache_misses.fetch_add(1, Ordering::Relaxed);
            results.push(None);
            uncached_texts.push(text.clone());
            uncached_indices.push(i);
        }

        if uncached_texts.is_empty() {
            tracing::debug!("All {} embeddings from cache", texts.len());
            return Ok(results.into_iter().flatten().collect());
        }

        tracing::debug!(
            "Embedding batch: {} cached, {} to fetch",
            texts.len() - uncached_texts.len(),
            uncached_texts.len()
        );

        #[derive(Serialize)]
        struct EmbedRequest<'a> {
            model: &'a str,
            input: &'a [String],
        }

        #[derive(Deserialize)]
        struct EmbedResponse {
            data: Vec<EmbedData>,
        }

        #[derive(Deserialize)]
        struct EmbedData {
            embedding: Vec<f32>,
        }

        self.metrics.total_requests.fetch_add(1, Ordering::Relaxed);

        let request = EmbedRequest {
            model: &self.config.embedding_model,
            input: &uncached_texts,
        };
        let url = format!("{}/v1/embeddings", self.config.embeddings_url());

        let mut req = self.http_client.post(&url).json(&request);
        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req.send().await.map_err(|e| {
            self.record_error();
            LeadQualError::Http(e)
        })?;

        if !response.status().is_success() {
            self.record_error();
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LeadQualError::Completion(format!(
                "Embedding service error (HTTP {}): {}",
                status, body
            )));
        }

        let embed_response: EmbedResponse = response.json().await.map_err(|e| {
            self.record_error();
            LeadQualError::Http(e)
        })?;

        if embed_response.data.len() != uncached_texts.len() {
            self.record_error();
            return Err(LeadQualError::Completion(format!(
                "Embedding service returned {} vectors for {} inputs",
                embed_response.data.len(),
                uncached_texts.len()
            )));
        }

        for ((data, idx), text) in embed_response
            .data
            .into_iter()
            .zip(uncached_indices)
            .zip(&uncached_texts)
        {
            let key = embedding_cache_key(&self.config.embedding_model, text);
            self.cache.insert(key, data.embedding.clone());
            results[idx] = Some(data.embedding);
        }

        self.record_latency(start);
        Ok(results.into_iter().flatten().collect())
    }

    fn dimensions(&self) -> usize {
        self.embedding_dimensions
    }

    fn model_name(&self) -> &str {
        &self.config.embedding_model
    }
}

enum SseLine {
    Delta(String),
    Done,
    Skip,
}

/// Splits a byte stream into complete lines.
///
/// Only whole lines are decoded so multi-byte characters never split.
#[derive(Default)]
struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    fn extend(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    fn next_line(&mut self) -> Option<SseLine> {
        let newline = self.pending.iter().position(|b| *b == b'\n')?;
        let line: Vec<u8> = self.pending.drain(..=newline).collect();
        Some(parse_sse_line(&String::from_utf8_lossy(&line)))
    }

    /// Parse whatever is left once the body has ended
    fn finish(self) -> Option<SseLine> {
        if self.pending.iter().all(u8::is_ascii_whitespace) {
            return None;
        }
        Some(parse_sse_line(&String::from_utf8_lossy(&self.pending)))
    }
}

/// Interpret one line of an OpenAI-style server-sent event stream
fn parse_sse_line(line: &str) -> SseLine {
    let line = line.trim();
    let Some(payload) = line.strip_prefix("data:") else {
        return SseLine::Skip;
    };
    let payload = payload.trim();
    if payload == "[DONE]" {
        return SseLine::Done;
    }

    match serde_json::from_str::<ChatStreamChunk>(payload) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta.content)
            .filter(|s| !s.is_empty())
            .map(SseLine::Delta)
            .unwrap_or(SseLine::Skip),
        Err(e) => {
            tracing::warn!("Skipping unparseable stream chunk: {}", e);
            SseLine::Skip
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sse_delta() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hi "}}]}"#;
        assert!(matches!(parse_sse_line(line), SseLine::Delta(ref s) if s == "Hi "));
    }

    #[test]
    fn test_parse_sse_done_and_noise() {
        assert!(matches!(parse_sse_line("data: [DONE]\n"), SseLine::Done));
        assert!(matches!(parse_sse_line(": keep-alive"), SseLine::Skip));
        assert!(matches!(parse_sse_line(""), SseLine::Skip));
        assert!(matches!(
            parse_sse_line(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#),
            SseLine::Skip
        ));
    }

    #[test]
    fn test_line_buffer_keeps_unterminated_tail() {
        let mut lines = SseLineBuffer::default();
        lines.extend(b"data: {\"choices\":[{\"delta\":{\"content\":\"Dear \"}}]}\n\ndata: {\"choi");
        lines.extend(b"ces\":[{\"delta\":{\"content\":\"Ana\"}}]}");

        assert!(matches!(lines.next_line(), Some(SseLine::Delta(ref s)) if s == "Dear "));
        assert!(matches!(lines.next_line(), Some(SseLine::Skip)));
        assert!(lines.next_line().is_none());
        assert!(matches!(lines.finish(), Some(SseLine::Delta(ref s)) if s == "Ana"));
    }

    #[test]
    fn test_line_buffer_ignores_blank_tail() {
        let mut lines = SseLineBuffer::default();
        lines.extend(b"data: [DONE]\n\n");
        assert!(matches!(lines.next_line(), Some(SseLine::Done)));
        assert!(matches!(lines.next_line(), Some(SseLine::Skip)));
        assert!(lines.finish().is_none());
    }

    #[test]
    fn test_chat_request_shape() {
        let messages = vec![ChatMessage::system("s"), ChatMessage::user("u")];
        let request = ChatRequest {
            model: "llama3.1:8b",
            messages: &messages,
            temperature: 0.2,
            max_tokens: 256,
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "llama3.1:8b");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn test_metrics_start_empty() {
        let client = VLLMClient::new(LLMServiceConfig {
            url: "http://localhost:1".to_string(),
            model: "m".to_string(),
            embedding_url: None,
            embedding_model: "e".to_string(),
            embedding_dimensions: Some(4),
            api_key: None,
            timeout_secs: 1,
        })
        .unwrap();
        let metrics = client.metrics();
        assert_eq!(metrics.total_requests, 0);
        assert_eq!(client.dimensions(), 4);
        assert_eq!(Embedder::model_name(&client), "e");
        assert_eq!(client.chat_model(), "m");
    }
}
