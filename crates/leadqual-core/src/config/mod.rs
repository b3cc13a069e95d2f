//! Configuration management
//!
//! Values come from `config.yml` in the user config directory when it exists.
//! Every default can be overridden through a `LEADQUAL_*` environment variable.

use crate::error::{LeadQualError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// LLM service configuration
    #[serde(default)]
    pub llm_service: LLMServiceConfig,

    /// Qualification pipeline settings
    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// Vector store settings
    #[serde(default)]
    pub store: StoreSettings,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerSettings,

    /// Multi-agent router settings
    #[serde(default)]
    pub router: RouterSettings,
}

/// LLM service configuration for external inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMServiceConfig {
    /// Base URL of the OpenAI-compatible service for chat/completions
    pub url: String,

    /// Model name for chat completions
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Base URL for embeddings service (can be different from LLM URL)
    #[serde(default)]
    pub embedding_url: Option<String>,

    /// Model name for embeddings
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Embedding dimensions (768 when unset)
    #[serde(default)]
    pub embedding_dimensions: Option<usize>,

    /// API key (optional, for authenticated services)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl LLMServiceConfig {
    /// Get the embeddings URL (falls back to main URL if not specified)
    pub fn embeddings_url(&self) -> &str {
        self.embedding_url.as_deref().unwrap_or(&self.url)
    }
}

impl Default for LLMServiceConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("LEADQUAL_LLM_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            model: default_chat_model(),
            embedding_url: std::env::var("LEADQUAL_EMBEDDING_URL").ok(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: std::env::var("LEADQUAL_EMBEDDING_DIMS")
                .ok()
                .and_then(|s| s.parse().ok()),
            api_key: std::env::var("LEADQUAL_LLM_API_KEY").ok(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_chat_model() -> String {
    std::env::var("LEADQUAL_LLM_MODEL").unwrap_or_else(|_| "llama3.1:8b".to_string())
}

fn default_embedding_model() -> String {
    std::env::var("LEADQUAL_EMBEDDING_MODEL")
        .unwrap_or_else(|_| "nomic-embed-text:v1.5".to_string())
}

fn default_timeout() -> u64 {
    60
}

/// Qualification pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Minimum relevance a candidate needs to be selected
    #[serde(default = "default_min_relevance")]
    pub min_relevance: f64,

    /// Number of candidates requested from the vector store
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,

    /// Markdown file describing the product being sold
    #[serde(default = "default_product_path")]
    pub product_path: PathBuf,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            min_relevance: default_min_relevance(),
            max_candidates: default_max_candidates(),
            product_path: default_product_path(),
        }
    }
}

fn default_min_relevance() -> f64 {
    std::env::var("LEADQUAL_MIN_RELEVANCE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(crate::DEFAULT_MIN_RELEVANCE)
}

fn default_max_candidates() -> usize {
    std::env::var("LEADQUAL_MAX_CANDIDATES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(crate::DEFAULT_MAX_CANDIDATES)
}

fn default_product_path() -> PathBuf {
    std::env::var("LEADQUAL_PRODUCT_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("product-example.md"))
}

/// Vector store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// SQLite database path
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Collection (namespace) holding the lead documents
    #[serde(default = "default_collection")]
    pub collection: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            collection: default_collection(),
        }
    }
}

fn default_db_path() -> PathBuf {
    std::env::var("LEADQUAL_DB")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(crate::DATA_DIR_NAME)
                .join("leads.sqlite")
        })
}

fn default_collection() -> String {
    std::env::var("LEADQUAL_COLLECTION").unwrap_or_else(|_| "leads-demo".to_string())
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Origin allowed by CORS (the web front-end)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,

    /// Upper bound for a single request, including every LLM call it makes
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Time in-flight requests get to finish after a shutdown signal
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
            request_timeout_secs: default_request_timeout(),
            shutdown_grace_secs: default_shutdown_grace(),
        }
    }
}

fn default_host() -> String {
    std::env::var("LEADQUAL_HOST").unwrap_or_else(|_| "0.0.0.0".to_string())
}

fn default_port() -> u16 {
    std::env::var("LEADQUAL_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080)
}

fn default_cors_origin() -> String {
    std::env::var("LEADQUAL_CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:5173".to_string())
}

fn default_request_timeout() -> u64 {
    120
}

fn default_shutdown_grace() -> u64 {
    5
}

/// Multi-agent router settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterSettings {
    /// Maximum specialist hand-offs in a single turn
    #[serde(default = "default_max_handoffs")]
    pub max_handoffs: usize,

    /// Chat model for the router itself (defaults to the service model)
    #[serde(default)]
    pub model: Option<String>,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            max_handoffs: default_max_handoffs(),
            model: std::env::var("LEADQUAL_ROUTER_MODEL").ok(),
        }
    }
}

fn default_max_handoffs() -> usize {
    6
}

impl Config {
    /// Load config from default path
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load config from an explicit path, falling back to defaults when absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        std::env::var("LEADQUAL_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(crate::CONFIG_DIR_NAME)
                    .join("config.yml")
            })
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.max_candidates == 0 {
            return Err(LeadQualError::Config(
                "pipeline.max_candidates must be at least 1".to_string(),
            ));
        }
        if !self.pipeline.min_relevance.is_finite() {
            return Err(LeadQualError::Config(
                "pipeline.min_relevance must be a finite number".to_string(),
            ));
        }
        if self.router.max_handoffs == 0 {
            return Err(LeadQualError::Config(
                "router.max_handoffs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("nope.yml")).unwrap();
        assert_eq!(config.pipeline.max_candidates, 3);
        assert_eq!(config.server.shutdown_grace_secs, 5);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(
            &path,
            "llm_service:\n  url: http://gpu-box:8000\npipeline:\n  min_relevance: 0.75\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.llm_service.url, "http://gpu-box:8000");
        assert_eq!(config.llm_service.embeddings_url(), "http://gpu-box:8000");
        assert_eq!(config.pipeline.min_relevance, 0.75);
        assert_eq!(config.pipeline.max_candidates, 3);
    }

    #[test]
    fn test_zero_candidates_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(&path, "pipeline:\n  max_candidates: 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, LeadQualError::Config(_)));
    }
}
