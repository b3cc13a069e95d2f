//! Leadqual Core Library
//!
//! LLM-driven sales lead qualification.
//!
//! # Features
//! - Filter extraction from free-text lead descriptions
//! - Vector retrieval over ingested lead records (SQLite + cosine similarity)
//! - Concurrent lead scoring and outreach email drafting
//! - Multi-agent router delegating to enrich / score / draft specialists
//! - OpenAI-compatible completion and embedding client with streaming

pub mod agents;
pub mod config;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod pipeline;
pub mod services;
pub mod store;

pub use agents::{
    HandoffEvent, LlmPlanner, Planner, Router, RouterDecision, RouterEvent, RouterReply,
    RouterSession, SpecialistKind,
};
pub use config::{Config, LLMServiceConfig};
pub use error::{Error, LeadQualError, Result};
pub use ingest::{ingest_path, ingest_path_with_progress, IngestStats, MarkdownSplitter};
pub use llm::{ChatMessage, CompletionOptions, Embedder, LLMClient, MetricsSnapshot, VLLMClient};
pub use pipeline::{
    LeadFilter, Orchestrator, PipelineConfig, PipelineOutcome, QualificationResult, SelectedLead,
};
pub use services::Services;
pub use store::{Document, ScoredDocument, SqliteVectorStore, VectorStore};

/// Minimum relevance score for a retrieved lead to be selected
pub const DEFAULT_MIN_RELEVANCE: f64 = 0.6;

/// Number of candidates requested from the vector store
pub const DEFAULT_MAX_CANDIDATES: usize = 3;

/// Default data directory name
pub const DATA_DIR_NAME: &str = "leadqual";

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "leadqual";
