//! Vector storage for lead documents
//!
//! The pipeline only sees the [`VectorStore`] trait. [`SqliteVectorStore`]
//! keeps embeddings as BLOBs and ranks by cosine similarity in Rust.

mod sqlite;
pub mod vectors;

pub use sqlite::SqliteVectorStore;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Metadata key holding the file a chunk was ingested from
pub const SOURCE_KEY: &str = "source";

/// A text chunk to be stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }
}

/// A stored document ranked against a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub score: f64,
    pub content: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl ScoredDocument {
    pub fn new(score: f64, content: impl Into<String>) -> Self {
        Self {
            score,
            content: content.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }
}

/// Similarity search over a single collection
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Up to `limit` documents, best match first
    async fn similarity_search(&self, query: &str, limit: usize) -> Result<Vec<ScoredDocument>>;

    /// Store documents, returning how many were newly added
    async fn add_documents(&self, docs: Vec<Document>) -> Result<usize>;

    /// Delete every document in the collection, returning how many were removed
    async fn remove_collection(&self) -> Result<usize>;

    /// Number of documents in the collection
    async fn count(&self) -> Result<usize>;
}

/// Hash content using SHA-256
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_content() {
        let hash = hash_content("Jane Doe, Acme Corp");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_content("Jane Doe, Acme Corp"));
    }

    #[test]
    fn test_document_source() {
        let doc = Document::new("lead").with_metadata(SOURCE_KEY, "leads.md");
        assert_eq!(doc.source(), Some("leads.md"));
        assert_eq!(Document::new("x").source(), None);
    }
}
