//! SQLite-backed vector store

use super::vectors::{bytes_to_embedding, cosine_similarity, embedding_to_bytes};
use super::{hash_content, Document, ScoredDocument, VectorStore};
use crate::error::{LeadQualError, Result};
use crate::llm::Embedder;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS lead_documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    collection TEXT NOT NULL,
    hash TEXT NOT NULL,
    content TEXT NOT NULL,
    metadata TEXT NOT NULL DEFAULT '{}',
    embedding BLOB NOT NULL,
    model TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE(collection, hash)
);

CREATE INDEX IF NOT EXISTS idx_lead_documents_collection ON lead_documents(collection);
"#;

// nomic-embed-text expects task prefixes on both sides of the comparison
fn format_query_for_embedding(query: &str) -> String {
    format!("search_query: {}", query)
}

fn format_document_for_embedding(content: &str) -> String {
    format!("search_document: {}", content)
}

/// Vector store keeping one collection of lead chunks in SQLite
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
    collection: String,
    embedder: Arc<dyn Embedder>,
}

impl SqliteVectorStore {
    /// Open (or create) the database at `path`
    pub fn open(
        path: &Path,
        collection: impl Into<String>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000;")?;
        Self::with_connection(conn, collection, embedder)
    }

    /// In-memory store, mostly for tests
    pub fn open_in_memory(
        collection: impl Into<String>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, collection, embedder)
    }

    fn with_connection(
        conn: Connection,
        collection: impl Into<String>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        conn.execute_batch(CREATE_TABLES)?;
        Ok(Self {
            conn: Mutex::new(conn),
            collection: collection.into(),
            embedder,
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| LeadQualError::Store("connection lock poisoned".to_string()))
    }

    /// Distinct `source` tags present in the collection
    pub fn sources(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT json_extract(metadata, '$.source') FROM lead_documents
             WHERE collection = ?1 AND json_extract(metadata, '$.source') IS NOT NULL
             ORDER BY 1",
        )?;
        let sources = stmt
            .query_map(params![self.collection], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(sources)
    }

    fn load_embeddings(&self) -> Result<Vec<(String, String, Vec<f32>)>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT content, metadata, embedding FROM lead_documents
             WHERE collection = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![self.collection], |row| {
                let content: String = row.get(0)?;
                let metadata: String = row.get(1)?;
                let bytes: Vec<u8> = row.get(2)?;
                Ok((content, metadata, bytes_to_embedding(&bytes)))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn similarity_search(&self, query: &str, limit: usize) -> Result<Vec<ScoredDocument>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self
            .embedder
            .embed(&format_query_for_embedding(query))
            .await?;

        let stored = self.load_embeddings()?;
        tracing::debug!(
            "Ranking {} documents in '{}' against query",
            stored.len(),
            self.collection
        );

        let mut scored: Vec<ScoredDocument> = stored
            .into_iter()
            .map(|(content, metadata, embedding)| {
                let metadata: BTreeMap<String, String> =
                    serde_json::from_str(&metadata).unwrap_or_default();
                ScoredDocument {
                    score: cosine_similarity(&query_embedding, &embedding) as f64,
                    content,
                    metadata,
                }
            })
            .collect();

        // Stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);
        Ok(scored)
    }

    async fn add_documents(&self, docs: Vec<Document>) -> Result<usize> {
        let docs: Vec<Document> = docs
            .into_iter()
            .filter(|d| !d.content.trim().is_empty())
            .collect();
        if docs.is_empty() {
            return Ok(0);
        }

        let inputs: Vec<String> = docs
            .iter()
            .map(|d| format_document_for_embedding(&d.content))
            .collect();
        let embeddings = self.embedder.embed_batch(&inputs).await?;
        if embeddings.len() != docs.len() {
            return Err(LeadQualError::Store(format!(
                "embedder returned {} vectors for {} documents",
                embeddings.len(),
                docs.len()
            )));
        }

        let model = self.embedder.model_name().to_string();
        let now = Utc::now().to_rfc3339();
        let mut conn = self.lock()?;

        let existing_len: Option<i64> = conn
            .query_row(
                "SELECT LENGTH(embedding) FROM lead_documents WHERE collection = ?1 LIMIT 1",
                params![self.collection],
                |row| row.get(0),
            )
            .optional()?;
        if let (Some(existing), Some(first)) = (existing_len, embeddings.first()) {
            if existing as usize != first.len() * 4 {
                return Err(LeadQualError::Store(format!(
                    "embedding dimensions changed ({} -> {}); delete the collection and re-ingest",
                    existing / 4,
                    first.len()
                )));
            }
        }

        let tx = conn.transaction()?;
        let mut added = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO lead_documents
                 (collection, hash, content, metadata, embedding, model, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for (doc, embedding) in docs.iter().zip(&embeddings) {
                let metadata = serde_json::to_string(&doc.metadata)?;
                added += stmt.execute(params![
                    self.collection,
                    hash_content(&doc.content),
                    doc.content,
                    metadata,
                    embedding_to_bytes(embedding),
                    model,
                    now,
                ])?;
            }
        }
        tx.commit()?;

        tracing::info!(
            "Stored {} new documents in '{}' ({} duplicates skipped)",
            added,
            self.collection,
            docs.len() - added
        );
        Ok(added)
    }

    async fn remove_collection(&self) -> Result<usize> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM lead_documents WHERE collection = ?1",
            params![self.collection],
        )?;
        Ok(removed)
    }

    async fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM lead_documents WHERE collection = ?1",
            params![self.collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SOURCE_KEY;

    /// Bag-of-words embedder over a tiny fixed vocabulary
    struct KeywordEmbedder;

    const VOCAB: [&str; 6] = ["acme", "procurement", "buyer", "globex", "engineering", "cto"];

    fn keyword_vector(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        VOCAB
            .iter()
            .map(|w| if lower.contains(w) { 1.0 } else { 0.0 })
            .collect()
    }

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(keyword_vector(text))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| keyword_vector(t)).collect())
        }

        fn dimensions(&self) -> usize {
            VOCAB.len()
        }

        fn model_name(&self) -> &str {
            "keyword-test"
        }
    }

    fn store() -> SqliteVectorStore {
        SqliteVectorStore::open_in_memory("leads-test", Arc::new(KeywordEmbedder)).unwrap()
    }

    #[tokio::test]
    async fn test_search_ranks_best_match_first() {
        let store = store();
        let added = store
            .add_documents(vec![
                Document::new("Bob Smith, Globex, CTO, engineering"),
                Document::new("Jane Doe, Acme Corp, Head of Procurement, buyer")
                    .with_metadata(SOURCE_KEY, "leads.md"),
            ])
            .await
            .unwrap();
        assert_eq!(added, 2);

        let results = store
            .similarity_search("Acme procurement buyer", 3)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].content.starts_with("Jane Doe"));
        assert!(results[0].score > 0.99);
        assert_eq!(results[0].source(), Some("leads.md"));
        assert!(results[1].score < 0.01);
    }

    #[tokio::test]
    async fn test_search_respects_limit() {
        let store = store();
        store
            .add_documents(vec![
                Document::new("acme one"),
                Document::new("acme two"),
                Document::new("acme three"),
            ])
            .await
            .unwrap();
        assert_eq!(store.similarity_search("acme", 2).await.unwrap().len(), 2);
        assert!(store.similarity_search("acme", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicates_and_empty_chunks_skipped() {
        let store = store();
        let added = store
            .add_documents(vec![
                Document::new("Jane Doe, Acme"),
                Document::new("Jane Doe, Acme"),
                Document::new("   "),
            ])
            .await
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_remove_collection() {
        let store = store();
        store
            .add_documents(vec![Document::new("acme"), Document::new("globex")])
            .await
            .unwrap();
        assert_eq!(store.remove_collection().await.unwrap(), 2);
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.similarity_search("acme", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sources_listed() {
        let store = store();
        store
            .add_documents(vec![
                Document::new("acme").with_metadata(SOURCE_KEY, "b.md"),
                Document::new("globex").with_metadata(SOURCE_KEY, "a.md"),
            ])
            .await
            .unwrap();
        assert_eq!(store.sources().unwrap(), vec!["a.md", "b.md"]);
    }

    #[tokio::test]
    async fn test_persists_to_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("leads.sqlite");
        {
            let store =
                SqliteVectorStore::open(&path, "leads-test", Arc::new(KeywordEmbedder)).unwrap();
            store
                .add_documents(vec![Document::new("acme buyer")])
                .await
                .unwrap();
        }
        let reopened =
            SqliteVectorStore::open(&path, "leads-test", Arc::new(KeywordEmbedder)).unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
    }
}
