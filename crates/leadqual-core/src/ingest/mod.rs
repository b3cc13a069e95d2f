//! Lead ingestion: markdown files → chunks → vector store

mod chunker;

pub use chunker::{MarkdownSplitter, DEFAULT_CHUNK_SIZE, DEFAULT_SEPARATOR};

use crate::error::{LeadQualError, Result};
use crate::store::{Document, VectorStore, SOURCE_KEY};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Summary of an ingest run
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestStats {
    pub files: usize,
    pub chunks: usize,
    pub added: usize,
}

/// Collect the markdown files under `path` (or `path` itself when it is a file)
pub fn markdown_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(LeadQualError::InvalidInput(format!(
            "no such file or directory: {}",
            path.display()
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        let is_markdown = entry
            .path()
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("md"))
            .unwrap_or(false);
        if entry.file_type().is_file() && is_markdown {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Read one markdown file and split it into source-tagged documents
pub fn load_markdown_documents(path: &Path, splitter: &MarkdownSplitter) -> Result<Vec<Document>> {
    let content = std::fs::read_to_string(path)?;
    let source = path.display().to_string();
    Ok(splitter
        .split(&content)
        .into_iter()
        .map(|chunk| Document::new(chunk).with_metadata(SOURCE_KEY, source.clone()))
        .collect())
}

/// Ingest every markdown file under `path` into the store
pub async fn ingest_path(
    store: &dyn VectorStore,
    path: &Path,
    splitter: &MarkdownSplitter,
) -> Result<IngestStats> {
    ingest_path_with_progress(store, path, splitter, |_, _, _| {}).await
}

/// [`ingest_path`], calling `on_file(file, index, total)` before each file
pub async fn ingest_path_with_progress<F>(
    store: &dyn VectorStore,
    path: &Path,
    splitter: &MarkdownSplitter,
    mut on_file: F,
) -> Result<IngestStats>
where
    F: FnMut(&Path, usize, usize) + Send,
{
    let files = markdown_files(path)?;
    if files.is_empty() {
        return Err(LeadQualError::InvalidInput(format!(
            "no markdown files found in {}",
            path.display()
        )));
    }

    let mut stats = IngestStats::default();
    for (index, file) in files.iter().enumerate() {
        on_file(file, index, files.len());
        let docs = load_markdown_documents(file, splitter)?;
        tracing::debug!("{}: {} chunks", file.display(), docs.len());
        stats.files += 1;
        stats.chunks += docs.len();
        if !docs.is_empty() {
            stats.added += store.add_documents(docs).await?;
        }
    }

    tracing::info!(
        "Ingested {} files ({} chunks, {} new)",
        stats.files,
        stats.chunks,
        stats.added
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ScoredDocument;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingStore {
        docs: Mutex<Vec<Document>>,
    }

    #[async_trait]
    impl VectorStore for RecordingStore {
        async fn similarity_search(&self, _query: &str, _limit: usize) -> Result<Vec<ScoredDocument>> {
            Ok(Vec::new())
        }

        async fn add_documents(&self, docs: Vec<Document>) -> Result<usize> {
            let n = docs.len();
            self.docs.lock().unwrap().extend(docs);
            Ok(n)
        }

        async fn remove_collection(&self) -> Result<usize> {
            Ok(0)
        }

        async fn count(&self) -> Result<usize> {
            Ok(self.docs.lock().unwrap().len())
        }
    }

    #[tokio::test]
    async fn test_ingest_directory_tags_sources() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.md"), "Jane Doe, Acme\n---\nBob Smith, Globex").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::create_dir(dir.path().join("more")).unwrap();
        std::fs::write(dir.path().join("more").join("b.md"), "Ann Lee, Initech").unwrap();

        let store = RecordingStore::default();
        let stats = ingest_path(&store, dir.path(), &MarkdownSplitter::default())
            .await
            .unwrap();

        assert_eq!(stats.files, 2);
        assert_eq!(stats.chunks, 3);
        assert_eq!(stats.added, 3);

        let docs = store.docs.lock().unwrap();
        assert!(docs.iter().all(|d| d.source().is_some()));
        assert!(docs[0].source().unwrap().ends_with("a.md"));
    }

    #[tokio::test]
    async fn test_ingest_missing_path() {
        let store = RecordingStore::default();
        let err = ingest_path(&store, Path::new("/definitely/not/here.md"), &MarkdownSplitter::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LeadQualError::InvalidInput(_)));
    }
}
