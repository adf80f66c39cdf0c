//! Offline ingestion pipeline
//!
//! Runs loader → chunker → embedding provider → vector index, then hands
//! the finished index to persistence. Per-file parse failures are collected
//! into the report; a terminal provider failure aborts the whole run.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::index::{persistence, VectorIndex};
use crate::providers::EmbeddingProvider;
use crate::types::response::{DocumentSummary, IngestError, IngestReport};

use super::chunker::TextChunker;
use super::loader::DirectoryLoader;

/// Result of an ingestion run: the built index plus its report
pub struct IngestOutcome {
    /// Freshly built index, ready to publish
    pub index: VectorIndex,
    /// What was ingested and what failed
    pub report: IngestReport,
}

/// Document ingestion pipeline
pub struct IngestPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    chunker: TextChunker,
}

impl IngestPipeline {
    /// Create a pipeline using the given embedding provider
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, chunking: &ChunkingConfig) -> Self {
        Self {
            chunker: TextChunker::new(chunking),
            embedder,
        }
    }

    /// Ingest every supported file under `source_dir` into a new index.
    pub async fn run(&self, source_dir: &Path) -> Result<IngestOutcome> {
        let start = Instant::now();
        let loader = DirectoryLoader::new(source_dir);

        let mut index = VectorIndex::new(self.embedder.dimensions());
        let mut summaries = Vec::new();
        let mut errors = Vec::new();
        let mut total_chunks = 0u32;

        for item in loader.documents()? {
            let loaded = match item {
                Ok(loaded) => loaded,
                Err(e) => {
                    let filename = match &e {
                        Error::FileParse { filename, .. } => filename.clone(),
                        _ => "<unknown>".to_string(),
                    };
                    tracing::warn!("Skipping {}: {}", filename, e);
                    errors.push(IngestError {
                        filename,
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let mut document = loaded.document;
            let chunks = self.chunker.chunk_document(&document, &loaded.parsed);
            if chunks.is_empty() {
                tracing::warn!("No chunks produced from {}", document.filename);
                continue;
            }

            let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts).await?;
            if vectors.len() != chunks.len() {
                return Err(Error::embedding(format!(
                    "requested {} embeddings for {}, got {}",
                    chunks.len(),
                    document.filename,
                    vectors.len()
                )));
            }

            document.total_chunks = chunks.len() as u32;
            total_chunks += document.total_chunks;

            for (chunk, vector) in chunks.into_iter().zip(vectors) {
                index.add(chunk, vector)?;
            }

            tracing::info!(
                "Indexed {} ({} chunks)",
                document.filename,
                document.total_chunks
            );
            summaries.push(DocumentSummary::from(&document));
            index.add_document(document);
        }

        let report = IngestReport {
            documents: summaries,
            total_chunks,
            errors,
            processing_time_ms: start.elapsed().as_millis() as u64,
        };

        tracing::info!(
            "Ingestion complete: {} documents, {} chunks, {} failures in {}ms",
            report.documents.len(),
            report.total_chunks,
            report.errors.len(),
            report.processing_time_ms
        );
        Ok(IngestOutcome { index, report })
    }

    /// Ingest `source_dir` and persist the resulting index to `index_path`.
    pub async fn run_and_save(&self, source_dir: &Path, index_path: &Path) -> Result<IngestOutcome> {
        let outcome = self.run(source_dir).await?;
        persistence::save(&outcome.index, index_path)?;
        Ok(outcome)
    }
}
