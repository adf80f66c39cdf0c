//! Application state for the query server

use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::index::{persistence, VectorIndex};
use crate::providers::{ChatProvider, EmbeddingProvider, OpenAiClient};
use crate::query::QueryEngine;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Current index snapshot. Readers clone the `Arc` and never block each
    /// other; re-ingestion publishes a whole new index here rather than
    /// mutating the one in-flight queries are reading.
    index: RwLock<Arc<VectorIndex>>,
    /// Query engine
    engine: QueryEngine,
    /// Embedding provider, shared with re-ingestion runs
    embedder: Arc<dyn EmbeddingProvider>,
}

impl AppState {
    /// Create application state, loading the persisted index if present.
    ///
    /// A missing index file is recoverable (the server starts empty and
    /// ingestion fills it); a corrupt one aborts startup.
    pub fn new(config: RagConfig) -> Result<Self> {
        let client = Arc::new(OpenAiClient::new(&config.provider)?);
        let embedder: Arc<dyn EmbeddingProvider> = client.clone();
        let chat: Arc<dyn ChatProvider> = client;

        let index = match persistence::load(&config.ingestion.index_path) {
            Ok(index) => {
                if index.dimension() != config.provider.embedding_dimensions {
                    return Err(Error::DimensionMismatch {
                        expected: config.provider.embedding_dimensions,
                        actual: index.dimension(),
                    });
                }
                index
            }
            Err(Error::IndexNotFound(path)) => {
                tracing::warn!(
                    "No index at {}; starting with an empty index. Run ingestion to build one.",
                    path.display()
                );
                VectorIndex::new(config.provider.embedding_dimensions)
            }
            Err(e) => return Err(e),
        };

        let engine = QueryEngine::new(Arc::clone(&embedder), chat, &config);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                index: RwLock::new(Arc::new(index)),
                engine,
                embedder,
            }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the query engine
    pub fn engine(&self) -> &QueryEngine {
        &self.inner.engine
    }

    /// Get the embedding provider
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.inner.embedder
    }

    /// Snapshot of the current index
    pub fn index(&self) -> Arc<VectorIndex> {
        Arc::clone(&self.inner.index.read())
    }

    /// Atomically publish a freshly built index
    pub fn publish_index(&self, index: VectorIndex) {
        let chunks = index.len();
        *self.inner.index.write() = Arc::new(index);
        tracing::info!("Published new index with {} chunks", chunks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::document::{Chunk, ChunkSource, FileType};
    use uuid::Uuid;

    fn test_state() -> AppState {
        let mut config = RagConfig::default();
        // Point at a path that does not exist so startup uses an empty index
        let dir = tempfile::tempdir().unwrap();
        config.ingestion.index_path = dir.path().join("absent.json");
        config.provider.embedding_dimensions = 4;
        AppState::new(config).unwrap()
    }

    #[test]
    fn missing_index_starts_empty() {
        let state = test_state();
        assert!(state.index().is_empty());
    }

    #[test]
    fn corrupt_index_aborts_startup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(&path, "definitely not json").unwrap();

        let mut config = RagConfig::default();
        config.ingestion.index_path = path;

        assert!(matches!(
            AppState::new(config).unwrap_err(),
            Error::CorruptIndex(_)
        ));
    }

    #[test]
    fn published_index_replaces_snapshot_for_new_readers() {
        let state = test_state();
        let before = state.index();

        let mut next = VectorIndex::new(4);
        next.add(
            Chunk::new(
                Uuid::new_v4(),
                "fresh content".to_string(),
                ChunkSource::new("f.txt".to_string(), FileType::Txt),
                0,
                13,
                0,
            ),
            vec![1.0, 0.0, 0.0, 0.0],
        )
        .unwrap();
        state.publish_index(next);

        // The old snapshot is untouched; new readers see the new index
        assert!(before.is_empty());
        assert_eq!(state.index().len(), 1);
    }
}
