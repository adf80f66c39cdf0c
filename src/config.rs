//! Configuration for the RAG service
//!
//! One immutable [`RagConfig`] is built at startup (TOML file merged over
//! defaults) and handed to each component; nothing reads environment state
//! after construction except the API key fallback in [`RagConfig::load`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable consulted for the provider API key when the config
/// file does not set one.
pub const API_KEY_ENV: &str = "DOCRAG_API_KEY";

/// Default system prompt; retrieved context is appended to it at query time.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions \
using the provided document excerpts. Base your answer only on the supplied context; when the \
context does not contain the answer, say so instead of guessing. Cite the source filename for \
facts taken from the context.";

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Model provider configuration
    pub provider: ProviderConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Ingestion configuration
    pub ingestion: IngestionConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file.
    ///
    /// Missing sections fall back to defaults. If the file does not set an
    /// API key, the `DOCRAG_API_KEY` environment variable is consulted.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let mut config: RagConfig = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("invalid config {}: {}", path.display(), e)))?;

        if config.provider.api_key.is_none() {
            config.provider.api_key = std::env::var(API_KEY_ENV).ok();
        }

        config.validate()?;
        Ok(config)
    }

    /// Load from the given path if present, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let mut config = Self::default();
            config.provider.api_key = std::env::var(API_KEY_ENV).ok();
            config.validate()?;
            Ok(config)
        }
    }

    /// Validate cross-field constraints. A malformed configuration aborts
    /// startup rather than failing later mid-request.
    pub fn validate(&self) -> Result<()> {
        if self.provider.embedding_dimensions == 0 {
            return Err(Error::Config(
                "provider.embedding_dimensions must be greater than zero".to_string(),
            ));
        }
        if self.provider.batch_size == 0 {
            return Err(Error::Config(
                "provider.batch_size must be greater than zero".to_string(),
            ));
        }
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config(
                "chunking.chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::Config(
                "retrieval.top_k must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_body_size: 1024 * 1024, // 1MB, JSON requests only
        }
    }
}

/// Model provider configuration (OpenAI-compatible endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the OpenAI-compatible API, without a trailing slash
    pub base_url: String,
    /// API key; falls back to the `DOCRAG_API_KEY` environment variable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Chat completion model or deployment name
    pub chat_model: String,
    /// Embedding model or deployment name
    pub embedding_model: String,
    /// Embedding dimensionality; all index entries must match
    pub embedding_dimensions: usize,
    /// Sampling temperature for completions
    pub temperature: f32,
    /// Maximum tokens per completion
    pub max_tokens: u32,
    /// Maximum texts per embedding request
    pub batch_size: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for transient failures
    pub max_retries: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            api_key: None,
            chat_model: "llama3.2:3b".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            embedding_dimensions: 768,
            temperature: 0.3,
            max_tokens: 1024,
            batch_size: 32,
            timeout_secs: 120,
            max_retries: 2,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
    /// Minimum chunk size (smaller chunks are dropped)
    pub min_chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1024,
            chunk_overlap: 200,
            min_chunk_size: 50,
        }
    }
}

/// Retrieval and prompting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks to retrieve per query
    pub top_k: usize,
    /// System prompt prepended to every completion
    pub system_prompt: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Directory of source documents
    pub source_dir: PathBuf,
    /// Path of the persisted index file
    pub index_path: PathBuf,
    /// URL prefix under which source files are served, used for citation
    /// links (the server mounts `source_dir` there)
    pub file_server_url_prefix: String,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        let index_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("docrag")
            .join("index.json");

        Self {
            source_dir: PathBuf::from("data"),
            index_path,
            file_server_url_prefix: "/api/files/data".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        RagConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: RagConfig = toml::from_str(
            r#"
            [provider]
            base_url = "https://example.openai.azure.com/v1"
            chat_model = "gpt-4o-mini"
            embedding_model = "text-embedding-3-small"
            embedding_dimensions = 1536

            [retrieval]
            top_k = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.provider.embedding_dimensions, 1536);
        assert_eq!(config.retrieval.top_k, 5);
        // Untouched sections keep their defaults
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.chunking.chunk_size, 1024);
        config.validate().unwrap();
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        let mut config = RagConfig::default();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_top_k_rejected() {
        let mut config = RagConfig::default();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());
    }
}
