//! docrag: document Q&A with directory ingestion and citation-aware answers
//!
//! Ingests a directory of documents (PDF, Word, HTML, CSV, Markdown, plain
//! text) into an embedding-based vector index, persists the index to disk,
//! and serves an HTTP endpoint that answers questions over the corpus with
//! source citations, optionally streaming the answer.

pub mod config;
pub mod error;
pub mod generation;
pub mod index;
pub mod ingestion;
pub mod providers;
pub mod query;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use types::{
    document::{Chunk, ChunkSource, Document, FileType},
    query::{ChatMessage, QueryRequest},
    response::{Citation, IngestReport, QueryResponse},
};
