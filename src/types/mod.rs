//! Core data types

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, ChunkSource, Document, FileType};
pub use query::{ChatMessage, QueryRequest, Role};
pub use response::{Citation, DocumentSummary, IngestError, IngestReport, QueryResponse};
