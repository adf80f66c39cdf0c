//! Document ingestion pipeline with multi-format parsing

mod chunker;
mod loader;
mod parser;
mod pipeline;

pub use chunker::TextChunker;
pub use loader::{DirectoryLoader, LoadedDocument};
pub use parser::{FileParser, PageContent, ParsedDocument};
pub use pipeline::{IngestOutcome, IngestPipeline};
