//! Document and chunk types with source tracking for citations

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Supported file types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
    /// HTML document
    Html,
    /// CSV file
    Csv,
    /// Unrecognized file type, skipped during ingestion
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "txt" | "text" => Self::Txt,
            "md" | "markdown" => Self::Markdown,
            "html" | "htm" => Self::Html,
            "csv" => Self::Csv,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from a path's extension
    pub fn from_path(path: &std::path::Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }

    /// Check if this is a supported file type
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Get display name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "Word Document (.docx)",
            Self::Txt => "Text File",
            Self::Markdown => "Markdown",
            Self::Html => "HTML",
            Self::Csv => "CSV",
            Self::Unknown => "Unknown",
        }
    }
}

/// A document that has been ingested
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Filename relative to the source directory
    pub filename: String,
    /// File type
    pub file_type: FileType,
    /// Content hash of the extracted text
    pub content_hash: String,
    /// Total number of pages (if applicable)
    pub total_pages: Option<u32>,
    /// Total number of chunks created
    pub total_chunks: u32,
    /// File size in bytes
    pub file_size: u64,
    /// Ingestion timestamp
    pub ingested_at: chrono::DateTime<chrono::Utc>,
}

impl Document {
    /// Create a new document record
    pub fn new(filename: String, file_type: FileType, content_hash: String, file_size: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename,
            file_type,
            content_hash,
            total_pages: None,
            total_chunks: 0,
            file_size,
            ingested_at: chrono::Utc::now(),
        }
    }
}

/// Source information for a chunk (used for citations)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkSource {
    /// Source filename
    pub filename: String,
    /// File type
    pub file_type: FileType,
    /// Page number (1-indexed, for paginated formats)
    pub page_number: Option<u32>,
    /// Total pages in the document
    pub page_count: Option<u32>,
}

impl ChunkSource {
    /// Source info without page provenance
    pub fn new(filename: String, file_type: FileType) -> Self {
        Self {
            filename,
            file_type,
            page_number: None,
            page_count: None,
        }
    }

    /// Source info for a specific page
    pub fn page(filename: String, file_type: FileType, page: u32, page_count: Option<u32>) -> Self {
        Self {
            filename,
            file_type,
            page_number: Some(page),
            page_count,
        }
    }

    /// Format source for display
    pub fn format_citation(&self) -> String {
        match self.page_number {
            Some(page) => format!("{}, Page {}", self.filename, page),
            None => self.filename.clone(),
        }
    }
}

/// A bounded chunk of text extracted from a document.
///
/// Chunks are immutable once created; re-ingestion produces a fresh set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Parent document ID
    pub document_id: Uuid,
    /// Text content
    pub content: String,
    /// Source information for citations
    pub source: ChunkSource,
    /// Character position in the original document
    pub char_start: usize,
    pub char_end: usize,
    /// Chunk index within document
    pub chunk_index: u32,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(
        document_id: Uuid,
        content: String,
        source: ChunkSource,
        char_start: usize,
        char_end: usize,
        chunk_index: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            content,
            source,
            char_start,
            char_end,
            chunk_index,
        }
    }
}
