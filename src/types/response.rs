//! Response types for queries and ingestion

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::{Chunk, Document, FileType};

/// Citation from a source document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    /// Chunk ID
    pub chunk_id: Uuid,
    /// Document ID
    pub document_id: Uuid,
    /// Source filename
    pub filename: String,
    /// File type
    pub file_type: FileType,
    /// Page number (if applicable)
    pub page_number: Option<u32>,
    /// Exact snippet from the source
    pub snippet: String,
    /// Snippet with highlighted query terms (`<mark>` tags)
    pub snippet_highlighted: String,
    /// Similarity score (1.0 is an exact match)
    pub similarity_score: f32,
    /// Link to the source file on the file server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl Citation {
    /// Create a citation from a chunk and similarity score
    pub fn from_chunk(chunk: &Chunk, similarity_score: f32) -> Self {
        Self {
            chunk_id: chunk.id,
            document_id: chunk.document_id,
            filename: chunk.source.filename.clone(),
            file_type: chunk.source.file_type.clone(),
            page_number: chunk.source.page_number,
            snippet: chunk.content.clone(),
            snippet_highlighted: chunk.content.clone(),
            similarity_score,
            source_url: None,
        }
    }

    /// Attach a link under the configured file-server prefix
    pub fn with_source_url(mut self, prefix: &str) -> Self {
        self.source_url = Some(format!(
            "{}/{}",
            prefix.trim_end_matches('/'),
            self.filename
        ));
        self
    }

    /// Format citation for display in text
    pub fn format_inline(&self) -> String {
        match self.page_number {
            Some(page) => format!("[Source: {}, Page {}]", self.filename, page),
            None => format!("[Source: {}]", self.filename),
        }
    }

    /// Highlight query terms in the snippet
    pub fn highlight_terms(&mut self, terms: &[&str]) {
        let mut highlighted = self.snippet.clone();
        for term in terms {
            if term.len() < 3 {
                continue; // skip very short terms
            }
            let re = regex::RegexBuilder::new(&regex::escape(term))
                .case_insensitive(true)
                .build();
            if let Ok(re) = re {
                highlighted = re
                    .replace_all(&highlighted, |caps: &regex::Captures| {
                        format!("<mark>{}</mark>", &caps[0])
                    })
                    .to_string();
            }
        }
        self.snippet_highlighted = highlighted;
    }
}

/// Response from a query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Generated answer
    pub answer: String,
    /// Citations with source snippets; empty when the index had nothing
    /// relevant to retrieve
    pub citations: Vec<Citation>,
    /// Number of chunks retrieved
    pub chunks_retrieved: usize,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
    /// Raw chunks (if `include_chunks` was set)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_chunks: Option<Vec<Chunk>>,
}

impl QueryResponse {
    /// Create a new query response
    pub fn new(answer: String, citations: Vec<Citation>, processing_time_ms: u64) -> Self {
        Self {
            answer,
            chunks_retrieved: citations.len(),
            citations,
            processing_time_ms,
            raw_chunks: None,
        }
    }
}

/// Summary of an ingested document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Document ID
    pub id: Uuid,
    /// Filename
    pub filename: String,
    /// File type
    pub file_type: FileType,
    /// Number of pages (if applicable)
    pub total_pages: Option<u32>,
    /// Number of chunks created
    pub total_chunks: u32,
    /// File size in bytes
    pub file_size: u64,
    /// Ingestion timestamp
    pub ingested_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id,
            filename: doc.filename.clone(),
            file_type: doc.file_type.clone(),
            total_pages: doc.total_pages,
            total_chunks: doc.total_chunks,
            file_size: doc.file_size,
            ingested_at: doc.ingested_at,
        }
    }
}

/// Error for a single file during ingestion; the rest of the run continues
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestError {
    /// Filename that failed
    pub filename: String,
    /// Error message
    pub error: String,
}

/// Report from an ingestion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    /// Successfully ingested documents
    pub documents: Vec<DocumentSummary>,
    /// Total chunks indexed
    pub total_chunks: u32,
    /// Per-file failures (partial success)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<IngestError>,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Response for listing the ingested corpus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentListResponse {
    /// List of documents
    pub documents: Vec<DocumentSummary>,
    /// Total count
    pub total_count: usize,
}
