//! Brute-force vector index over document chunks
//!
//! A linear scan is the right tool at this corpus size (a directory of
//! documents); entries live in insertion order, which also serves as the
//! tie-break for equal distances. The index is append-only during
//! ingestion and strictly read-only while serving queries; re-ingestion
//! builds a fresh index that is published wholesale.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::document::{Chunk, Document};
use crate::types::response::DocumentSummary;

/// One indexed chunk with its embedding vector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexEntry {
    /// The chunk this vector represents
    pub chunk: Chunk,
    /// Embedding vector, `dimension` floats
    pub vector: Vec<f32>,
}

/// A search match with its distance to the query
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// The retrieved chunk
    pub chunk: Chunk,
    /// Cosine distance (0.0 = identical direction, smaller is closer)
    pub distance: f32,
    /// Cosine similarity (1.0 - distance)
    pub similarity: f32,
}

/// Vector index mapping chunks to embeddings, with the source document
/// registry carried alongside so the persisted file is self-contained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndex {
    dimension: usize,
    documents: Vec<Document>,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Create an empty index for vectors of the given dimensionality
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            documents: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// Index-wide vector dimensionality
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of indexed chunks
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no chunks
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, in insertion order
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Register an ingested document
    pub fn add_document(&mut self, document: Document) {
        self.documents.push(document);
    }

    /// The ingested corpus
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Corpus summaries for listing endpoints
    pub fn document_summaries(&self) -> Vec<DocumentSummary> {
        self.documents.iter().map(DocumentSummary::from).collect()
    }

    /// Append a chunk with its embedding.
    ///
    /// Fails without modifying the index when the vector's dimensionality
    /// does not match the index-wide dimension.
    pub fn add(&mut self, chunk: Chunk, vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        self.entries.push(IndexEntry { chunk, vector });
        Ok(())
    }

    /// Return the `k` entries closest to `query` by cosine distance,
    /// ordered by increasing distance; ties keep insertion order.
    ///
    /// Returns all entries when the index holds fewer than `k`. The scan
    /// never mutates entries.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if k == 0 {
            return Err(Error::Config("search k must be at least 1".to_string()));
        }
        if query.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .map(|entry| {
                let distance = cosine_distance(query, &entry.vector);
                SearchHit {
                    chunk: entry.chunk.clone(),
                    distance,
                    similarity: 1.0 - distance,
                }
            })
            .collect();

        // Stable sort: entries at equal distance stay in insertion order
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);

        Ok(hits)
    }
}

/// Cosine distance between two equal-length vectors.
///
/// Zero-norm vectors have no direction; they are treated as maximally
/// distant rather than producing NaN.
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
}
