//! Index persistence
//!
//! The full index (dimension, document registry, entries) is serialized to
//! a single JSON file so query serving does not depend on re-running
//! ingestion. A missing file is reported distinctly from an undecodable
//! one: callers recover from the former by ingesting, never from the
//! latter.

use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::error::{Error, Result};

use super::vector::VectorIndex;

/// Serialize the full index to `path`, creating parent directories.
pub fn save(index: &VectorIndex, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = fs::File::create(path)?;
    serde_json::to_writer(BufWriter::new(file), index)?;

    tracing::info!(
        "Saved index with {} chunks from {} documents to {}",
        index.len(),
        index.documents().len(),
        path.display()
    );
    Ok(())
}

/// Reconstruct an index from `path`.
///
/// Returns [`Error::IndexNotFound`] when nothing exists at `path` and
/// [`Error::CorruptIndex`] when the file exists but cannot be decoded.
pub fn load(path: &Path) -> Result<VectorIndex> {
    if !path.exists() {
        return Err(Error::IndexNotFound(path.to_path_buf()));
    }

    let file = fs::File::open(path)?;
    let index: VectorIndex = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| Error::CorruptIndex(format!("{}: {}", path.display(), e)))?;

    tracing::info!(
        "Loaded index with {} chunks from {}",
        index.len(),
        path.display()
    );
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::document::{Chunk, ChunkSource, Document, FileType};

    fn sample_index() -> VectorIndex {
        let mut index = VectorIndex::new(3);
        let doc = Document::new(
            "notes.txt".to_string(),
            FileType::Txt,
            "abc123".to_string(),
            42,
        );
        let doc_id = doc.id;
        index.add_document(doc);

        for (i, content) in ["alpha", "beta", "gamma"].iter().enumerate() {
            let chunk = Chunk::new(
                doc_id,
                content.to_string(),
                ChunkSource::new("notes.txt".to_string(), FileType::Txt),
                i * 10,
                i * 10 + content.len(),
                i as u32,
            );
            index
                .add(chunk, vec![i as f32, 1.0, 0.5])
                .unwrap();
        }
        index
    }

    #[test]
    fn round_trip_preserves_entry_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        let index = sample_index();
        save(&index, &path).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded.dimension(), index.dimension());
        assert_eq!(loaded.documents(), index.documents());

        // Entry-set equality, order-independent
        let mut original: Vec<_> = index.entries().to_vec();
        let mut restored: Vec<_> = loaded.entries().to_vec();
        original.sort_by_key(|e| e.chunk.id);
        restored.sort_by_key(|e| e.chunk.id);
        assert_eq!(original, restored);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, Error::IndexNotFound(_)));
    }

    #[test]
    fn undecodable_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, Error::CorruptIndex(_)));
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deep").join("index.json");

        save(&sample_index(), &path).unwrap();
        assert!(path.exists());
    }
}
