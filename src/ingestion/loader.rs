//! Directory loader
//!
//! Walks a source directory and lazily parses each supported file.
//! Unrecognized extensions are skipped outright; a file that fails to read
//! or parse yields a per-file error item so the rest of the run continues.
//! Re-running over an unchanged directory yields the same documents in the
//! same (path-sorted) order.

use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::types::{Document, FileType};

use super::parser::{FileParser, ParsedDocument};

/// A document read from disk together with its extracted text
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    /// Registry record for the document
    pub document: Document,
    /// Extracted text and pages
    pub parsed: ParsedDocument,
}

/// Loads supported documents from a directory tree
pub struct DirectoryLoader {
    root: PathBuf,
}

impl DirectoryLoader {
    /// Create a loader over `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Lazily parse every supported file under the root, in path order.
    ///
    /// Fails up front when the root is missing; individual files yield
    /// `Err` items that callers report and skip.
    pub fn documents(&self) -> Result<impl Iterator<Item = Result<LoadedDocument>> + '_> {
        if !self.root.is_dir() {
            return Err(Error::Config(format!(
                "source directory {} does not exist",
                self.root.display()
            )));
        }

        let mut paths = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.into_path();
            if FileType::from_path(&path).is_supported() {
                paths.push(path);
            } else {
                tracing::debug!("Skipping unsupported file {}", path.display());
            }
        }
        paths.sort();

        Ok(paths.into_iter().map(move |path| self.load_file(&path)))
    }

    fn load_file(&self, path: &Path) -> Result<LoadedDocument> {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let filename = relative.to_string_lossy().replace('\\', "/");

        let data = fs::read(path).map_err(|e| Error::file_parse(&filename, e.to_string()))?;
        let parsed = FileParser::parse(&filename, &data)?;

        let mut document = Document::new(
            filename,
            parsed.file_type.clone(),
            parsed.content_hash.clone(),
            data.len() as u64,
        );
        document.total_pages = parsed.total_pages;

        tracing::debug!(
            "Loaded {} ({} chars)",
            document.filename,
            parsed.content.len()
        );
        Ok(LoadedDocument { document, parsed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &[u8]) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn loads_supported_files_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.txt", b"Second file content here.");
        write(dir.path(), "a.md", b"# First file\n\nSome markdown text.");
        write(dir.path(), "nested/c.csv", b"col\nvalue\n");
        write(dir.path(), "image.png", b"\x89PNG not a document");

        let loader = DirectoryLoader::new(dir.path());
        let names: Vec<String> = loader
            .documents()
            .unwrap()
            .map(|r| r.unwrap().document.filename)
            .collect();

        assert_eq!(names, vec!["a.md", "b.txt", "nested/c.csv"]);
    }

    #[test]
    fn rerunning_yields_the_same_documents() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "one.txt", b"Stable content.");
        write(dir.path(), "two.txt", b"More stable content.");

        let loader = DirectoryLoader::new(dir.path());
        let first: Vec<(String, String)> = loader
            .documents()
            .unwrap()
            .map(|r| {
                let loaded = r.unwrap();
                (loaded.document.filename, loaded.document.content_hash)
            })
            .collect();
        let second: Vec<(String, String)> = loader
            .documents()
            .unwrap()
            .map(|r| {
                let loaded = r.unwrap();
                (loaded.document.filename, loaded.document.content_hash)
            })
            .collect();

        assert_eq!(first, second);
    }

    #[test]
    fn corrupt_file_fails_alone() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "good.txt", b"Readable text file content.");
        write(dir.path(), "broken.pdf", b"this is not a pdf");

        let loader = DirectoryLoader::new(dir.path());
        let results: Vec<Result<LoadedDocument>> = loader.documents().unwrap().collect();

        assert_eq!(results.len(), 2);
        assert!(results[0].is_err()); // broken.pdf sorts first
        assert!(results[1].is_ok());
    }

    #[test]
    fn missing_root_fails_up_front() {
        let loader = DirectoryLoader::new("/definitely/not/a/real/dir");
        assert!(loader.documents().is_err());
    }
}
