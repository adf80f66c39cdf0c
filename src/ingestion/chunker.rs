//! Text chunking with page and position tracking

use unicode_segmentation::UnicodeSegmentation;
use uuid::Uuid;

use crate::config::ChunkingConfig;
use crate::types::{Chunk, ChunkSource, Document};

use super::parser::ParsedDocument;

/// Text chunker with configurable size and overlap
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between chunks
    overlap: usize,
    /// Minimum chunk size
    min_size: usize,
}

impl TextChunker {
    /// Create a chunker from configuration
    pub fn new(config: &ChunkingConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            overlap: config.chunk_overlap,
            min_size: config.min_chunk_size,
        }
    }

    /// Chunk a parsed document, preserving page provenance
    pub fn chunk_document(&self, doc: &Document, parsed: &ParsedDocument) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        if parsed.pages.len() > 1 {
            for page in &parsed.pages {
                let source = ChunkSource::page(
                    doc.filename.clone(),
                    doc.file_type.clone(),
                    page.page_number,
                    parsed.total_pages,
                );
                self.chunk_text(&page.content, doc.id, source, page.char_offset, &mut chunks);
            }
        } else {
            let source = match parsed.total_pages {
                Some(count) => ChunkSource::page(
                    doc.filename.clone(),
                    doc.file_type.clone(),
                    1,
                    Some(count),
                ),
                None => ChunkSource::new(doc.filename.clone(), doc.file_type.clone()),
            };
            self.chunk_text(&parsed.content, doc.id, source, 0, &mut chunks);
        }

        chunks
    }

    /// Split one stretch of text into chunks at sentence boundaries
    fn chunk_text(
        &self,
        text: &str,
        document_id: Uuid,
        source: ChunkSource,
        base_offset: usize,
        chunks: &mut Vec<Chunk>,
    ) {
        let mut current = String::new();
        let mut current_start = 0usize;
        let mut char_pos = 0usize;

        for sentence in text.split_sentence_bounds() {
            if !current.is_empty() && current.len() + sentence.len() > self.chunk_size {
                if current.trim().len() >= self.min_size {
                    chunks.push(Chunk::new(
                        document_id,
                        current.trim().to_string(),
                        source.clone(),
                        base_offset + current_start,
                        base_offset + char_pos,
                        chunks.len() as u32,
                    ));
                }

                // Carry the tail of the finished chunk into the next one
                let overlap_text = self.overlap_tail(&current);
                current_start = char_pos.saturating_sub(overlap_text.len());
                current = overlap_text;
            }

            current.push_str(sentence);
            char_pos += sentence.len();
        }

        if current.trim().len() >= self.min_size {
            chunks.push(Chunk::new(
                document_id,
                current.trim().to_string(),
                source,
                base_offset + current_start,
                base_offset + char_pos,
                chunks.len() as u32,
            ));
        }
    }

    /// Overlap text taken from the end of a chunk, starting at a word
    /// boundary and a valid char boundary
    fn overlap_tail(&self, text: &str) -> String {
        if self.overlap == 0 {
            return String::new();
        }
        if text.len() <= self.overlap {
            return text.to_string();
        }

        let mut start = text.len() - self.overlap;
        while start > 0 && !text.is_char_boundary(start) {
            start -= 1;
        }

        let tail = &text[start..];
        match tail.find(' ') {
            Some(pos) => tail[pos + 1..].to_string(),
            None => tail.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::parser::FileParser;
    use crate::types::FileType;

    fn chunker(chunk_size: usize, overlap: usize, min_size: usize) -> TextChunker {
        TextChunker::new(&ChunkingConfig {
            chunk_size,
            chunk_overlap: overlap,
            min_chunk_size: min_size,
        })
    }

    fn doc() -> Document {
        Document::new(
            "sample.txt".to_string(),
            FileType::Txt,
            "hash".to_string(),
            0,
        )
    }

    fn normalize(s: &str) -> String {
        s.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn chunks_without_overlap_recover_the_text() {
        let text = "The quick brown fox jumps over the lazy dog. \
                    Pack my box with five dozen liquor jugs. \
                    How vexingly quick daft zebras jump. \
                    Sphinx of black quartz, judge my vow. \
                    The five boxing wizards jump quickly.";
        let parsed = FileParser::parse("sample.txt", text.as_bytes()).unwrap();

        let chunks = chunker(80, 0, 1).chunk_document(&doc(), &parsed);
        assert!(chunks.len() > 1);

        let rebuilt = chunks
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(normalize(&rebuilt), normalize(text));
    }

    #[test]
    fn consecutive_chunks_share_overlap() {
        let text = "One sentence here. Another sentence follows. \
                    A third sentence appears. Then a fourth one. And a fifth sentence.";
        let parsed = FileParser::parse("sample.txt", text.as_bytes()).unwrap();

        let chunks = chunker(60, 25, 1).chunk_document(&doc(), &parsed);
        assert!(chunks.len() > 1);

        for pair in chunks.windows(2) {
            let tail: String = pair[0]
                .content
                .chars()
                .rev()
                .take(10)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            assert!(
                pair[1].content.contains(tail.trim()),
                "chunk '{}' does not carry tail of '{}'",
                pair[1].content,
                pair[0].content
            );
        }
    }

    #[test]
    fn chunk_indexes_are_sequential() {
        let text = "First sentence goes here. Second sentence goes here. \
                    Third sentence goes here. Fourth sentence goes here.";
        let parsed = FileParser::parse("sample.txt", text.as_bytes()).unwrap();

        let chunks = chunker(50, 0, 1).chunk_document(&doc(), &parsed);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i as u32);
        }
    }

    #[test]
    fn tiny_fragments_are_dropped() {
        let parsed = FileParser::parse("sample.txt", b"Too small.").unwrap();
        let chunks = chunker(1024, 0, 50).chunk_document(&doc(), &parsed);
        assert!(chunks.is_empty());
    }

    #[test]
    fn offsets_point_into_the_source() {
        let text = "Alpha sentence one. Beta sentence two. Gamma sentence three.";
        let parsed = FileParser::parse("sample.txt", text.as_bytes()).unwrap();

        let chunks = chunker(25, 0, 1).chunk_document(&doc(), &parsed);
        for chunk in &chunks {
            assert!(chunk.char_start < chunk.char_end);
            assert!(chunk.char_end <= text.len());
        }
    }
}
