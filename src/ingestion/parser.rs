//! Multi-format file parser

use pulldown_cmark::{Event, Parser, TagEnd};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::types::FileType;

/// Parsed document with extracted text and metadata
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// File type
    pub file_type: FileType,
    /// Extracted text content
    pub content: String,
    /// Content hash
    pub content_hash: String,
    /// Total pages (if applicable)
    pub total_pages: Option<u32>,
    /// Page-level content
    pub pages: Vec<PageContent>,
}

/// Content from a single page
#[derive(Debug, Clone)]
pub struct PageContent {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Text content of the page
    pub content: String,
    /// Character offset in the full document
    pub char_offset: usize,
}

/// Multi-format file parser
pub struct FileParser;

impl FileParser {
    /// Parse a file based on its extension
    pub fn parse(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let extension = filename.rsplit('.').next().unwrap_or("").to_lowercase();
        let file_type = FileType::from_extension(&extension);

        match file_type {
            FileType::Pdf => Self::parse_pdf(filename, data),
            FileType::Docx => Self::parse_docx(filename, data),
            FileType::Txt => Self::parse_text(data, FileType::Txt),
            FileType::Markdown => Self::parse_markdown(data),
            FileType::Html => Self::parse_html(data),
            FileType::Csv => Self::parse_csv(filename, data),
            FileType::Unknown => Err(Error::UnsupportedFileType(extension)),
        }
    }

    /// Parse PDF document
    fn parse_pdf(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let content = pdf_extract::extract_text_from_mem(data)
            .map_err(|e| Error::file_parse(filename, e.to_string()))?;

        // Strip null characters and collapse blank lines left by extraction
        let content = content
            .replace('\0', "")
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if content.trim().is_empty() {
            return Err(Error::file_parse(
                filename,
                "no text content could be extracted from PDF",
            ));
        }

        // Extraction flattens pages; count them separately for provenance
        let total_pages = match lopdf::Document::load_mem(data) {
            Ok(doc) => Some(doc.get_pages().len() as u32),
            Err(_) => Some(1),
        };

        let pages = vec![PageContent {
            page_number: 1,
            content: content.clone(),
            char_offset: 0,
        }];

        Ok(ParsedDocument {
            file_type: FileType::Pdf,
            content_hash: hash_content(&content),
            content,
            total_pages,
            pages,
        })
    }

    /// Parse Word document (.docx)
    fn parse_docx(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let doc = docx_rs::read_docx(data).map_err(|e| Error::file_parse(filename, e.to_string()))?;

        let mut content = String::new();
        for child in doc.document.children {
            if let docx_rs::DocumentChild::Paragraph(p) = child {
                for child in p.children {
                    if let docx_rs::ParagraphChild::Run(run) = child {
                        for child in run.children {
                            if let docx_rs::RunChild::Text(t) = child {
                                content.push_str(&t.text);
                            }
                        }
                    }
                }
                content.push('\n');
            }
        }

        if content.trim().is_empty() {
            return Err(Error::file_parse(filename, "document contains no text"));
        }

        let pages = vec![PageContent {
            page_number: 1,
            content: content.clone(),
            char_offset: 0,
        }];

        Ok(ParsedDocument {
            file_type: FileType::Docx,
            content_hash: hash_content(&content),
            content,
            total_pages: Some(1),
            pages,
        })
    }

    /// Parse plain text
    fn parse_text(data: &[u8], file_type: FileType) -> Result<ParsedDocument> {
        let content = String::from_utf8_lossy(data).to_string();

        let pages = vec![PageContent {
            page_number: 1,
            content: content.clone(),
            char_offset: 0,
        }];

        Ok(ParsedDocument {
            file_type,
            content_hash: hash_content(&content),
            content,
            total_pages: None,
            pages,
        })
    }

    /// Parse Markdown, stripping markup down to readable text
    fn parse_markdown(data: &[u8]) -> Result<ParsedDocument> {
        let raw = String::from_utf8_lossy(data);
        let mut content = String::new();

        for event in Parser::new(&raw) {
            match event {
                Event::Text(t) => content.push_str(&t),
                Event::Code(t) => content.push_str(&t),
                Event::SoftBreak | Event::HardBreak => content.push(' '),
                Event::End(TagEnd::Paragraph)
                | Event::End(TagEnd::Heading(_))
                | Event::End(TagEnd::Item)
                | Event::End(TagEnd::CodeBlock) => content.push('\n'),
                _ => {}
            }
        }

        let pages = vec![PageContent {
            page_number: 1,
            content: content.clone(),
            char_offset: 0,
        }];

        Ok(ParsedDocument {
            file_type: FileType::Markdown,
            content_hash: hash_content(&content),
            content,
            total_pages: None,
            pages,
        })
    }

    /// Parse HTML document
    fn parse_html(data: &[u8]) -> Result<ParsedDocument> {
        let html = String::from_utf8_lossy(data);
        let document = scraper::Html::parse_document(&html);

        let body_selector = scraper::Selector::parse("body").unwrap();
        let mut content = String::new();

        if let Some(body) = document.select(&body_selector).next() {
            for text in body.text() {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    if !content.is_empty() {
                        content.push(' ');
                    }
                    content.push_str(trimmed);
                }
            }
        }

        let pages = vec![PageContent {
            page_number: 1,
            content: content.clone(),
            char_offset: 0,
        }];

        Ok(ParsedDocument {
            file_type: FileType::Html,
            content_hash: hash_content(&content),
            content,
            total_pages: None,
            pages,
        })
    }

    /// Parse CSV file into row-per-line text
    fn parse_csv(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let mut reader = csv::Reader::from_reader(data);
        let mut content = String::new();

        if let Ok(headers) = reader.headers() {
            content.push_str(&headers.iter().collect::<Vec<_>>().join(" | "));
            content.push('\n');
        }

        for result in reader.records() {
            let record = result.map_err(|e| Error::file_parse(filename, e.to_string()))?;
            content.push_str(&record.iter().collect::<Vec<_>>().join(" | "));
            content.push('\n');
        }

        let pages = vec![PageContent {
            page_number: 1,
            content: content.clone(),
            char_offset: 0,
        }];

        Ok(ParsedDocument {
            file_type: FileType::Csv,
            content_hash: hash_content(&content),
            content,
            total_pages: None,
            pages,
        })
    }
}

/// Hash extracted content for document identity
fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_round_trips_content() {
        let parsed = FileParser::parse("notes.txt", b"Hello world.\nSecond line.").unwrap();
        assert_eq!(parsed.file_type, FileType::Txt);
        assert_eq!(parsed.content, "Hello world.\nSecond line.");
        assert_eq!(parsed.pages.len(), 1);
    }

    #[test]
    fn content_hash_is_stable() {
        let a = FileParser::parse("a.txt", b"same content").unwrap();
        let b = FileParser::parse("b.txt", b"same content").unwrap();
        let c = FileParser::parse("c.txt", b"different content").unwrap();
        assert_eq!(a.content_hash, b.content_hash);
        assert_ne!(a.content_hash, c.content_hash);
    }

    #[test]
    fn markdown_strips_markup() {
        let md = b"# Shipping rates\n\nA *large* parcel costs `10` units.\n";
        let parsed = FileParser::parse("rates.md", md).unwrap();
        assert!(parsed.content.contains("Shipping rates"));
        assert!(parsed.content.contains("A large parcel costs 10 units."));
        assert!(!parsed.content.contains('#'));
        assert!(!parsed.content.contains('*'));
    }

    #[test]
    fn html_extracts_body_text() {
        let html = b"<html><head><title>ignored</title></head>\
                     <body><h1>Rates</h1><p>Ten units to France.</p></body></html>";
        let parsed = FileParser::parse("rates.html", html).unwrap();
        assert!(parsed.content.contains("Rates"));
        assert!(parsed.content.contains("Ten units to France."));
        assert!(!parsed.content.contains("ignored"));
        assert!(!parsed.content.contains("<p>"));
    }

    #[test]
    fn csv_keeps_headers_and_rows() {
        let csv = b"destination,size,price\nFrance,large,10\nSpain,small,4\n";
        let parsed = FileParser::parse("rates.csv", csv).unwrap();
        assert!(parsed.content.contains("destination | size | price"));
        assert!(parsed.content.contains("France | large | 10"));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let err = FileParser::parse("image.png", b"\x89PNG").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFileType(_)));
    }

    #[test]
    fn garbage_pdf_is_a_parse_error() {
        let err = FileParser::parse("broken.pdf", b"not a pdf at all").unwrap_err();
        assert!(matches!(err, Error::FileParse { .. }));
    }
}
