//! Plain-text extraction from PDF and DOCX bytes.

use std::io::{Cursor, Read};
use std::path::Path;

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use quick_xml::Reader;

use super::SourceError;

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            PDF_MIME => Some(DocumentKind::Pdf),
            DOCX_MIME => Some(DocumentKind::Docx),
            _ => None,
        }
    }

    /// Resolves the kind from a `.pdf` / `.docx` extension, case-insensitively.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let extension = Path::new(name)
            .extension()
            .and_then(|v| v.to_str())
            .map(|v| v.to_ascii_lowercase())?;

        match extension.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "docx" => Some(DocumentKind::Docx),
            _ => None,
        }
    }
}

/// Extracts text off the async executor; PDF decoding is CPU-bound.
pub async fn extract_text(kind: DocumentKind, data: Vec<u8>) -> Result<String, SourceError> {
    tokio::task::spawn_blocking(move || extract_text_sync(kind, &data))
        .await
        .map_err(|e| SourceError::Extract(format!("extraction task failed: {e}")))?
}

pub fn extract_text_sync(kind: DocumentKind, data: &[u8]) -> Result<String, SourceError> {
    match kind {
        DocumentKind::Pdf => pdf_extract::extract_text_from_mem(data)
            .map_err(|e| SourceError::Extract(format!("PDF: {e}"))),
        DocumentKind::Docx => {
            extract_docx_text(data).map_err(|e| SourceError::Extract(format!("DOCX: {e}")))
        }
    }
}

/// Joins the text of every non-empty `w:p` paragraph in `word/document.xml`.
///
/// Only `w:t` runs count; deleted revisions (`w:delText`) and field codes
/// (`w:instrText`) are skipped.
fn extract_docx_text(data: &[u8]) -> anyhow::Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))?;

    let mut document_file = archive.by_name("word/document.xml")?;
    let mut xml = String::new();
    document_file.read_to_string(&mut xml)?;

    let mut reader = Reader::from_str(&xml);

    let mut current = String::new();
    let mut paragraphs = Vec::new();
    let mut in_paragraph = false;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"w:p" => {
                in_paragraph = true;
                current.clear();
            }
            Event::End(e) if e.name().as_ref() == b"w:p" => {
                if !current.trim().is_empty() {
                    paragraphs.push(current.trim().to_string());
                }
                current.clear();
                in_paragraph = false;
            }
            Event::Start(e) if in_paragraph && e.name().as_ref() == b"w:t" => in_text = true,
            Event::End(e) if e.name().as_ref() == b"w:t" => in_text = false,
            // <w:tab/> separates runs inside one paragraph
            Event::Empty(e) if in_paragraph && e.name().as_ref() == b"w:tab" => {
                current.push('\t');
            }
            Event::Text(e) if in_text => {
                current.push_str(&e.xml_content()?);
            }
            Event::GeneralRef(e) if in_text => {
                if let Some(ch) = e.resolve_char_ref()? {
                    current.push(ch);
                } else if let Some(text) = resolve_predefined_entity(&e.decode()?) {
                    current.push_str(text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}
