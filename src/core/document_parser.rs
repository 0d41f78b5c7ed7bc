use std::io::{Cursor, Read};

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use quick_xml::Reader;

use super::errors::CoreError;
use super::models::{DocumentFormat, ExtractedText, UploadedDocument};
use super::pdf::PdfTextExtractor;

pub struct ResumeDocumentParser {
    pdf_text_extractor: PdfTextExtractor,
}

impl ResumeDocumentParser {
    pub fn new(pdf_text_extractor: PdfTextExtractor) -> Self {
        Self { pdf_text_extractor }
    }

    pub fn ocr_available(&self) -> bool {
        self.pdf_text_extractor.ocr_available()
    }

    /// Converts one document to plain text. Read failures are logged and
    /// produce empty text; only an unsupported format is an error.
    pub async fn read_document(
        &self,
        document: &UploadedDocument,
    ) -> Result<ExtractedText, CoreError> {
        let format = DocumentFormat::from_file_name(&document.file_name)
            .ok_or_else(|| CoreError::UnsupportedFormat(document.file_name.clone()))?;

        let extracted = match format {
            DocumentFormat::Pdf => match self
                .pdf_text_extractor
                .extract_text_with_ocr_fallback(&document.bytes)
                .await
            {
                Ok((text, ocr_used)) => ExtractedText {
                    text,
                    ocr_used,
                    errors: Vec::new(),
                },
                Err(err) => read_failure(&document.file_name, "PDF", err),
            },
            DocumentFormat::Docx => match extract_docx_text(&document.bytes) {
                Ok(text) => ExtractedText {
                    text,
                    ..ExtractedText::default()
                },
                Err(err) => read_failure(&document.file_name, "DOCX", err),
            },
            DocumentFormat::Txt => ExtractedText {
                text: extract_txt_text(&document.bytes),
                ..ExtractedText::default()
            },
        };

        if extracted.is_empty() {
            tracing::info!(file = %document.file_name, "no text extracted");
        }

        Ok(extracted)
    }
}

fn read_failure(file_name: &str, kind: &str, err: anyhow::Error) -> ExtractedText {
    tracing::error!(file = %file_name, "Error reading {kind} file: {err:#}");
    ExtractedText::failed(format!("Parse error: {err}"))
}

/// Decodes UTF-8, dropping invalid byte sequences and a leading BOM.
fn extract_txt_text(data: &[u8]) -> String {
    let mut text = String::with_capacity(data.len());
    for chunk in data.utf8_chunks() {
        text.push_str(chunk.valid());
    }

    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

fn extract_docx_text(data: &[u8]) -> anyhow::Result<String> {
    let cursor = Cursor::new(data);
    let mut archive = zip::ZipArchive::new(cursor)?;

    let mut document_file = archive.by_name("word/document.xml")?;
    let mut xml = String::new();
    document_file.read_to_string(&mut xml)?;

    let mut reader = Reader::from_str(&xml);
    reader.config_mut().trim_text(false);

    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_paragraph = false;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => {
                    in_paragraph = true;
                    current.clear();
                }
                b"w:t" => in_text = in_paragraph,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:p" if !in_paragraph => paragraphs.push(String::new()),
                b"w:tab" if in_paragraph => current.push('\t'),
                b"w:br" | b"w:cr" if in_paragraph => current.push('\n'),
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"w:p" => {
                    paragraphs.push(std::mem::take(&mut current));
                    in_paragraph = false;
                }
                b"w:t" => in_text = false,
                _ => {}
            },
            Event::Text(e) if in_text => current.push_str(&e.xml_content()?),
            Event::CData(e) if in_text => current.push_str(&String::from_utf8_lossy(&e)),
            Event::GeneralRef(e) if in_text => {
                if let Some(ch) = e.resolve_char_ref()? {
                    current.push(ch);
                } else {
                    let name = e.decode()?;
                    if let Some(value) = resolve_predefined_entity(&name) {
                        current.push_str(value);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}
