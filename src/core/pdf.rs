use std::sync::Arc;

use anyhow::Context;

use super::ocr::OcrEngine;

pub struct PdfTextExtractor {
    ocr_service: Option<Arc<dyn OcrEngine>>,
}

impl PdfTextExtractor {
    pub fn new(ocr_service: Option<Arc<dyn OcrEngine>>) -> Self {
        Self { ocr_service }
    }

    pub fn ocr_available(&self) -> bool {
        self.ocr_service.is_some()
    }

    /// Returns the extracted text and whether OCR produced it.
    pub async fn extract_text_with_ocr_fallback(
        &self,
        data: &[u8],
    ) -> anyhow::Result<(String, bool)> {
        let text_layer = extract_text_layer(data.to_vec()).await;

        let text = match text_layer {
            Ok(text) if !text.trim().is_empty() => return Ok((text, false)),
            Ok(text) => text,
            Err(err) if self.ocr_service.is_some() => {
                tracing::warn!("PDF text layer unreadable, falling back to OCR: {err:#}");
                String::new()
            }
            Err(err) => return Err(err),
        };

        match &self.ocr_service {
            Some(ocr) => {
                let recognized = ocr.extract_text(data).await?;
                Ok((recognized, true))
            }
            None => Ok((text, false)),
        }
    }
}

async fn extract_text_layer(data: Vec<u8>) -> anyhow::Result<String> {
    let pages =
        tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem_by_pages(&data))
            .await
            .context("PDF text extraction aborted")??;

    let mut text = String::new();
    for page in pages {
        if !page.is_empty() {
            text.push_str(&page);
            text.push('\n');
        }
    }

    Ok(text)
}
