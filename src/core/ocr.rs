use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;

use super::settings::{OcrMode, RuntimeSettings};

/// Optical character recognition over the pages of a PDF.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn extract_text(&self, pdf_bytes: &[u8]) -> anyhow::Result<String>;
}

/// Renders pages with `pdftoppm` and recognizes each page image with `tesseract`.
#[derive(Clone)]
pub struct TesseractCliOcrService {
    pub tesseract_executable_path: String,
    pub pdftoppm_executable_path: String,
    pub dpi: u32,
    pub timeout: Duration,
}

impl TesseractCliOcrService {
    pub fn new(
        tesseract_executable_path: String,
        pdftoppm_executable_path: String,
        dpi: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            tesseract_executable_path,
            pdftoppm_executable_path,
            dpi,
            timeout,
        }
    }

    pub fn from_settings(settings: &RuntimeSettings) -> Self {
        Self::new(
            settings.tesseract_path.clone(),
            settings.pdftoppm_path.clone(),
            settings.ocr_dpi,
            Duration::from_secs(settings.ocr_timeout_seconds),
        )
    }

    /// Resolves the OCR capability once. `None` when disabled or when either
    /// executable cannot be run.
    pub async fn detect(settings: &RuntimeSettings) -> Option<Arc<dyn OcrEngine>> {
        if settings.ocr_mode == OcrMode::Off {
            tracing::info!("OCR disabled by configuration");
            return None;
        }

        let service = Self::from_settings(settings);
        let tesseract = probe(&service.tesseract_executable_path, "--version").await;
        let pdftoppm = probe(&service.pdftoppm_executable_path, "-v").await;

        if tesseract && pdftoppm {
            tracing::info!(
                tesseract = %service.tesseract_executable_path,
                pdftoppm = %service.pdftoppm_executable_path,
                "OCR available"
            );
            let engine: Arc<dyn OcrEngine> = Arc::new(service);
            Some(engine)
        } else {
            tracing::warn!(
                tesseract_found = tesseract,
                pdftoppm_found = pdftoppm,
                "OCR unavailable, image-only PDFs will yield empty text"
            );
            None
        }
    }

    async fn render_pages(
        &self,
        input_path: &Path,
        output_dir: &Path,
    ) -> anyhow::Result<Vec<PathBuf>> {
        let prefix = output_dir.join("page");
        let mut command = Command::new(&self.pdftoppm_executable_path);
        command
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-png")
            .arg(input_path)
            .arg(&prefix)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = timeout(self.timeout, command.output())
            .await
            .context("pdftoppm timed out")?
            .context("failed to run pdftoppm")?;

        if !output.status.success() {
            anyhow::bail!(
                "pdftoppm exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let mut pages = Vec::new();
        let mut dir = tokio::fs::read_dir(output_dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|v| v.to_str()) == Some("png") {
                pages.push(path);
            }
        }

        // pdftoppm zero-pads page numbers to a common width
        pages.sort();
        Ok(pages)
    }

    async fn recognize_image(&self, image_path: &Path) -> anyhow::Result<String> {
        let mut command = Command::new(&self.tesseract_executable_path);
        command
            .arg(image_path)
            .arg("stdout")
            .arg("-l")
            .arg("eng")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = timeout(self.timeout, command.output())
            .await
            .context("tesseract timed out")?
            .context("failed to run tesseract")?;

        if !output.status.success() {
            anyhow::bail!("tesseract exited with {}", output.status);
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[async_trait]
impl OcrEngine for TesseractCliOcrService {
    async fn extract_text(&self, pdf_bytes: &[u8]) -> anyhow::Result<String> {
        let temp_dir = tempfile::Builder::new()
            .prefix("resume-ocr-")
            .tempdir()
            .context("failed to create OCR temp dir")?;

        let input_path = temp_dir.path().join("resume.pdf");
        tokio::fs::write(&input_path, pdf_bytes).await?;

        let pages_dir = temp_dir.path().join("pages");
        tokio::fs::create_dir(&pages_dir).await?;

        let pages = self.render_pages(&input_path, &pages_dir).await?;
        let mut text = String::new();
        for page in &pages {
            match self.recognize_image(page).await {
                Ok(page_text) => text.push_str(&page_text),
                Err(err) => tracing::warn!(page = %page.display(), "OCR failed for page: {err:#}"),
            }
        }

        Ok(text)
    }
}

async fn probe(executable: &str, version_flag: &str) -> bool {
    let mut command = Command::new(executable);
    command
        .arg(version_flag)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    matches!(
        timeout(Duration::from_secs(10), command.status()).await,
        Ok(Ok(status)) if status.success()
    )
}
