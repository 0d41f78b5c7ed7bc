use std::sync::{Arc, Weak};
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use uuid::Uuid;

use super::document_parser::ResumeDocumentParser;
use super::errors::CoreError;
use super::export;
use super::field_extractor::{self, ExtractionPatterns};
use super::models::{CandidateRecord, DocumentFormat, ResultSet, UploadedDocument};
use super::ocr::{OcrEngine, TesseractCliOcrService};
use super::pdf::PdfTextExtractor;
use super::result_store::SessionResultStore;
use super::settings::RuntimeSettings;
use super::skills::SkillVocabulary;

const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

pub struct CoreService {
    parser: ResumeDocumentParser,
    patterns: ExtractionPatterns,
    vocabulary: SkillVocabulary,
    results: SessionResultStore,
}

impl CoreService {
    /// Loads the vocabulary and patterns, resolves the OCR capability once and
    /// starts the session eviction task.
    pub async fn new(settings: &RuntimeSettings) -> anyhow::Result<Arc<Self>> {
        let vocabulary = match &settings.skills_file {
            Some(path) => SkillVocabulary::load(path).await?,
            None => SkillVocabulary::default(),
        };
        tracing::info!(skills = vocabulary.len(), "skill vocabulary loaded");

        let patterns = ExtractionPatterns::from_settings(settings)
            .context("failed to compile extraction patterns")?;
        let ocr = TesseractCliOcrService::detect(settings).await;

        let service = Arc::new(Self::from_parts(
            settings,
            patterns,
            vocabulary,
            ocr,
        ));

        let weak = Arc::downgrade(&service);
        tokio::spawn(async move {
            evict_expired_sessions(weak).await;
        });

        Ok(service)
    }

    pub fn from_parts(
        settings: &RuntimeSettings,
        patterns: ExtractionPatterns,
        vocabulary: SkillVocabulary,
        ocr: Option<Arc<dyn OcrEngine>>,
    ) -> Self {
        Self {
            parser: ResumeDocumentParser::new(PdfTextExtractor::new(ocr)),
            patterns,
            vocabulary,
            results: SessionResultStore::new(settings.result_ttl_minutes),
        }
    }

    pub fn ocr_available(&self) -> bool {
        self.parser.ocr_available()
    }

    /// Reads and extracts one document outside of any batch.
    pub async fn parse_single(
        &self,
        file_name: String,
        file_bytes: Vec<u8>,
    ) -> Result<CandidateRecord, CoreError> {
        self.process_document(UploadedDocument::new(file_name, file_bytes))
            .await
    }

    /// Runs a batch start to finish. Every file name is checked before any
    /// document is read, so an unsupported file rejects the whole batch.
    pub async fn process_batch(
        &self,
        documents: Vec<UploadedDocument>,
    ) -> Result<ResultSet, CoreError> {
        if documents.is_empty() {
            return Err(CoreError::EmptyBatch);
        }

        if let Some(unsupported) = documents
            .iter()
            .find(|d| DocumentFormat::from_file_name(&d.file_name).is_none())
        {
            tracing::warn!(file = %unsupported.file_name, "batch rejected: unsupported format");
            return Err(CoreError::UnsupportedFormat(unsupported.file_name.clone()));
        }

        let batch_id = Uuid::new_v4().to_string();
        tracing::info!(batch_id = %batch_id, documents = documents.len(), "processing batch");

        let mut records = Vec::with_capacity(documents.len());
        for document in documents {
            records.push(self.process_document(document).await?);
        }

        // Every accepted document yields a record, so this only guards the
        // non-empty invariant of `ResultSet`.
        if records.is_empty() {
            return Err(CoreError::NoResults);
        }

        let summary = export::build_summary(&records);
        Ok(ResultSet {
            batch_id,
            created_at: Utc::now(),
            records,
            summary,
        })
    }

    /// Processes a batch and keeps the results as the session's latest.
    pub async fn process_batch_for_session(
        &self,
        session_id: &str,
        documents: Vec<UploadedDocument>,
    ) -> Result<ResultSet, CoreError> {
        let results = self.process_batch(documents).await?;
        self.results.save(session_id, results.clone()).await;
        Ok(results)
    }

    pub async fn session_results(&self, session_id: &str) -> Result<ResultSet, CoreError> {
        self.results
            .load(session_id)
            .await
            .ok_or_else(|| CoreError::ResultsNotFound(session_id.to_string()))
    }

    pub async fn export_csv(&self, session_id: &str) -> Result<(String, String), CoreError> {
        let results = self.session_results(session_id).await?;
        let csv = export::records_to_csv(&results.records)?;
        Ok((results.batch_id, csv))
    }

    pub async fn export_summary(&self, session_id: &str) -> Result<(String, String), CoreError> {
        let results = self.session_results(session_id).await?;
        Ok((results.batch_id, results.summary))
    }

    async fn process_document(
        &self,
        document: UploadedDocument,
    ) -> Result<CandidateRecord, CoreError> {
        let extracted = self.parser.read_document(&document).await?;
        let fields =
            field_extractor::extract_candidate(&extracted.text, &self.patterns, &self.vocabulary);

        tracing::info!(
            file = %document.file_name,
            ocr_used = extracted.ocr_used,
            skills = fields.skills.len(),
            "document processed"
        );

        Ok(CandidateRecord::from_fields(document.file_name, fields, extracted))
    }
}

async fn evict_expired_sessions(service: Weak<CoreService>) {
    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
    loop {
        interval.tick().await;
        let Some(core) = service.upgrade() else {
            break;
        };

        let removed = core.results.cleanup_expired().await;
        if removed > 0 {
            tracing::debug!(removed, "evicted expired session results");
        }
    }
}
