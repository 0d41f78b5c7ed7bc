use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored in place of a name, email or phone that could not be recovered.
pub const NOT_FOUND: &str = "Not found";

/// Rendered in place of an empty skill list.
pub const NO_SKILLS: &str = "None";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Txt,
}

impl DocumentFormat {
    /// Resolves the format from the file extension. `None` means unsupported.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|v| v.to_str())
            .map(|v| v.to_ascii_lowercase())?;

        match extension.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Plain text produced by a format reader. Empty text means extraction failed.
#[derive(Debug, Clone, Default)]
pub struct ExtractedText {
    pub text: String,
    pub ocr_used: bool,
    pub errors: Vec<String>,
}

impl ExtractedText {
    pub fn failed(error: String) -> Self {
        Self {
            text: String::new(),
            ocr_used: false,
            errors: vec![error],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Fields inferred from one document's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFields {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRecord {
    pub source_file: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub skills: Vec<String>,
    pub ocr_used: bool,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl CandidateRecord {
    pub fn from_fields(
        source_file: String,
        fields: CandidateFields,
        extracted: ExtractedText,
    ) -> Self {
        Self {
            source_file,
            name: fields.name,
            email: fields.email,
            phone: fields.phone,
            skills: fields.skills,
            ocr_used: extracted.ocr_used,
            errors: extracted.errors,
        }
    }

    /// Skills joined for display, `None` when nothing matched.
    pub fn skills_display(&self) -> String {
        if self.skills.is_empty() {
            NO_SKILLS.to_string()
        } else {
            self.skills.join(", ")
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
    pub batch_id: String,
    pub created_at: DateTime<Utc>,
    pub records: Vec<CandidateRecord>,
    pub summary: String,
}

/// One row of the upload response, shaped like the CSV export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UploadRow {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub skills: String,
}

impl From<&CandidateRecord> for UploadRow {
    fn from(record: &CandidateRecord) -> Self {
        Self {
            name: record.name.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
            skills: record.skills_display(),
        }
    }
}

/// Body of `POST /upload`. Keys stay snake_case for existing browser clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub session_id: String,
    pub batch_id: String,
    pub results: Vec<UploadRow>,
    pub summary: String,
    pub csv_url: String,
    pub summary_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
    pub ocr_available: bool,
}
