use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;

/// One year; longer retention is a configuration mistake.
pub const MAX_RESULT_TTL_MINUTES: i64 = 365 * 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrMode {
    /// Probe for the OCR executables at start-up and use them when present.
    Auto,
    Off,
}

impl FromStr for OcrMode {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" | "on" | "true" | "1" => Ok(OcrMode::Auto),
            "off" | "false" | "0" => Ok(OcrMode::Off),
            other => Err(anyhow::anyhow!("unknown OCR mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub port: u16,
    pub rust_log: String,
    pub ocr_mode: OcrMode,
    pub tesseract_path: String,
    pub pdftoppm_path: String,
    pub ocr_timeout_seconds: u64,
    pub ocr_dpi: u32,
    pub result_ttl_minutes: i64,
    pub max_upload_bytes: usize,
    pub skills_file: Option<PathBuf>,
    pub email_pattern: Option<String>,
    pub phone_pattern: Option<String>,
    pub name_skip_pattern: Option<String>,
    pub name_scan_lines: usize,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            port: 5000,
            rust_log: "info".to_string(),
            ocr_mode: OcrMode::Auto,
            tesseract_path: "tesseract".to_string(),
            pdftoppm_path: "pdftoppm".to_string(),
            ocr_timeout_seconds: 120,
            ocr_dpi: 300,
            result_ttl_minutes: 60,
            max_upload_bytes: 25 * 1024 * 1024,
            skills_file: None,
            email_pattern: None,
            phone_pattern: None,
            name_skip_pattern: None,
            name_scan_lines: 10,
        }
    }
}

impl RuntimeSettings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            port: parse_or(&value, "PORT", defaults.port)?,
            rust_log: value("RUST_LOG").unwrap_or(defaults.rust_log),
            ocr_mode: parse_or(&value, "RESUME_OCR", defaults.ocr_mode)?,
            tesseract_path: value("RESUME_TESSERACT_PATH").unwrap_or(defaults.tesseract_path),
            pdftoppm_path: value("RESUME_PDFTOPPM_PATH").unwrap_or(defaults.pdftoppm_path),
            ocr_timeout_seconds: parse_or(
                &value,
                "RESUME_OCR_TIMEOUT_SECS",
                defaults.ocr_timeout_seconds,
            )?
            .max(1),
            ocr_dpi: parse_or(&value, "RESUME_OCR_DPI", defaults.ocr_dpi)?.max(72),
            result_ttl_minutes: result_ttl_minutes(parse_or(
                &value,
                "RESUME_RESULT_TTL_MINUTES",
                defaults.result_ttl_minutes,
            )?)?,
            max_upload_bytes: parse_or(
                &value,
                "RESUME_MAX_UPLOAD_BYTES",
                defaults.max_upload_bytes,
            )?,
            skills_file: value("RESUME_SKILLS_FILE").map(PathBuf::from),
            email_pattern: value("RESUME_EMAIL_PATTERN"),
            phone_pattern: value("RESUME_PHONE_PATTERN"),
            name_skip_pattern: value("RESUME_NAME_SKIP_PATTERN"),
            name_scan_lines: parse_or(
                &value,
                "RESUME_NAME_SCAN_LINES",
                defaults.name_scan_lines,
            )?
            .max(1),
        })
    }
}

fn result_ttl_minutes(minutes: i64) -> anyhow::Result<i64> {
    if minutes > MAX_RESULT_TTL_MINUTES {
        anyhow::bail!(
            "invalid value '{minutes}' for RESUME_RESULT_TTL_MINUTES: \
             must be at most {MAX_RESULT_TTL_MINUTES}"
        );
    }
    Ok(minutes.max(1))
}

fn parse_or<T, F>(value: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match value(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|err| anyhow::anyhow!("{err}"))
            .with_context(|| format!("invalid value '{raw}' for {key}")),
        None => Ok(default),
    }
}
