//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Result, SaldoError};

/// Main configuration for the saldo pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SaldoConfig {
    /// PDF reading configuration.
    pub pdf: PdfConfig,

    /// OCR fallback configuration.
    pub ocr: OcrConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Company-name lookup configuration.
    pub lookup: LookupConfig,
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Native text shorter than this (in characters, whitespace trimmed)
    /// marks the document as a scanned image and triggers OCR.
    pub min_text_length: usize,

    /// Maximum pages to read (0 = unlimited).
    pub max_pages: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            min_text_length: 50,
            max_pages: 0,
        }
    }
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Run OCR when native extraction is too short.
    pub enabled: bool,

    /// Language hint handed to the OCR provider.
    pub language: String,

    /// Directory containing `det.onnx`, `latin_rec.onnx` and `latin_dict.txt`.
    pub model_dir: PathBuf,

    /// Keep `[UNK]` tokens in recognized text instead of blanking them.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            language: "por".to_string(),
            model_dir: PathBuf::from("models"),
            keep_unk: false,
        }
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Report the negotiation number together with every registration
    /// number found, instead of the first identifier rule that matches.
    pub composite_identifier: bool,

    /// Captured modality text must be longer than this to be kept.
    pub modality_min_length: usize,

    /// Route fiscal-situation reports to the ledger block parser.
    pub itemized_detection: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            composite_identifier: false,
            modality_min_length: 10,
            itemized_detection: true,
        }
    }
}

/// Remote CNPJ name lookup configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Query the remote registry for company names.
    pub enabled: bool,

    /// URL prefix; the digits-only CNPJ is appended.
    pub endpoint: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "https://brasilapi.com.br/api/cnpj/v1/".to_string(),
            timeout_secs: 3,
        }
    }
}

impl SaldoConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| SaldoError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| SaldoError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
