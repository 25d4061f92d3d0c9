//! Error types for the saldo-core library.
//!
//! Only the collaborator seams (file I/O, PDF reading, OCR, name lookup) are
//! fallible. Field resolvers and the ledger parser always produce a value.

use thiserror::Error;

/// Main error type for the saldo library.
#[derive(Error, Debug)]
pub enum SaldoError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to extract images from PDF.
    #[error("failed to extract images: {0}")]
    ImageExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// The document has no raster content to recognize.
    #[error("no images found in document")]
    NoImages,

    /// Underlying PDF could not be opened for image extraction.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),
}

/// Errors raised by name-resolution backends.
///
/// Resolvers log and swallow these, so they never reach [`SaldoError`];
/// they exist so that concrete backends can use `?` internally.
#[derive(Error, Debug)]
pub enum LookupError {
    /// Transport failure or timeout.
    #[error("request failed: {0}")]
    Transport(String),

    /// Remote service answered with a non-success status.
    #[error("unexpected status {0}")]
    Status(u16),

    /// Response body could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),
}

/// Result type for the saldo library.
pub type Result<T> = std::result::Result<T, SaldoError>;
