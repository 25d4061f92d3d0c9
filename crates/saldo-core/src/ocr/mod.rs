//! OCR fallback for scanned statements.

#[cfg(feature = "native")]
mod pure_engine;

#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;

use crate::error::OcrError;

/// Result type for OCR operations.
pub type Result<T> = std::result::Result<T, OcrError>;

/// Black-box text producer for image-only documents.
pub trait OcrProvider {
    /// Recognize the text of a whole document given its raw bytes.
    fn recognize(&self, data: &[u8], language: &str) -> Result<String>;
}

impl<T: OcrProvider + ?Sized> OcrProvider for Box<T> {
    fn recognize(&self, data: &[u8], language: &str) -> Result<String> {
        (**self).recognize(data, language)
    }
}
