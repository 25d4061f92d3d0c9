//! Document sources and native PDF text extraction.

mod extractor;

pub use extractor::PdfExtractor;

use std::path::{Path, PathBuf};

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// A readable byte source with a name.
pub trait DocumentSource {
    /// Display name, used as the filename column of every output row.
    fn name(&self) -> &str;

    /// Read the whole document.
    fn read_bytes(&self) -> std::io::Result<Vec<u8>>;
}

/// Document stored on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    name: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }
}

/// Document already held in memory, e.g. an upload.
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    bytes: Vec<u8>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

impl DocumentSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

/// Turns document bytes into one text string per page.
///
/// Image-only pages come back empty or nearly so.
pub trait TextExtractor {
    fn extract_pages(&self, data: &[u8]) -> Result<Vec<String>>;
}

impl<T: TextExtractor + ?Sized> TextExtractor for Box<T> {
    fn extract_pages(&self, data: &[u8]) -> Result<Vec<String>> {
        (**self).extract_pages(data)
    }
}
