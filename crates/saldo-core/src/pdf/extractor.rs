//! PDF text and image extraction using lopdf and pdf-extract.

use std::panic::{self, AssertUnwindSafe};

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, trace, warn};

use super::{Result, TextExtractor};
use crate::error::PdfError;

/// Parent links followed when looking up inherited page resources.
const MAX_TREE_DEPTH: usize = 32;

/// Native PDF reader.
#[derive(Debug, Clone, Default)]
pub struct PdfExtractor {
    /// Pages to keep (0 = all).
    max_pages: usize,
}

impl PdfExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Parse the document, decrypting it first if it only carries an empty
    /// user password. Returns the document and the plain bytes.
    fn load(&self, data: &[u8]) -> Result<(Document, Vec<u8>)> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let bytes = if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        if doc.get_pages().is_empty() {
            return Err(PdfError::NoPages);
        }

        Ok((doc, bytes))
    }

    /// Number of pages in the document.
    pub fn page_count(&self, data: &[u8]) -> Result<u32> {
        let (doc, _) = self.load(data)?;
        Ok(doc.get_pages().len() as u32)
    }

    /// Decode the raster images placed on `page` (1-indexed).
    ///
    /// Supports JPEG streams and raw 8-bit RGB or grayscale samples. Other
    /// encodings (JPEG 2000, CCITT, JBIG2) are skipped.
    pub fn extract_images(&self, data: &[u8], page: u32) -> Result<Vec<DynamicImage>> {
        let (doc, _) = self.load(data)?;
        page_images(&doc, page)
    }

    /// Images of every page, in page order, honouring `max_pages`.
    pub fn extract_all_images(&self, data: &[u8]) -> Result<Vec<DynamicImage>> {
        let (doc, _) = self.load(data)?;
        let mut images = Vec::new();

        for (index, page) in doc.get_pages().keys().enumerate() {
            if self.max_pages > 0 && index >= self.max_pages {
                break;
            }
            images.extend(page_images(&doc, *page)?);
        }

        debug!("Extracted {} images from document", images.len());
        Ok(images)
    }
}

impl TextExtractor for PdfExtractor {
    fn extract_pages(&self, data: &[u8]) -> Result<Vec<String>> {
        let (_, bytes) = self.load(data)?;

        // pdf-extract panics on some malformed content streams.
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(&bytes)
        }));

        let mut pages = match result {
            Ok(Ok(pages)) => pages,
            Ok(Err(e)) => return Err(PdfError::TextExtraction(e.to_string())),
            Err(_) => {
                warn!("pdf-extract panicked on malformed document");
                return Err(PdfError::TextExtraction(
                    "text extraction panicked (malformed document)".to_string(),
                ));
            }
        };

        if self.max_pages > 0 && pages.len() > self.max_pages {
            pages.truncate(self.max_pages);
        }

        debug!(
            "Extracted {} pages, {} chars of native text",
            pages.len(),
            pages.iter().map(|p| p.trim().chars().count()).sum::<usize>()
        );
        Ok(pages)
    }
}

fn page_images(doc: &Document, page: u32) -> Result<Vec<DynamicImage>> {
    let pages = doc.get_pages();
    let page_id = pages.get(&page).ok_or(PdfError::InvalidPage(page))?;

    let Some(resources) = page_resources(doc, *page_id) else {
        return Ok(Vec::new());
    };
    let Ok(xobjects) = resources.get(b"XObject") else {
        return Ok(Vec::new());
    };
    let xobjects = match doc.dereference(xobjects) {
        Ok((_, Object::Dictionary(dict))) => dict,
        Ok(_) => {
            return Err(PdfError::ImageExtraction(format!(
                "page {}: XObject entry is not a dictionary",
                page
            )));
        }
        Err(e) => return Err(PdfError::ImageExtraction(format!("page {}: {}", page, e))),
    };

    let images: Vec<DynamicImage> = xobjects
        .iter()
        .filter_map(|(_, reference)| match doc.dereference(reference) {
            Ok((_, Object::Stream(stream))) => decode_image(doc, stream),
            _ => None,
        })
        .collect();

    trace!("Page {}: {} images", page, images.len());
    Ok(images)
}

/// Page resources, walking up the page tree for inherited ones.
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok()?;

    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(resources) = node.get(b"Resources") {
            if let Ok((_, Object::Dictionary(dict))) = doc.dereference(resources) {
                return Some(dict);
            }
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }

    None
}

fn decode_image(doc: &Document, stream: &Stream) -> Option<DynamicImage> {
    let dict = &stream.dict;
    if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
        return None;
    }

    let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
    let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;

    let filter = dict.get(b"Filter").ok().and_then(|f| match f {
        Object::Name(name) => Some(name.as_slice()),
        Object::Array(filters) => filters.last().and_then(|o| o.as_name().ok()),
        _ => None,
    });

    match filter {
        Some(b"DCTDecode") => {
            return image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg).ok();
        }
        Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
            trace!("Skipping {}x{} image with unsupported filter", width, height);
            return None;
        }
        _ => {}
    }

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);
    if bits != 8 {
        trace!("Skipping image with {} bits per component", bits);
        return None;
    }

    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| match doc.dereference(o) {
            Ok((_, Object::Name(name))) => Some(name.as_slice()),
            Ok((_, Object::Array(arr))) => arr.first().and_then(|o| o.as_name().ok()),
            _ => None,
        })
        .unwrap_or(b"DeviceRGB");

    let samples = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    let pixels = (width as usize) * (height as usize);

    match color_space {
        b"DeviceRGB" | b"RGB" if samples.len() >= pixels * 3 => {
            RgbImage::from_raw(width, height, samples[..pixels * 3].to_vec()).map(DynamicImage::ImageRgb8)
        }
        b"DeviceGray" | b"G" if samples.len() >= pixels => {
            GrayImage::from_raw(width, height, samples[..pixels].to_vec()).map(DynamicImage::ImageLuma8)
        }
        _ => {
            trace!(
                "Could not decode {}x{} image ({} bytes, color space {})",
                width,
                height,
                samples.len(),
                String::from_utf8_lossy(color_space)
            );
            None
        }
    }
}
