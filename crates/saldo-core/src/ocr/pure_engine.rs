//! Pure Rust OCR engine wrapper using `pure-onnx-ocr`.

use std::path::Path;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::OcrConfig;
use crate::pdf::PdfExtractor;

use super::{OcrProvider, Result};

/// Rows of recognized text closer than this (in pixels) read as one line.
const ROW_HEIGHT: f64 = 20.0;

/// OCR engine backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).
pub struct PureOcrEngine {
    engine: pure_onnx_ocr::engine::OcrEngine,
    pdf: PdfExtractor,
    keep_unk: bool,
}

/// One recognized span positioned by its top-left corner.
struct Span {
    x: f64,
    y: f64,
    text: String,
}

impl PureOcrEngine {
    /// Create an engine from `det.onnx`, `latin_rec.onnx` and
    /// `latin_dict.txt` in `model_dir`.
    pub fn from_dir(model_dir: &Path, config: &OcrConfig) -> Result<Self> {
        let det_path = model_dir.join("det.onnx");
        let rec_path = model_dir.join("latin_rec.onnx");
        let dict_path = model_dir.join("latin_dict.txt");

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", model_dir.display());

        Ok(Self {
            engine,
            pdf: PdfExtractor::new(),
            keep_unk: config.keep_unk,
        })
    }

    /// Only OCR the first `max_pages` pages (0 = all).
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.pdf = PdfExtractor::new().with_max_pages(max_pages);
        self
    }

    /// Recognize one image; lines come back in reading order.
    pub fn recognize_image(&self, image: &DynamicImage) -> Result<String> {
        let start = Instant::now();
        let (width, height) = image.dimensions();

        let results = self
            .engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        let mut spans: Vec<Span> = results
            .iter()
            .map(|r| {
                let (x, y) = r
                    .bounding_box
                    .exterior()
                    .coords()
                    .fold((f64::INFINITY, f64::INFINITY), |(x, y), c| (x.min(c.x), y.min(c.y)));
                let text = if self.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                };
                Span { x, y, text }
            })
            .collect();

        spans.sort_by(|a, b| {
            let row_a = (a.y / ROW_HEIGHT) as i64;
            let row_b = (b.y / ROW_HEIGHT) as i64;
            row_a
                .cmp(&row_b)
                .then_with(|| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
        });

        debug!(
            "OCR on {}x{} image: {} regions in {}ms",
            width,
            height,
            spans.len(),
            start.elapsed().as_millis()
        );

        Ok(spans
            .into_iter()
            .map(|s| s.text)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

impl OcrProvider for PureOcrEngine {
    fn recognize(&self, data: &[u8], language: &str) -> Result<String> {
        let images = self.pdf.extract_all_images(data)?;
        if images.is_empty() {
            return Err(OcrError::NoImages);
        }

        debug!("Running OCR over {} page images (language hint '{}')", images.len(), language);

        let mut pages = Vec::with_capacity(images.len());
        for image in &images {
            pages.push(self.recognize_image(image)?);
        }

        Ok(pages.join("\n"))
    }
}
