//! Subcommands and the setup they share.

pub mod batch;
pub mod config;
pub mod output;
pub mod process;

use std::path::{Path, PathBuf};

use clap::Args;
use tracing::{info, warn};

use saldo_core::{DocumentProcessor, NameCache, PureOcrEngine, SaldoConfig};

use crate::lookup::BrasilApiResolver;

/// Pipeline options shared by `process` and `batch`.
#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    /// OCR model directory (det.onnx, latin_rec.onnx, latin_dict.txt)
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Skip OCR and use only PDF text extraction
    #[arg(long)]
    text_only: bool,

    /// Resolve company names through BrasilAPI
    #[arg(long)]
    lookup: bool,

    /// List every registration number next to the negotiation number
    #[arg(long)]
    composite: bool,
}

impl EngineArgs {
    /// Command-line flags override the config file.
    fn apply(&self, config: &mut SaldoConfig) {
        if let Some(dir) = &self.model_dir {
            config.ocr.model_dir = dir.clone();
        }
        if self.text_only {
            config.ocr.enabled = false;
        }
        if self.lookup {
            config.lookup.enabled = true;
        }
        if self.composite {
            config.extraction.composite_identifier = true;
        }
    }
}

/// Load the config file if given, otherwise defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<SaldoConfig> {
    match config_path {
        Some(path) => Ok(SaldoConfig::from_file(Path::new(path))?),
        None => Ok(SaldoConfig::default()),
    }
}

/// Wire the document processor from config and flags. Missing OCR models or
/// a failing HTTP client only disable the corresponding feature.
pub fn build_processor(mut config: SaldoConfig, engine: &EngineArgs) -> DocumentProcessor {
    engine.apply(&mut config);

    let ocr = if config.ocr.enabled {
        match PureOcrEngine::from_dir(&config.ocr.model_dir, &config.ocr) {
            Ok(ocr) => Some(ocr.with_max_pages(config.pdf.max_pages)),
            Err(e) => {
                warn!(
                    "OCR unavailable ({}), scanned statements will not be read",
                    e
                );
                None
            }
        }
    } else {
        info!("OCR disabled");
        None
    };

    let resolver = if config.lookup.enabled {
        match BrasilApiResolver::new(&config.lookup) {
            Ok(resolver) => Some(resolver),
            Err(e) => {
                warn!("CNPJ lookup unavailable: {}", e);
                None
            }
        }
    } else {
        None
    };

    let mut processor = DocumentProcessor::new(config);
    if let Some(ocr) = ocr {
        processor = processor.with_ocr(ocr);
    }
    if let Some(resolver) = resolver {
        processor = processor.with_resolver(NameCache::new(resolver));
    }
    processor
}
