//! Core library for Brazilian federal debt statements.
//!
//! This crate provides:
//! - PDF text reading with an OCR fallback for scanned statements
//! - Balance, identifier and modality extraction through ordered rule cascades
//! - Ledger reconstruction for itemized fiscal-situation reports
//! - Flat summary and ledger records ready for spreadsheet export

pub mod error;
pub mod extract;
pub mod lookup;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;

pub use error::{LookupError, OcrError, PdfError, Result, SaldoError};
pub use extract::rules::{format_brl, parse_brl, DocumentType, FieldResolver, Resolved};
pub use extract::{LedgerBlockParser, SummaryExtractor};
pub use lookup::{NameCache, NameResolver, NoLookup, StaticNames};
pub use models::{Document, LedgerRow, ReadMethod, RowKind, SaldoConfig, SummaryRecord};
pub use ocr::OcrProvider;
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
pub use pdf::{DocumentSource, FileSource, MemorySource, PdfExtractor, TextExtractor};
pub use pipeline::{BatchReport, DocumentOutcome, DocumentProcessor};
