//! Field extraction from statement text.
//!
//! Single-balance statements go through the scalar rule cascades in
//! [`rules`]; fiscal-situation reports go through the ledger block parser.

mod ledger;
pub mod rules;
mod summary;

pub use ledger::{linked_names, LedgerBlockParser, IRREGULAR_LAYOUT, PERIOD_NOT_IDENTIFIED};
pub use summary::SummaryExtractor;
