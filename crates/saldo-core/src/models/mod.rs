//! Data models.

pub mod config;
pub mod record;

pub use config::SaldoConfig;
pub use record::{Document, LedgerRow, ReadMethod, RowKind, SummaryRecord};
