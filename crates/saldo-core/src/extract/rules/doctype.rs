//! Coarse document type tagging.

use serde::{Deserialize, Serialize};

/// Program / layout family of a statement. Metadata only, except for
/// [`DocumentType::FiscalReport`], which routes to the ledger parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Receita Federal fiscal-situation report (itemized).
    FiscalReport,
    Ec113,
    Transaction,
    Law13485,
    Regularize,
    Generic,
}

impl DocumentType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::FiscalReport => "Relatório Fiscal",
            Self::Ec113 => "EC 113",
            Self::Transaction => "Transação",
            Self::Law13485 => "Lei 13.485",
            Self::Regularize => "Regularize",
            Self::Generic => "Genérico",
        }
    }
}

const FISCAL_REPORT_MARKERS: &[&str] = &[
    "SITUAÇÃO FISCAL",
    "SITUACAO FISCAL",
    "INFORMAÇÕES DE APOIO PARA EMISSÃO DE CERTIDÃO",
    "INFORMACOES DE APOIO PARA EMISSAO DE CERTIDAO",
];

/// Whether the text is an itemized fiscal-situation report.
pub fn is_itemized_report(text: &str) -> bool {
    let upper = text.to_uppercase();
    FISCAL_REPORT_MARKERS.iter().any(|marker| upper.contains(marker))
}

fn classify_upper(upper: &str) -> Option<DocumentType> {
    if FISCAL_REPORT_MARKERS.iter().any(|marker| upper.contains(marker)) {
        Some(DocumentType::FiscalReport)
    } else if upper.contains("EC 113") || upper.contains("EC113") {
        Some(DocumentType::Ec113)
    } else if upper.contains("TRANSAÇÃO") || upper.contains("TRANSACAO") {
        Some(DocumentType::Transaction)
    } else if upper.contains("13.485") || upper.contains("13485") {
        Some(DocumentType::Law13485)
    } else if upper.contains("REGULARIZE") {
        Some(DocumentType::Regularize)
    } else {
        None
    }
}

/// Tag a document by keyword presence in its text, then in its filename.
pub fn classify_document(text: &str, filename: Option<&str>) -> DocumentType {
    classify_upper(&text.to_uppercase())
        .or_else(|| filename.and_then(|name| classify_upper(&name.to_uppercase())))
        .unwrap_or(DocumentType::Generic)
}
