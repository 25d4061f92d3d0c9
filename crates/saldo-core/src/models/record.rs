//! Documents and the flat records produced from them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How the text of a document was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadMethod {
    /// Text layer embedded in the PDF.
    Native,
    /// Optical character recognition over page images.
    Ocr,
    /// Nothing could be read.
    Failed,
}

impl ReadMethod {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Native => "Nativo",
            Self::Ocr => "OCR",
            Self::Failed => "Falha Leitura",
        }
    }
}

/// One source file after text extraction.
///
/// Lines keep page order, and within a page the order produced by the
/// text extractor, so spatially adjacent text stays adjacent.
#[derive(Debug, Clone)]
pub struct Document {
    filename: String,
    pages: Vec<String>,
    read_method: ReadMethod,
}

impl Document {
    pub fn new(filename: impl Into<String>, pages: Vec<String>, read_method: ReadMethod) -> Self {
        Self {
            filename: filename.into(),
            pages,
            read_method,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    pub fn read_method(&self) -> ReadMethod {
        self.read_method
    }

    /// Full text, pages separated by a newline.
    pub fn text(&self) -> String {
        self.pages.join("\n")
    }

    /// Non-empty trimmed lines of every page, in reading order.
    pub fn lines(&self) -> Vec<String> {
        self.pages
            .iter()
            .flat_map(|page| page.lines())
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|line| !line.is_empty())
            .collect()
    }
}

/// Kind of an itemized ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowKind {
    /// Debit line closed by a `DEVEDOR` status.
    Debtor,
    /// MAED penalty (late filing fine).
    Penalty,
    /// Process listed inside a fiscal-process block.
    FiscalProcess,
    /// Process recovered by the full-scan fallback pass.
    FiscalProcessFallback,
    /// Missing declaration.
    Omission,
}

impl RowKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Debtor => "Débito",
            Self::Penalty => "MAED",
            Self::FiscalProcess => "Processo Fiscal",
            Self::FiscalProcessFallback => "Processo Fiscal (varredura)",
            Self::Omission => "Omissão",
        }
    }
}

/// One structured row of a fiscal-situation report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    #[serde(rename = "Arquivo")]
    pub source_file: String,
    #[serde(rename = "Tipo")]
    pub kind: RowKind,
    #[serde(rename = "Contribuinte")]
    pub taxpayer: String,
    #[serde(rename = "CNPJ")]
    pub tax_id: String,
    #[serde(rename = "Processo/Código")]
    pub process_or_code: String,
    #[serde(rename = "Descrição")]
    pub description: String,
    #[serde(rename = "Competência")]
    pub competence: String,
    #[serde(rename = "Vencimento")]
    pub due_date: String,
    #[serde(rename = "Valor Original")]
    pub original_amount: Decimal,
    #[serde(rename = "Saldo Consolidado")]
    pub consolidated_amount: Decimal,
    #[serde(rename = "Situação")]
    pub status: String,
}

/// One row for a document that is not an itemized report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    #[serde(rename = "Arquivo")]
    pub filename: String,
    #[serde(rename = "Tipo Doc")]
    pub document_type: String,
    #[serde(rename = "Identificador")]
    pub identifier: String,
    #[serde(rename = "Tipo Identificador")]
    pub identifier_method: String,
    #[serde(rename = "Modalidade")]
    pub modality: String,
    /// Stage that produced the modality (label capture or keyword).
    pub modality_method: String,
    #[serde(rename = "Saldo (R$)")]
    pub balance: Decimal,
    #[serde(rename = "Método")]
    pub balance_method: String,
    #[serde(rename = "Leitura")]
    pub read_method: ReadMethod,
}

impl SummaryRecord {
    /// Record standing in for a document that could not be read at all.
    pub fn failed(filename: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self {
            filename: filename.into(),
            document_type: "Erro".to_string(),
            identifier: format!("Erro: {}", reason),
            identifier_method: "-".to_string(),
            modality: "-".to_string(),
            modality_method: "-".to_string(),
            balance: Decimal::ZERO,
            balance_method: ReadMethod::Failed.label().to_string(),
            read_method: ReadMethod::Failed,
        }
    }

    pub fn is_error(&self) -> bool {
        self.read_method == ReadMethod::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lines_skip_blanks_and_collapse_spaces() {
        let doc = Document::new(
            "a.pdf",
            vec!["  CNPJ:  12  \n\n DEVEDOR ".to_string(), "Página 2".to_string()],
            ReadMethod::Native,
        );

        assert_eq!(doc.lines(), vec!["CNPJ: 12", "DEVEDOR", "Página 2"]);
        assert_eq!(doc.text(), "  CNPJ:  12  \n\n DEVEDOR \nPágina 2");
    }

    #[test]
    fn test_failed_summary() {
        let record = SummaryRecord::failed("x.pdf", "arquivo corrompido");
        assert!(record.is_error());
        assert_eq!(record.identifier, "Erro: arquivo corrompido");
        assert_eq!(record.balance_method, "Falha Leitura");
    }
}
