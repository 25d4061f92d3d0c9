//! Per-document processing: read, extract text, route, extract fields.

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::extract::rules::is_itemized_report;
use crate::extract::{LedgerBlockParser, SummaryExtractor};
use crate::lookup::{NameResolver, NoLookup};
use crate::models::config::SaldoConfig;
use crate::models::record::{Document, LedgerRow, ReadMethod, SummaryRecord};
use crate::ocr::OcrProvider;
use crate::pdf::{DocumentSource, PdfExtractor, TextExtractor};

/// What one document produced.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome {
    /// Single-balance statement, or a document that could not be read.
    Summary(SummaryRecord),
    /// Itemized fiscal-situation report. The summary is kept so a report
    /// without rows still shows up in the output.
    Ledger {
        summary: SummaryRecord,
        rows: Vec<LedgerRow>,
    },
}

impl DocumentOutcome {
    pub fn summary(&self) -> &SummaryRecord {
        match self {
            Self::Summary(summary) | Self::Ledger { summary, .. } => summary,
        }
    }

    pub fn rows(&self) -> &[LedgerRow] {
        match self {
            Self::Summary(_) => &[],
            Self::Ledger { rows, .. } => rows,
        }
    }

    pub fn is_error(&self) -> bool {
        self.summary().is_error()
    }
}

/// Output of a batch, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub summaries: Vec<SummaryRecord>,
    pub ledger_rows: Vec<LedgerRow>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one document's outcome.
    pub fn push(&mut self, outcome: DocumentOutcome) {
        match outcome {
            DocumentOutcome::Summary(summary) => self.summaries.push(summary),
            DocumentOutcome::Ledger { summary, rows } => {
                if rows.is_empty() {
                    self.summaries.push(summary);
                }
                self.ledger_rows.extend(rows);
            }
        }
    }

    /// Sum of every resolved balance.
    pub fn total_balance(&self) -> Decimal {
        self.summaries.iter().map(|s| s.balance).sum()
    }

    pub fn error_count(&self) -> usize {
        self.summaries.iter().filter(|s| s.is_error()).count()
    }
}

/// Runs documents through text extraction, the OCR fallback and the field
/// extractors.
pub struct DocumentProcessor {
    config: SaldoConfig,
    text: Box<dyn TextExtractor>,
    ocr: Option<Box<dyn OcrProvider>>,
    resolver: Box<dyn NameResolver>,
    summary: SummaryExtractor,
}

impl DocumentProcessor {
    /// Native PDF text, no OCR, no name lookup.
    pub fn new(config: SaldoConfig) -> Self {
        let text = PdfExtractor::new().with_max_pages(config.pdf.max_pages);
        let summary = SummaryExtractor::from_config(&config.extraction);

        Self {
            config,
            text: Box::new(text),
            ocr: None,
            resolver: Box::new(NoLookup),
            summary,
        }
    }

    pub fn with_text_extractor(mut self, extractor: impl TextExtractor + 'static) -> Self {
        self.text = Box::new(extractor);
        self
    }

    pub fn with_ocr(mut self, ocr: impl OcrProvider + 'static) -> Self {
        self.ocr = Some(Box::new(ocr));
        self
    }

    pub fn with_resolver(mut self, resolver: impl NameResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn config(&self) -> &SaldoConfig {
        &self.config
    }

    /// Process one source. Never fails: unreadable documents become an
    /// error-flagged summary.
    pub fn process(&self, source: &dyn DocumentSource) -> DocumentOutcome {
        let name = source.name();

        match self.load(source) {
            Ok(document) => self.process_document(&document),
            Err(e) => {
                warn!("Failed to read {}: {}", name, e);
                DocumentOutcome::Summary(SummaryRecord::failed(name, e))
            }
        }
    }

    /// Extract fields from a document whose text is already available.
    pub fn process_document(&self, document: &Document) -> DocumentOutcome {
        let summary = self.summary.extract(document);

        if self.config.extraction.itemized_detection && is_itemized_report(&document.text()) {
            let parser = LedgerBlockParser::new(self.resolver.as_ref());
            let rows = parser.parse(document.filename(), &document.lines());
            info!("{}: fiscal report with {} ledger rows", document.filename(), rows.len());
            return DocumentOutcome::Ledger { summary, rows };
        }

        info!(
            "{}: balance {} via {}",
            document.filename(),
            summary.balance,
            summary.balance_method
        );
        DocumentOutcome::Summary(summary)
    }

    /// Process every source in order.
    pub fn process_batch<S: DocumentSource>(&self, sources: &[S]) -> BatchReport {
        let mut report = BatchReport::new();
        for source in sources {
            report.push(self.process(source));
        }
        report
    }

    fn load(&self, source: &dyn DocumentSource) -> Result<Document> {
        let data = source.read_bytes()?;
        self.read_document(source.name(), &data)
    }

    /// Native text, replaced by OCR output when it is too short.
    fn read_document(&self, name: &str, data: &[u8]) -> Result<Document> {
        let native = self.text.extract_pages(data);

        let native_len = match &native {
            Ok(pages) => pages.join("\n").trim().chars().count(),
            Err(_) => 0,
        };

        if native_len < self.config.pdf.min_text_length {
            debug!(
                "{}: {} chars of native text (minimum {}), trying OCR",
                name, native_len, self.config.pdf.min_text_length
            );
            match self.run_ocr(name, data) {
                Ok(Some(text)) => return Ok(Document::new(name, vec![text], ReadMethod::Ocr)),
                Ok(None) => {}
                Err(e) => warn!("{}: {}", name, e),
            }
        }

        let pages = native?;
        Ok(Document::new(name, pages, ReadMethod::Native))
    }

    /// At most one OCR call per document. `Ok(None)` when OCR is off or
    /// read nothing.
    fn run_ocr(&self, name: &str, data: &[u8]) -> Result<Option<String>> {
        let Some(ocr) = self.ocr.as_ref().filter(|_| self.config.ocr.enabled) else {
            return Ok(None);
        };

        let text = ocr.recognize(data, &self.config.ocr.language)?;
        if text.trim().is_empty() {
            warn!("{}: OCR produced no text", name);
            return Ok(None);
        }

        info!("{}: OCR produced {} chars", name, text.trim().chars().count());
        Ok(Some(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{OcrError, PdfError};
    use crate::extract::IRREGULAR_LAYOUT;
    use crate::lookup::StaticNames;
    use crate::models::record::RowKind;
    use crate::ocr;
    use crate::pdf::{self, MemorySource};
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::str::FromStr;

    const STATEMENT: &str = "Negociação: 1234567\n\
                             Modalidade: TRANSAÇÃO EXCEPCIONAL DE DÉBITOS\n\
                             Situação: Em dia\n\
                             Saldo Devedor com Juros: R$ 1.000,00";

    struct FixedText {
        pages: Vec<String>,
        calls: Rc<Cell<usize>>,
    }

    impl FixedText {
        fn new(pages: &[&str]) -> (Self, Rc<Cell<usize>>) {
            let calls = Rc::new(Cell::new(0));
            let extractor = Self {
                pages: pages.iter().map(|p| p.to_string()).collect(),
                calls: Rc::clone(&calls),
            };
            (extractor, calls)
        }
    }

    impl TextExtractor for FixedText {
        fn extract_pages(&self, _data: &[u8]) -> pdf::Result<Vec<String>> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.pages.clone())
        }
    }

    struct BrokenPdf;

    impl TextExtractor for BrokenPdf {
        fn extract_pages(&self, _data: &[u8]) -> pdf::Result<Vec<String>> {
            Err(PdfError::Parse("arquivo corrompido".to_string()))
        }
    }

    struct CountingOcr {
        output: ocr::Result<String>,
        calls: Rc<Cell<usize>>,
    }

    impl CountingOcr {
        fn returning(text: &str) -> (Self, Rc<Cell<usize>>) {
            Self::with_output(Ok(text.to_string()))
        }

        fn with_output(output: ocr::Result<String>) -> (Self, Rc<Cell<usize>>) {
            let calls = Rc::new(Cell::new(0));
            let ocr = Self {
                output,
                calls: Rc::clone(&calls),
            };
            (ocr, calls)
        }
    }

    impl OcrProvider for CountingOcr {
        fn recognize(&self, _data: &[u8], language: &str) -> ocr::Result<String> {
            assert_eq!(language, "por");
            self.calls.set(self.calls.get() + 1);
            match &self.output {
                Ok(text) => Ok(text.clone()),
                Err(_) => Err(OcrError::NoImages),
            }
        }
    }

    struct Unreadable;

    impl DocumentSource for Unreadable {
        fn name(&self) -> &str {
            "sumiu.pdf"
        }

        fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "arquivo não encontrado"))
        }
    }

    fn source(name: &str) -> MemorySource {
        MemorySource::new(name, b"%PDF-1.4".to_vec())
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_short_native_text_runs_ocr_once() {
        let (text, _) = FixedText::new(&["  \n ", "Pág 1"]);
        let (ocr, ocr_calls) = CountingOcr::returning(STATEMENT);
        let processor = DocumentProcessor::new(SaldoConfig::default())
            .with_text_extractor(text)
            .with_ocr(ocr);

        let outcome = processor.process(&source("scan.pdf"));

        assert_eq!(ocr_calls.get(), 1);
        let summary = outcome.summary();
        assert_eq!(summary.read_method, ReadMethod::Ocr);
        assert_eq!(summary.balance, dec("1000.00"));
        assert_eq!(summary.identifier, "1234567");
    }

    #[test]
    fn test_long_native_text_never_runs_ocr() {
        let (text, text_calls) = FixedText::new(&[STATEMENT]);
        let (ocr, ocr_calls) = CountingOcr::returning("não deveria ser usado");
        let processor = DocumentProcessor::new(SaldoConfig::default())
            .with_text_extractor(text)
            .with_ocr(ocr);

        let outcome = processor.process(&source("nativo.pdf"));

        assert_eq!(text_calls.get(), 1);
        assert_eq!(ocr_calls.get(), 0);
        assert_eq!(outcome.summary().read_method, ReadMethod::Native);
        assert_eq!(outcome.summary().modality, "TRANSAÇÃO EXCEPCIONAL DE DÉBITOS");
    }

    #[test]
    fn test_ocr_threshold_is_exclusive() {
        let exactly = "x".repeat(50);
        let (text, _) = FixedText::new(&[exactly.as_str()]);
        let (ocr, ocr_calls) = CountingOcr::returning(STATEMENT);
        let processor = DocumentProcessor::new(SaldoConfig::default())
            .with_text_extractor(text)
            .with_ocr(ocr);

        processor.process(&source("limite.pdf"));
        assert_eq!(ocr_calls.get(), 0);
    }

    #[test]
    fn test_ocr_disabled_by_config() {
        let mut config = SaldoConfig::default();
        config.ocr.enabled = false;
        let (text, _) = FixedText::new(&["curto"]);
        let (ocr, ocr_calls) = CountingOcr::returning(STATEMENT);
        let processor = DocumentProcessor::new(config)
            .with_text_extractor(text)
            .with_ocr(ocr);

        let outcome = processor.process(&source("scan.pdf"));

        assert_eq!(ocr_calls.get(), 0);
        assert_eq!(outcome.summary().read_method, ReadMethod::Native);
        assert_eq!(outcome.summary().balance, Decimal::ZERO);
    }

    #[test]
    fn test_ocr_failure_keeps_native_text() {
        let (text, _) = FixedText::new(&["Total: R$ 10,00"]);
        let (ocr, ocr_calls) = CountingOcr::with_output(Err(OcrError::NoImages));
        let processor = DocumentProcessor::new(SaldoConfig::default())
            .with_text_extractor(text)
            .with_ocr(ocr);

        let outcome = processor.process(&source("curto.pdf"));

        assert_eq!(ocr_calls.get(), 1);
        assert_eq!(outcome.summary().read_method, ReadMethod::Native);
        assert_eq!(outcome.summary().balance, dec("10.00"));
    }

    #[test]
    fn test_unreadable_documents_become_error_records() {
        let processor = DocumentProcessor::new(SaldoConfig::default()).with_text_extractor(BrokenPdf);

        let missing = processor.process(&Unreadable);
        assert!(missing.is_error());
        assert_eq!(missing.summary().filename, "sumiu.pdf");
        assert_eq!(missing.summary().document_type, "Erro");
        assert_eq!(missing.summary().identifier, "Erro: I/O error: arquivo não encontrado");

        let corrupt = processor.process(&source("corrompido.pdf"));
        assert!(corrupt.is_error());
        assert!(corrupt.summary().identifier.starts_with("Erro: "));
        assert!(corrupt.summary().identifier.starts_with("Erro: PDF error: "));
        assert!(corrupt.summary().identifier.contains("arquivo corrompido"));
        assert_eq!(corrupt.summary().balance_method, "Falha Leitura");
    }

    #[test]
    fn test_fiscal_report_routes_to_ledger() {
        let report = "MINISTÉRIO DA FAZENDA\n\
                      Relatório de Situação Fiscal\n\
                      CNPJ: 12.345.678/0001-90 - ACME LTDA\n\
                      DCTF - OMISSÃO DE DECLARAÇÃO\n\
                      2023 MAR";
        let (text, _) = FixedText::new(&[report]);
        let names = StaticNames::new().with("12.345.678/0001-90", "ACME INDUSTRIA E COMERCIO LTDA");
        let processor = DocumentProcessor::new(SaldoConfig::default())
            .with_text_extractor(text)
            .with_resolver(names);

        let outcome = processor.process(&source("situacao_fiscal.pdf"));

        let DocumentOutcome::Ledger { rows, summary } = outcome else {
            panic!("expected a ledger outcome");
        };
        assert_eq!(summary.document_type, "Relatório Fiscal");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, RowKind::Omission);
        assert_eq!(rows[0].competence, "2023 MAR");
        assert_eq!(rows[0].taxpayer, "ACME INDUSTRIA E COMERCIO LTDA");
        assert_eq!(rows[0].source_file, "situacao_fiscal.pdf");
    }

    #[test]
    fn test_itemized_detection_can_be_disabled() {
        let mut config = SaldoConfig::default();
        config.extraction.itemized_detection = false;
        let (text, _) = FixedText::new(&["Relatório de Situação Fiscal\nDCTF OMISSÃO 2023 sem valor algum"]);
        let processor = DocumentProcessor::new(config).with_text_extractor(text);

        let outcome = processor.process(&source("situacao_fiscal.pdf"));
        assert!(matches!(outcome, DocumentOutcome::Summary(_)));
    }

    #[test]
    fn test_batch_keeps_order_and_empty_reports() {
        let empty_report = "Relatório de Situação Fiscal\nNenhuma pendência para o contribuinte informado";
        let debtor_report = "Relatório de Situação Fiscal\nCNPJ: 12.345.678 - ACME\n1.000,00\nDEVEDOR";

        let outcomes = [empty_report, debtor_report, STATEMENT, STATEMENT]
            .iter()
            .map(|page| {
                let (text, _) = FixedText::new(&[*page]);
                DocumentProcessor::new(SaldoConfig::default())
                    .with_text_extractor(text)
                    .process(&source("x.pdf"))
            })
            .collect::<Vec<_>>();

        let mut report = BatchReport::new();
        for outcome in outcomes {
            report.push(outcome);
        }

        assert_eq!(report.summaries.len(), 3);
        assert_eq!(report.summaries[0].document_type, "Relatório Fiscal");
        assert_eq!(report.ledger_rows.len(), 1);
        assert_eq!(report.ledger_rows[0].status, IRREGULAR_LAYOUT);
        assert_eq!(report.total_balance(), dec("2000.00"));
        assert_eq!(report.error_count(), 0);
    }

    #[test]
    fn test_process_batch_with_sources() {
        let (text, calls) = FixedText::new(&[STATEMENT]);
        let processor = DocumentProcessor::new(SaldoConfig::default()).with_text_extractor(text);

        let report = processor.process_batch(&[source("a.pdf"), source("b.pdf")]);

        assert_eq!(calls.get(), 2);
        let names: Vec<&str> = report.summaries.iter().map(|s| s.filename.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);
    }
}
