//! Scalar field extraction for single-balance statements.

use tracing::debug;

use crate::models::config::ExtractionConfig;
use crate::models::record::{Document, SummaryRecord};

use super::rules::{
    classify_document, resolve_identifier_composite, BalanceResolver, FieldResolver,
    IdentifierResolver, ModalityResolver,
};

/// Builds a [`SummaryRecord`] from the balance, identifier and modality
/// cascades. Each resolver sees the full document text independently.
pub struct SummaryExtractor {
    balance: BalanceResolver,
    identifier: IdentifierResolver,
    modality: ModalityResolver,
    composite_identifier: bool,
}

impl SummaryExtractor {
    pub fn new() -> Self {
        Self {
            balance: BalanceResolver::new(),
            identifier: IdentifierResolver::new(),
            modality: ModalityResolver::new(),
            composite_identifier: false,
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new()
            .with_composite_identifier(config.composite_identifier)
            .with_modality_min_length(config.modality_min_length)
    }

    /// List every registration number next to the negotiation number.
    pub fn with_composite_identifier(mut self, composite: bool) -> Self {
        self.composite_identifier = composite;
        self
    }

    pub fn with_modality_min_length(mut self, min_length: usize) -> Self {
        self.modality = ModalityResolver::new().with_min_length(min_length);
        self
    }

    pub fn extract(&self, document: &Document) -> SummaryRecord {
        let text = document.text();

        let balance = self.balance.resolve(&text);
        let identifier = if self.composite_identifier {
            resolve_identifier_composite(&text)
        } else {
            self.identifier.resolve(&text)
        };
        let modality = self.modality.resolve(&text);
        let document_type = classify_document(&text, Some(document.filename()));

        debug!(
            "{}: balance {} ({}), identifier {} ({}), modality '{}'",
            document.filename(),
            balance.value,
            balance.method,
            identifier.value,
            identifier.method,
            modality.value
        );

        SummaryRecord {
            filename: document.filename().to_string(),
            document_type: document_type.label().to_string(),
            identifier: identifier.value,
            identifier_method: identifier.method.to_string(),
            modality: modality.value,
            modality_method: modality.method.to_string(),
            balance: balance.value,
            balance_method: balance.method.to_string(),
            read_method: document.read_method(),
        }
    }
}

impl Default for SummaryExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::ReadMethod;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn statement() -> Document {
        Document::new(
            "extrato_ec113.pdf",
            vec![
                "Negociação nº 1234567\nModalidade: PARCELAMENTO DE PRECATÓRIOS EC 113\nSituação: Em dia".to_string(),
                "Saldo Devedor com Juros: R$ 12.345,67\nTotal: R$ 50,00\n80 6 21 000001-01".to_string(),
            ],
            ReadMethod::Ocr,
        )
    }

    #[test]
    fn test_extract_summary() {
        let record = SummaryExtractor::new().extract(&statement());

        assert_eq!(record.filename, "extrato_ec113.pdf");
        assert_eq!(record.document_type, "EC 113");
        assert_eq!(record.identifier, "1234567");
        assert_eq!(record.identifier_method, "Negociação");
        assert_eq!(record.modality, "PARCELAMENTO DE PRECATÓRIOS EC 113");
        assert_eq!(record.modality_method, "Rótulo");
        assert_eq!(record.balance, Decimal::from_str("12345.67").unwrap());
        assert_eq!(record.balance_method, "Saldo Devedor c/ Juros");
        assert_eq!(record.read_method, ReadMethod::Ocr);
    }

    #[test]
    fn test_composite_identifier_mode() {
        let extractor = SummaryExtractor::new().with_composite_identifier(true);
        let record = extractor.extract(&statement());

        assert_eq!(record.identifier, "1234567 | Insc.: 80 6 21 000001-01");
        assert_eq!(record.identifier_method, "Negociação + Inscrições");
    }
}
