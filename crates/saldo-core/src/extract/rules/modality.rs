//! Modality (installment program) classification.

use tracing::debug;

use super::patterns::{LEADING_DIGIT_RUN, MODALITY_CAPTURE, MODALITY_STOP_WORD};
use super::{FieldResolver, Resolved};

/// Returned when neither the label capture nor the keyword table matched.
pub const MODALITY_NOT_IDENTIFIED: &str = "Não identificada";

const PLACEHOLDERS: &[&str] = &["NÃO INFORMADO", "NAO INFORMADO", "NÃO SE APLICA", "NAO SE APLICA", "N/A", "-"];

/// Keyword table scanned over the uppercased document; first hit wins, so
/// longer program names precede the codes they contain.
const MODALITY_KEYWORDS: &[(&str, &str)] = &[
    ("TRANSAÇÃO EXCEPCIONAL", "Transação Excepcional"),
    ("TRANSAÇÃO EXTRAORDINÁRIA", "Transação Extraordinária"),
    ("TRANSAÇÃO INDIVIDUAL", "Transação Individual"),
    ("EDITAL", "Transação por Adesão (Edital)"),
    ("EC 113", "EC 113/2021 - Precatórios"),
    ("EC113", "EC 113/2021 - Precatórios"),
    ("13.485", "Lei 13.485/2017"),
    ("13.496", "PERT - Lei 13.496/2017"),
    ("PERT", "PERT - Lei 13.496/2017"),
    ("12.996", "Lei 12.996/2014"),
    ("11.941", "Lei 11.941/2009"),
    ("SIMPLES NACIONAL", "Simples Nacional"),
    ("10.522", "Parcelamento Convencional - Lei 10.522/2002"),
    ("CONVENCIONAL", "Parcelamento Convencional - Lei 10.522/2002"),
    ("SISPAR", "Parcelamento SISPAR"),
];

/// Where a modality label came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalitySource {
    /// Text captured after a `Modalidade:` / `Tipo de Receita:` label.
    Captured,
    /// Keyword inference over the whole document.
    Keyword,
    NotIdentified,
}

impl ModalitySource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Captured => "Rótulo",
            Self::Keyword => "Palavra-chave",
            Self::NotIdentified => super::NOT_FOUND,
        }
    }
}

/// Two-stage modality classifier: labelled capture, then keyword inference.
pub struct ModalityResolver {
    min_length: usize,
}

impl ModalityResolver {
    pub fn new() -> Self {
        Self { min_length: 10 }
    }

    /// Captured text must be longer than `min_length` characters.
    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    fn capture(&self, text: &str) -> Option<String> {
        let caps = MODALITY_CAPTURE.captures(text)?;
        let collapsed = caps[1].split_whitespace().collect::<Vec<_>>().join(" ");

        let truncated = match MODALITY_STOP_WORD.find(&collapsed) {
            Some(m) => &collapsed[..m.start()],
            None => collapsed.as_str(),
        };

        let cleaned = LEADING_DIGIT_RUN
            .replace(truncated.trim(), "")
            .trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '–' | ':' | ';' | ','))
            .to_string();

        let upper = cleaned.to_uppercase();
        if cleaned.chars().count() <= self.min_length || PLACEHOLDERS.contains(&upper.as_str()) {
            debug!("Discarding modality capture '{}'", cleaned);
            return None;
        }

        Some(cleaned)
    }

    fn infer(&self, text: &str) -> Option<&'static str> {
        let upper = text.to_uppercase();
        MODALITY_KEYWORDS
            .iter()
            .find(|(keyword, _)| contains_word(&upper, keyword))
            .map(|(_, label)| *label)
    }

    /// Classify and report which stage produced the label.
    pub fn classify(&self, text: &str) -> (String, ModalitySource) {
        if let Some(captured) = self.capture(text) {
            return (captured, ModalitySource::Captured);
        }
        if let Some(label) = self.infer(text) {
            return (label.to_string(), ModalitySource::Keyword);
        }
        (MODALITY_NOT_IDENTIFIED.to_string(), ModalitySource::NotIdentified)
    }
}

impl Default for ModalityResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldResolver for ModalityResolver {
    type Output = String;

    fn resolve(&self, text: &str) -> Resolved<String> {
        let (value, source) = self.classify(text);
        Resolved::new(value, source.label())
    }
}

/// Classify the modality of a statement with default settings.
pub fn resolve_modality(text: &str) -> Resolved<String> {
    ModalityResolver::new().resolve(text)
}

/// Substring match that refuses to land inside a longer word (`PERT` in
/// `PERTENCE`).
fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_across_lines_until_stop_word() {
        let text = "Modalidade: PARCELAMENTO EXCEPCIONAL\nDE DÉBITOS PREVIDENCIÁRIOS\nSituação: Ativo";
        let (label, source) = ModalityResolver::new().classify(text);

        assert_eq!(label, "PARCELAMENTO EXCEPCIONAL DE DÉBITOS PREVIDENCIÁRIOS");
        assert_eq!(source, ModalitySource::Captured);
    }

    #[test]
    fn test_capture_strips_leading_barcode() {
        let text = "Tipo de Receita: 85810000012345 - CONTRIBUIÇÃO PREVIDENCIÁRIA\nValor: 10,00";
        let (label, _) = ModalityResolver::new().classify(text);
        assert_eq!(label, "CONTRIBUIÇÃO PREVIDENCIÁRIA");
    }

    #[test]
    fn test_short_capture_falls_back_to_keywords() {
        let text = "Modalidade: -\nData: 01/02/2024\nAcordo de transação excepcional";
        let (label, source) = ModalityResolver::new().classify(text);

        assert_eq!(label, "Transação Excepcional");
        assert_eq!(source, ModalitySource::Keyword);
    }

    #[test]
    fn test_keyword_order_and_word_boundaries() {
        let resolver = ModalityResolver::new();
        assert_eq!(resolver.classify("Extrato EC 113 - PERT").0, "EC 113/2021 - Precatórios");
        assert_eq!(resolver.classify("Débitos que pertencem ao SIMPLES NACIONAL").0, "Simples Nacional");
    }

    #[test]
    fn test_not_identified() {
        let result = resolve_modality("Nada de útil aqui");
        assert_eq!(result.value, MODALITY_NOT_IDENTIFIED);
        assert_eq!(result.method, super::super::NOT_FOUND);
    }
}
