//! Negotiation / registration identifier resolution.

use tracing::debug;

use super::patterns::{NEGOTIATION_NUMBER, REGISTRATION_NUMBER, SHORT_ACCOUNT, YEAR_PREFIX};
use super::{FieldResolver, Resolved, NOT_FOUND};

/// Registration numbers listed in the composite display before eliding.
const MAX_LISTED_REGISTRATIONS: usize = 3;

/// One entry of the identifier cascade.
pub struct IdentifierRule {
    pub label: &'static str,
    pub extract: fn(&str) -> Option<String>,
}

/// Negotiation/account number of 7 to 9 digits that does not start with a
/// year. The capture is greedy, so a longer digit run (barcode) is rejected
/// rather than truncated.
pub fn negotiation_number(text: &str) -> Option<String> {
    NEGOTIATION_NUMBER
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .find(|digits| (7..=9).contains(&digits.len()) && !YEAR_PREFIX.is_match(digits))
}

/// First registration number in canonical `NN N NN NNNNNN-NN` form.
pub fn registration_number(text: &str) -> Option<String> {
    registration_numbers(text).into_iter().next()
}

/// All distinct registration numbers, in order of first appearance.
pub fn registration_numbers(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();

    for caps in REGISTRATION_NUMBER.captures_iter(text) {
        let number = format!(
            "{} {} {} {}-{}",
            &caps[1], &caps[2], &caps[3], &caps[4], &caps[5]
        );
        if !found.contains(&number) {
            found.push(number);
        }
    }

    found
}

fn short_account_number(text: &str) -> Option<String> {
    SHORT_ACCOUNT
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .find(|digits| (3..=6).contains(&digits.len()))
}

/// Identifier cascade in precedence order; the first rule that extracts a
/// value wins.
pub struct IdentifierResolver {
    rules: Vec<IdentifierRule>,
}

impl IdentifierResolver {
    pub fn new() -> Self {
        Self {
            rules: vec![
                IdentifierRule {
                    label: "Negociação",
                    extract: negotiation_number,
                },
                IdentifierRule {
                    label: "Inscrição",
                    extract: registration_number,
                },
                IdentifierRule {
                    label: "Conta/Parcelamento",
                    extract: short_account_number,
                },
            ],
        }
    }

    pub fn rules(&self) -> &[IdentifierRule] {
        &self.rules
    }
}

impl Default for IdentifierResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldResolver for IdentifierResolver {
    type Output = String;

    fn resolve(&self, text: &str) -> Resolved<String> {
        for rule in &self.rules {
            if let Some(value) = (rule.extract)(text) {
                debug!("Identifier {} resolved by rule '{}'", value, rule.label);
                return Resolved::new(value, rule.label);
            }
        }

        Resolved::new("Desconhecido".to_string(), NOT_FOUND)
    }
}

/// Resolve the identifier of a statement with the single-value cascade.
pub fn resolve_identifier(text: &str) -> Resolved<String> {
    IdentifierResolver::new().resolve(text)
}

/// Resolve the negotiation number together with every registration number
/// it covers, e.g. `1234567 | Insc.: 11 7 11 123456-78, 11 7 12 654321-00`.
///
/// Falls back to the single-value cascade when neither is present.
pub fn resolve_identifier_composite(text: &str) -> Resolved<String> {
    let negotiation = negotiation_number(text);
    let registrations = registration_numbers(text);

    let listed = if registrations.is_empty() {
        None
    } else {
        let mut listed = registrations
            .iter()
            .take(MAX_LISTED_REGISTRATIONS)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        if registrations.len() > MAX_LISTED_REGISTRATIONS {
            listed.push_str(", ...");
        }
        Some(listed)
    };

    match (negotiation, listed) {
        (Some(neg), Some(listed)) => Resolved::new(
            format!("{} | Insc.: {}", neg, listed),
            "Negociação + Inscrições",
        ),
        (Some(neg), None) => Resolved::new(neg, "Negociação"),
        (None, Some(listed)) => Resolved::new(listed, "Inscrição"),
        (None, None) => resolve_identifier(text),
    }
}
