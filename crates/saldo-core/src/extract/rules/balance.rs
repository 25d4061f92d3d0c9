//! Consolidated balance ("saldo") resolution.

use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;

use super::currency::parse_brl;
use super::patterns::{
    BALANCE_WITH_INTEREST, BARE_TOTAL, GENERIC_BALANCE, GRAND_TOTAL, TABLE_TOTAL,
    TOTAL_CONSOLIDATED,
};
use super::{FieldResolver, Resolved, NOT_FOUND};

/// One entry of the balance cascade.
pub struct BalanceRule {
    pub label: &'static str,
    pub pattern: &'static Regex,
    /// Candidates failing this predicate are discarded.
    pub accept: fn(&Decimal) -> bool,
}

fn positive(value: &Decimal) -> bool {
    value.is_sign_positive() && !value.is_zero()
}

/// Balance cascade in precedence order.
///
/// Within the first rule that yields any accepted candidate the largest one
/// wins, so an installment line under the same label never beats the total.
/// Lower rules are not consulted once a rule has produced a value.
pub struct BalanceResolver {
    rules: Vec<BalanceRule>,
}

impl BalanceResolver {
    pub fn new() -> Self {
        Self {
            rules: vec![
                BalanceRule {
                    label: "Saldo Devedor c/ Juros",
                    pattern: &BALANCE_WITH_INTEREST,
                    accept: positive,
                },
                BalanceRule {
                    label: "Vlr Total Consolidado",
                    pattern: &TOTAL_CONSOLIDATED,
                    accept: positive,
                },
                BalanceRule {
                    label: "Total Geral",
                    pattern: &GRAND_TOTAL,
                    accept: positive,
                },
                BalanceRule {
                    label: "Total (Tabela)",
                    pattern: &TABLE_TOTAL,
                    accept: positive,
                },
                BalanceRule {
                    label: "Saldo/Consolidado Genérico",
                    pattern: &GENERIC_BALANCE,
                    accept: positive,
                },
                BalanceRule {
                    label: "Total Simples",
                    pattern: &BARE_TOTAL,
                    accept: positive,
                },
            ],
        }
    }

    pub fn rules(&self) -> &[BalanceRule] {
        &self.rules
    }
}

impl Default for BalanceResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldResolver for BalanceResolver {
    type Output = Decimal;

    fn resolve(&self, text: &str) -> Resolved<Decimal> {
        for rule in &self.rules {
            let best = rule
                .pattern
                .captures_iter(text)
                .map(|caps| parse_brl(&caps[1]))
                .filter(|value| (rule.accept)(value))
                .max();

            if let Some(value) = best {
                debug!("Balance {} resolved by rule '{}'", value, rule.label);
                return Resolved::new(value, rule.label);
            }
        }

        debug!("No balance rule matched");
        Resolved::new(Decimal::ZERO, NOT_FOUND)
    }
}

/// Resolve the consolidated balance of a statement.
pub fn resolve_balance(text: &str) -> Resolved<Decimal> {
    BalanceResolver::new().resolve(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_higher_precedence_rule_wins() {
        let text = "Saldo Devedor com Juros: R$ 1.000,00\nParcela 3/60\nTotal: R$ 50,00";
        let result = resolve_balance(text);

        assert_eq!(result.value, dec("1000"));
        assert_eq!(result.method, "Saldo Devedor c/ Juros");
    }

    #[test]
    fn test_zero_candidates_exhaust_cascade() {
        let result = resolve_balance("Total: R$ 0,00");

        assert_eq!(result.value, Decimal::ZERO);
        assert_eq!(result.method, NOT_FOUND);
        assert!(!result.is_found());
    }

    #[test]
    fn test_largest_candidate_within_rule() {
        let text = "Valor total consolidado da parcela: 1.200,00\n\
                    Valor total consolidado: R$ 72.000,00";
        let result = resolve_balance(text);

        assert_eq!(result.value, dec("72000"));
        assert_eq!(result.method, "Vlr Total Consolidado");
    }

    #[test]
    fn test_amount_on_following_line() {
        let text = "Total Geral\n\nR$\n15.432,10";
        let result = resolve_balance(text);

        assert_eq!(result.value, dec("15432.10"));
        assert_eq!(result.method, "Total Geral");
    }

    #[test]
    fn test_generic_and_bare_fallbacks() {
        let generic = resolve_balance("SALDO DEVEDOR 3.500,00");
        assert_eq!(generic.method, "Saldo/Consolidado Genérico");
        assert_eq!(generic.value, dec("3500"));

        let bare = resolve_balance("TOTAL 8 parcelas 2.000,00");
        assert_eq!(bare.method, "Total Simples");
        assert_eq!(bare.value, dec("2000"));
    }

    #[test]
    fn test_rule_order_is_stable() {
        let labels: Vec<_> = BalanceResolver::new().rules().iter().map(|r| r.label).collect();
        assert_eq!(
            labels,
            vec![
                "Saldo Devedor c/ Juros",
                "Vlr Total Consolidado",
                "Total Geral",
                "Total (Tabela)",
                "Saldo/Consolidado Genérico",
                "Total Simples",
            ]
        );
    }
}
