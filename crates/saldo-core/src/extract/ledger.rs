//! Line-by-line parser for itemized fiscal-situation reports.
//!
//! The report lists debits, MAED penalties, fiscal processes and missing
//! declarations per CNPJ. Text extraction flattens its tables into one
//! value per line, so rows are rebuilt from fixed line windows around a
//! marker line while a small scan state remembers the current taxpayer and
//! whether the scan is inside a fiscal-process block.
//!
//! Window offsets are positional: a layout change silently shifts fields,
//! it does not fail. A window that runs off the document yields a single
//! "irregular layout" row instead.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::lookup::NameResolver;
use crate::models::record::{LedgerRow, RowKind};

use super::rules::cnpj::{cnpj_digits, format_cnpj};
use super::rules::currency::parse_brl;
use super::rules::patterns::*;

/// Lines before a `DEVEDOR` marker that hold the debit fields.
const DEBTOR_WINDOW: usize = 8;
/// Lines after a MAED marker that hold the penalty fields.
const PENALTY_WINDOW: usize = 5;
/// Lines searched for a company name after a CNPJ header.
const NAME_LOOKAHEAD: usize = 4;
/// Lines searched for a period after an omission marker.
const OMISSION_LOOKAHEAD: usize = 6;

pub const IRREGULAR_LAYOUT: &str = "Layout irregular";
pub const PERIOD_NOT_IDENTIFIED: &str = "Não identificado";
const DEBTOR_STATUS_TEXT: &str = "DEVEDOR";

/// Mutable context of one document scan.
#[derive(Debug, Default)]
struct ScanState {
    /// Display form of the CNPJ from the latest header.
    current_tax_id: Option<String>,
    /// Name printed next to the latest header. Loosely tied to the CNPJ.
    current_org_name: Option<String>,
    inside_fiscal_process_block: bool,
    /// Process number waiting for its `DEVEDOR` status line.
    pending_process_number: Option<String>,
    /// Line already read as the status of a MAED penalty.
    consumed_status: Option<usize>,
}

/// Fields read from the lines before a `DEVEDOR` marker.
struct DebtorFields<'a> {
    code: &'a str,
    name: &'a str,
    competence: &'a str,
    due_date: &'a str,
    original: Decimal,
    consolidated: Decimal,
}

/// Parser for itemized reports.
pub struct LedgerBlockParser<'r> {
    resolver: &'r dyn NameResolver,
}

impl<'r> LedgerBlockParser<'r> {
    pub fn new(resolver: &'r dyn NameResolver) -> Self {
        Self { resolver }
    }

    /// Parse the lines of one document into ledger rows.
    pub fn parse(&self, filename: &str, lines: &[String]) -> Vec<LedgerRow> {
        let linked = linked_names(lines);
        let mut state = ScanState::default();
        let mut rows = Vec::new();

        let mut i = 0;
        while i < lines.len() {
            i += self.scan_line(filename, lines, i, &mut state, &linked, &mut rows);
        }

        let captured: HashSet<String> = rows
            .iter()
            .filter(|row| row.kind == RowKind::FiscalProcess)
            .map(|row| row.process_or_code.clone())
            .collect();
        let recovered = self.fallback_pass(filename, lines, &linked, captured);
        if !recovered.is_empty() {
            debug!("Fallback scan recovered {} fiscal processes", recovered.len());
        }
        rows.extend(recovered);

        debug!("Parsed {} ledger rows from {} lines of {}", rows.len(), lines.len(), filename);
        rows
    }

    /// Handle line `i`; returns how many lines were consumed.
    fn scan_line(
        &self,
        filename: &str,
        lines: &[String],
        i: usize,
        state: &mut ScanState,
        linked: &HashMap<String, String>,
        rows: &mut Vec<LedgerRow>,
    ) -> usize {
        let line = lines[i].as_str();

        if state.consumed_status == Some(i) {
            state.consumed_status = None;
            return 1;
        }

        if line.contains("CNPJ") {
            update_tax_context(lines, i, state);
            return 1;
        }

        if line == DEBTOR_STATUS_TEXT && !state.inside_fiscal_process_block {
            let row = match read_debtor_window(lines, i) {
                Some(fields) => {
                    let mut row = self.new_row(filename, RowKind::Debtor, state, linked);
                    row.process_or_code = fields.code.to_string();
                    row.description = fields.name.to_string();
                    row.competence = fields.competence.to_string();
                    row.due_date = fields.due_date.to_string();
                    row.original_amount = fields.original;
                    row.consolidated_amount = fields.consolidated;
                    row.status = DEBTOR_STATUS_TEXT.to_string();
                    row
                }
                None => self.irregular_row(filename, RowKind::Debtor, line, state, linked),
            };
            rows.push(row);
            return 1;
        }

        if PENALTY_CODE.is_match(line) {
            if i + PENALTY_WINDOW >= lines.len() {
                rows.push(self.irregular_row(filename, RowKind::Penalty, line, state, linked));
                return 1;
            }
            let window = &lines[i + 1..=i + PENALTY_WINDOW];
            let original = parse_brl(&window[2]);

            let mut row = self.new_row(filename, RowKind::Penalty, state, linked);
            row.process_or_code = "MAED".to_string();
            row.description = line.to_string();
            row.competence = window[0].clone();
            row.due_date = window[1].clone();
            row.original_amount = original;
            // MAED accrues no interest.
            row.consolidated_amount = original;
            row.status = window[4].clone();
            rows.push(row);
            // The rest of the window is still scanned, except the status.
            state.consumed_status = Some(i + PENALTY_WINDOW);
            return 1;
        }

        if FISCAL_BLOCK_START.is_match(line) {
            debug!("Entering fiscal-process block at line {}", i);
            state.inside_fiscal_process_block = true;
            state.pending_process_number = None;
            return 1;
        }

        if SECTION_HEADER.is_match(line) {
            if state.inside_fiscal_process_block {
                debug!("Leaving fiscal-process block at line {}", i);
            }
            state.inside_fiscal_process_block = false;
            state.pending_process_number = None;
            return 1;
        }

        if state.inside_fiscal_process_block {
            if is_process_column_header(line) {
                return 1;
            }

            if let Some(number) = PROCESS_NUMBER.find(line) {
                state.pending_process_number = Some(number.as_str().to_string());
                // Status printed on the same line as the number.
                if DEBTOR_STATUS.is_match(line) {
                    if let Some(row) = self.take_pending_process(filename, state, linked) {
                        rows.push(row);
                    }
                }
                return 1;
            }

            if DEBTOR_STATUS.is_match(line) && state.pending_process_number.is_some() {
                if let Some(row) = self.take_pending_process(filename, state, linked) {
                    rows.push(row);
                }
                return 1;
            }
        }

        if OMISSION_MARKER.is_match(line) {
            let competence = lines
                .iter()
                .skip(i + 1)
                .take(OMISSION_LOOKAHEAD)
                .find(|candidate| PERIOD_HINT.is_match(candidate))
                .cloned()
                .unwrap_or_else(|| PERIOD_NOT_IDENTIFIED.to_string());

            let mut row = self.new_row(filename, RowKind::Omission, state, linked);
            row.description = line.to_string();
            row.competence = competence;
            row.status = "OMISSÃO".to_string();
            rows.push(row);
            return 1;
        }

        1
    }

    fn take_pending_process(
        &self,
        filename: &str,
        state: &mut ScanState,
        linked: &HashMap<String, String>,
    ) -> Option<LedgerRow> {
        let number = state.pending_process_number.take()?;
        let mut row = self.new_row(filename, RowKind::FiscalProcess, state, linked);
        row.process_or_code = number;
        row.description = "Processo fiscal em situação devedora".to_string();
        row.status = DEBTOR_STATUS_TEXT.to_string();
        Some(row)
    }

    /// Second pass: process numbers next to a `DEVEDOR` status that the
    /// block scan did not capture.
    fn fallback_pass(
        &self,
        filename: &str,
        lines: &[String],
        linked: &HashMap<String, String>,
        mut captured: HashSet<String>,
    ) -> Vec<LedgerRow> {
        let mut state = ScanState::default();
        let mut rows = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            if line.contains("CNPJ") {
                update_tax_context(lines, i, &mut state);
                continue;
            }

            for candidate in PROCESS_LIKE.find_iter(line) {
                let number = candidate.as_str();
                if captured.contains(number) {
                    continue;
                }
                if cnpj_digits(number).len() == 14 {
                    continue;
                }

                let window = context_window(lines, i);
                if !DEBTOR_STATUS.is_match(&window) || DEBTOR_DASH.is_match(&window) {
                    continue;
                }
                let upper = window.to_uppercase();
                if let Some(term) = NON_DEBTOR_TERMS.iter().find(|term| upper.contains(*term)) {
                    debug!("Skipping process {}: context mentions {}", number, term);
                    continue;
                }

                let mut row = self.new_row(filename, RowKind::FiscalProcessFallback, &state, linked);
                row.process_or_code = number.to_string();
                row.description = "Processo fiscal localizado por varredura".to_string();
                row.status = DEBTOR_STATUS_TEXT.to_string();
                rows.push(row);
                captured.insert(number.to_string());
            }
        }

        rows
    }

    /// Empty row of `kind` carrying the current taxpayer.
    fn new_row(
        &self,
        filename: &str,
        kind: RowKind,
        state: &ScanState,
        linked: &HashMap<String, String>,
    ) -> LedgerRow {
        let tax_id = state.current_tax_id.clone().unwrap_or_default();
        let taxpayer = self.taxpayer_name(&tax_id, state, linked).unwrap_or_default();

        LedgerRow {
            source_file: filename.to_string(),
            kind,
            taxpayer,
            tax_id,
            process_or_code: String::new(),
            description: String::new(),
            competence: String::new(),
            due_date: String::new(),
            original_amount: Decimal::ZERO,
            consolidated_amount: Decimal::ZERO,
            status: String::new(),
        }
    }

    fn irregular_row(
        &self,
        filename: &str,
        kind: RowKind,
        line: &str,
        state: &ScanState,
        linked: &HashMap<String, String>,
    ) -> LedgerRow {
        warn!("Irregular {} layout in {}: '{}'", kind.label(), filename, line);
        let mut row = self.new_row(filename, kind, state, linked);
        row.description = line.to_string();
        row.status = IRREGULAR_LAYOUT.to_string();
        row
    }

    /// Remote registry first, then the "vinculado" header table, then the
    /// name printed beside the latest CNPJ.
    fn taxpayer_name(
        &self,
        tax_id: &str,
        state: &ScanState,
        linked: &HashMap<String, String>,
    ) -> Option<String> {
        if !tax_id.is_empty() {
            if let Some(name) = self.resolver.resolve(tax_id) {
                return Some(name);
            }
            if let Some(name) = linked.get(&cnpj_digits(tax_id)) {
                return Some(name.clone());
            }
        }
        state.current_org_name.clone()
    }
}

/// CNPJ digits -> name for headers like `Débitos vinculados ao CNPJ ...`
/// followed by the company name on the next line.
pub fn linked_names(lines: &[String]) -> HashMap<String, String> {
    let mut names = HashMap::new();

    for (i, line) in lines.iter().enumerate() {
        if !LINKED_TO.is_match(line) {
            continue;
        }
        let Some(caps) = CNPJ_HEADER.captures(line) else {
            continue;
        };
        if let Some(name) = lines.get(i + 1).filter(|next| is_name_line(next)) {
            names.insert(cnpj_digits(&caps[1]), name.clone());
        }
    }

    names
}

/// Read the CNPJ header at line `i` into the scan state.
fn update_tax_context(lines: &[String], i: usize, state: &mut ScanState) {
    let Some(caps) = CNPJ_HEADER.captures(&lines[i]) else {
        return;
    };

    let tax_id = format_cnpj(&caps[1]);
    let inline = caps[2]
        .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '–' | ':'))
        .trim();

    let name = if !inline.is_empty() && !inline.chars().any(|c| c.is_ascii_digit()) {
        Some(inline.to_string())
    } else {
        lines
            .iter()
            .skip(i + 1)
            .take(NAME_LOOKAHEAD)
            .find(|candidate| is_name_line(candidate))
            .cloned()
    };

    debug!("Taxpayer context: {} ({})", tax_id, name.as_deref().unwrap_or("sem nome"));
    state.current_tax_id = Some(tax_id);
    state.current_org_name = name;
}

fn is_name_line(line: &str) -> bool {
    line.chars().count() >= 5
        && !line.chars().any(|c| c.is_ascii_digit())
        && !PAGE_FOOTER.is_match(line)
        && !SECTION_HEADER.is_match(line)
        && !FISCAL_BLOCK_START.is_match(line)
}

fn is_process_column_header(line: &str) -> bool {
    let upper = line.to_uppercase();
    upper
        .split_whitespace()
        .all(|token| PROCESS_COLUMN_HEADERS.contains(&token))
}

fn read_debtor_window(lines: &[String], i: usize) -> Option<DebtorFields<'_>> {
    let start = i.checked_sub(DEBTOR_WINDOW)?;
    let window = &lines[start..i];
    let (code, name) = window[0].split_once(" - ")?;

    Some(DebtorFields {
        code: code.trim(),
        name: name.trim(),
        competence: window[1].as_str(),
        due_date: window[2].as_str(),
        original: parse_brl(&window[3]),
        consolidated: parse_brl(&window[7]),
    })
}

/// Previous, current and next line joined by spaces.
fn context_window(lines: &[String], i: usize) -> String {
    let start = i.saturating_sub(1);
    let end = (i + 2).min(lines.len());
    lines[start..end].join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::{NoLookup, StaticNames};
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn parse(raw: &[&str]) -> Vec<LedgerRow> {
        LedgerBlockParser::new(&NoLookup).parse("relatorio.pdf", &lines(raw))
    }

    fn of_kind(rows: &[LedgerRow], kind: RowKind) -> Vec<&LedgerRow> {
        rows.iter().filter(|row| row.kind == kind).collect()
    }

    #[test]
    fn test_debtor_window() {
        let rows = parse(&[
            "CNPJ: 12.345.678/0001-90 - ACME INDUSTRIA LTDA",
            "Pendência - Débito (SIEF)",
            "1082-01 - CP SEGURADOS",
            "01/2023",
            "20/02/2023",
            "1.234,56",
            "1.234,56",
            "246,91",
            "150,00",
            "1.631,47",
            "DEVEDOR",
        ]);

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.kind, RowKind::Debtor);
        assert_eq!(row.taxpayer, "ACME INDUSTRIA LTDA");
        assert_eq!(row.tax_id, "12.345.678/0001-90");
        assert_eq!(row.process_or_code, "1082-01");
        assert_eq!(row.description, "CP SEGURADOS");
        assert_eq!(row.competence, "01/2023");
        assert_eq!(row.due_date, "20/02/2023");
        assert_eq!(row.original_amount, dec("1234.56"));
        assert_eq!(row.consolidated_amount, parse_brl("1.631,47"));
        assert_eq!(row.status, "DEVEDOR");
    }

    #[test]
    fn test_short_debtor_window_is_irregular() {
        let rows = parse(&["CNPJ: 12.345.678 - ACME", "1082-01 - CP", "1.000,00", "DEVEDOR"]);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, RowKind::Debtor);
        assert_eq!(rows[0].status, IRREGULAR_LAYOUT);
        assert_eq!(rows[0].description, "DEVEDOR");
        assert_eq!(rows[0].consolidated_amount, Decimal::ZERO);
        assert_eq!(rows[0].tax_id, "12.345.678");
    }

    #[test]
    fn test_debtor_window_without_separator_is_irregular() {
        let rows = parse(&["1082-01 CP", "01/2023", "20/02/2023", "1,00", "1,00", "0,00", "0,00", "1,00", "DEVEDOR"]);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, IRREGULAR_LAYOUT);
    }

    #[test]
    fn test_penalty_reads_forward_and_consumes_its_status() {
        let rows = parse(&[
            "MAED - MULTA POR ATRASO NA ENTREGA DA DCTF",
            "03/2022",
            "15/07/2022",
            "500,00",
            "500,00",
            "DEVEDOR",
        ]);

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.kind, RowKind::Penalty);
        assert_eq!(row.competence, "03/2022");
        assert_eq!(row.due_date, "15/07/2022");
        assert_eq!(row.original_amount, dec("500"));
        assert_eq!(row.consolidated_amount, row.original_amount);
        assert_eq!(row.status, "DEVEDOR");
    }

    #[test]
    fn test_markers_inside_penalty_window_are_still_scanned() {
        let rows = parse(&[
            "MAED - MULTA",
            "CNPJ: 98.765.432/0001-10 - BETA SERVICOS SA",
            "DCTF - OMISSÃO",
            "2023",
            "500,00",
            "DEVEDOR",
        ]);

        assert_eq!(of_kind(&rows, RowKind::Penalty).len(), 1);
        assert!(of_kind(&rows, RowKind::Debtor).is_empty());

        let omissions = of_kind(&rows, RowKind::Omission);
        assert_eq!(omissions.len(), 1);
        assert_eq!(omissions[0].competence, "2023");
        assert_eq!(omissions[0].tax_id, "98.765.432/0001-10");
        assert_eq!(omissions[0].taxpayer, "BETA SERVICOS SA");
    }

    #[test]
    fn test_truncated_penalty_is_irregular() {
        let rows = parse(&["MAED - MULTA", "03/2022"]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, RowKind::Penalty);
        assert_eq!(rows[0].status, IRREGULAR_LAYOUT);
    }

    #[test]
    fn test_fiscal_process_block() {
        let rows = parse(&[
            "CNPJ: 12.345.678/0001-90 - ACME",
            "Pendência - Processo Fiscal (SIEF)",
            "Processo Situação Localização",
            "10880.720.123/2023-45",
            "DEVEDOR",
            "DRF SAO PAULO",
            "10880.720.999/2023-11 DEVEDOR",
            "Pendência - Inscrição (SIDA)",
            "DEVEDOR",
        ]);

        let processes = of_kind(&rows, RowKind::FiscalProcess);
        assert_eq!(processes.len(), 2);
        assert_eq!(processes[0].process_or_code, "10880.720.123/2023-45");
        assert_eq!(processes[1].process_or_code, "10880.720.999/2023-11");
        assert_eq!(processes[0].taxpayer, "ACME");
        assert!(of_kind(&rows, RowKind::FiscalProcessFallback).is_empty());

        // Outside the block the last DEVEDOR is a debit marker again.
        assert_eq!(of_kind(&rows, RowKind::Debtor).len(), 1);
    }

    #[test]
    fn test_status_without_pending_process_is_ignored_in_block() {
        let rows = parse(&["Pendência - Processo Fiscal (SIEF)", "DEVEDOR"]);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_fallback_recovers_process() {
        let rows = parse(&["10880.720.123/2023-45", "DEVEDOR"]);

        let recovered = of_kind(&rows, RowKind::FiscalProcessFallback);
        assert_eq!(recovered.len(), 1);
        assert_eq!(recovered[0].process_or_code, "10880.720.123/2023-45");
        assert_eq!(recovered[0].consolidated_amount, Decimal::ZERO);
    }

    #[test]
    fn test_fallback_rejects_boilerplate_dash() {
        let rows = parse(&["10880.720.123/2023-45", "DEVEDOR - situação sujeita a confirmação"]);
        assert!(of_kind(&rows, RowKind::FiscalProcessFallback).is_empty());
    }

    #[test]
    fn test_fallback_rejects_non_debtor_context_and_cnpj() {
        let rows = parse(&[
            "10880.720.123/2023-45 DEVEDOR",
            "EXIGIBILIDADE SUSPENSA",
            "texto",
            "Sócio 12.345.678/0001-90 DEVEDOR",
        ]);
        assert!(of_kind(&rows, RowKind::FiscalProcessFallback).is_empty());
    }

    #[test]
    fn test_fallback_rejects_every_non_debtor_term() {
        for term in NON_DEBTOR_TERMS {
            let status = format!("SITUAÇÃO {}O", term);
            let rows = parse(&["10880.720.123/2023-45 DEVEDOR", status.as_str()]);
            assert!(
                of_kind(&rows, RowKind::FiscalProcessFallback).is_empty(),
                "{} should suppress the fallback row",
                term
            );
        }

        let rows = parse(&["10880.720.123/2023-45 DEVEDOR", "SITUAÇÃO EM ANÁLISE"]);
        assert_eq!(of_kind(&rows, RowKind::FiscalProcessFallback).len(), 1);
    }

    #[test]
    fn test_fallback_window_borrows_status_from_previous_line() {
        let rows = parse(&[
            "10880.720.123/2023-45",
            "DEVEDOR",
            "10880.720.999/2023-11",
            "EM ANÁLISE",
        ]);

        let recovered = of_kind(&rows, RowKind::FiscalProcessFallback);
        assert_eq!(recovered.len(), 2);
        assert_eq!(recovered[1].process_or_code, "10880.720.999/2023-11");
    }

    #[test]
    fn test_fallback_reports_each_number_once() {
        let rows = parse(&["10880.720.123/2023-45 DEVEDOR", "10880.720.123/2023-45 DEVEDOR"]);
        assert_eq!(of_kind(&rows, RowKind::FiscalProcessFallback).len(), 1);
    }

    #[test]
    fn test_omission_period_lookahead() {
        let rows = parse(&["DCTF - OMISSÃO DE DECLARAÇÃO", "Período", "2023 MAR", "DCTF - OMISSAO"]);

        let omissions = of_kind(&rows, RowKind::Omission);
        assert_eq!(omissions.len(), 2);
        assert_eq!(omissions[0].competence, "2023 MAR");
        assert_eq!(omissions[0].original_amount, Decimal::ZERO);
        assert_eq!(omissions[1].competence, PERIOD_NOT_IDENTIFIED);
    }

    #[test]
    fn test_name_lookahead_skips_footer_and_digits() {
        let rows = parse(&[
            "CNPJ: 12.345.678/0001-90",
            "Página 1 de 2",
            "MINISTÉRIO DA FAZENDA",
            "ACME COMERCIO LTDA",
            "DEVEDOR",
        ]);

        assert_eq!(rows[0].taxpayer, "ACME COMERCIO LTDA");
    }

    #[test]
    fn test_name_resolution_precedence() {
        let raw = lines(&[
            "Débitos vinculados ao CNPJ 12.345.678/0001-90",
            "ACME MATRIZ",
            "CNPJ: 12.345.678/0001-90 - ACME",
            "DEVEDOR",
        ]);

        let local = LedgerBlockParser::new(&NoLookup).parse("a.pdf", &raw);
        assert_eq!(local[0].taxpayer, "ACME MATRIZ");

        let registry = StaticNames::new().with("12345678000190", "ACME INDUSTRIA S.A.");
        let remote = LedgerBlockParser::new(&registry).parse("a.pdf", &raw);
        assert_eq!(remote[0].taxpayer, "ACME INDUSTRIA S.A.");
    }

    #[test]
    fn test_context_overwritten_by_later_header() {
        let rows = parse(&[
            "CNPJ: 12.345.678/0001-90 - PRIMEIRA LTDA",
            "DCTF OMISSÃO 2022",
            "CNPJ: 98.765.432/0001-10 - SEGUNDA LTDA",
            "DCTF OMISSÃO 2023",
        ]);

        assert_eq!(rows[0].taxpayer, "PRIMEIRA LTDA");
        assert_eq!(rows[1].taxpayer, "SEGUNDA LTDA");
        assert_eq!(rows[1].tax_id, "98.765.432/0001-10");
    }
}
