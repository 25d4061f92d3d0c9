//! Tabular and text renderings of summaries and ledger rows.

use std::io::Write;

use serde::Serialize;

use saldo_core::{format_brl, LedgerRow, SummaryRecord};

/// Spreadsheet locales that use the decimal comma expect `;` separators.
const DELIMITER: u8 = b';';

const SUMMARY_HEADERS: [&str; 9] = [
    "Arquivo",
    "Tipo Doc",
    "Identificador",
    "Tipo Identificador",
    "Modalidade",
    "Origem Modalidade",
    "Saldo (R$)",
    "Método",
    "Leitura",
];

const LEDGER_HEADERS: [&str; 11] = [
    "Arquivo",
    "Tipo",
    "Contribuinte",
    "CNPJ",
    "Processo/Código",
    "Descrição",
    "Competência",
    "Vencimento",
    "Valor Original",
    "Saldo Consolidado",
    "Situação",
];

/// JSON document written by `process --format json` and `batch --json`.
#[derive(Serialize)]
pub struct JsonReport<'a> {
    pub generated_at: String,
    pub total_balance: String,
    pub summaries: &'a [SummaryRecord],
    pub ledger_rows: &'a [LedgerRow],
}

impl<'a> JsonReport<'a> {
    pub fn new(summaries: &'a [SummaryRecord], ledger_rows: &'a [LedgerRow]) -> Self {
        let total = summaries.iter().map(|s| s.balance).sum();
        Self {
            generated_at: chrono::Local::now().to_rfc3339(),
            total_balance: format_brl(total),
            summaries,
            ledger_rows,
        }
    }
}

fn writer<W: Write>(sink: W) -> csv::Writer<W> {
    csv::WriterBuilder::new().delimiter(DELIMITER).from_writer(sink)
}

pub fn write_summaries<W: Write>(sink: W, summaries: &[SummaryRecord]) -> anyhow::Result<()> {
    let mut wtr = writer(sink);
    wtr.write_record(SUMMARY_HEADERS)?;

    for s in summaries {
        wtr.write_record([
            s.filename.as_str(),
            s.document_type.as_str(),
            s.identifier.as_str(),
            s.identifier_method.as_str(),
            s.modality.as_str(),
            s.modality_method.as_str(),
            format_brl(s.balance).as_str(),
            s.balance_method.as_str(),
            s.read_method.label(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_ledger<W: Write>(sink: W, rows: &[LedgerRow]) -> anyhow::Result<()> {
    let mut wtr = writer(sink);
    wtr.write_record(LEDGER_HEADERS)?;

    for r in rows {
        wtr.write_record([
            r.source_file.as_str(),
            r.kind.label(),
            r.taxpayer.as_str(),
            r.tax_id.as_str(),
            r.process_or_code.as_str(),
            r.description.as_str(),
            r.competence.as_str(),
            r.due_date.as_str(),
            format_brl(r.original_amount).as_str(),
            format_brl(r.consolidated_amount).as_str(),
            r.status.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn summary_text(s: &SummaryRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("Arquivo: {}\n", s.filename));
    output.push_str(&format!("Tipo: {}\n", s.document_type));
    output.push_str(&format!("Leitura: {}\n", s.read_method.label()));
    output.push('\n');
    output.push_str(&format!("Identificador: {} ({})\n", s.identifier, s.identifier_method));
    output.push_str(&format!("Modalidade: {} ({})\n", s.modality, s.modality_method));
    output.push_str(&format!("Saldo: R$ {} ({})\n", format_brl(s.balance), s.balance_method));

    output
}

pub fn ledger_text(rows: &[LedgerRow]) -> String {
    let mut output = String::new();

    for r in rows {
        output.push_str(&format!(
            "[{}] {} {} | {} | {} | {} | R$ {} | {}\n",
            r.kind.label(),
            r.tax_id,
            r.taxpayer,
            r.process_or_code,
            r.description,
            r.competence,
            format_brl(r.consolidated_amount),
            r.status
        ));
    }

    output
}
