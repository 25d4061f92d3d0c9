//! Regex patterns for PGFN / Receita Federal debt statements.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Balance labels, most specific first. The amount may sit after any run
    // of characters, line breaks included.
    pub static ref BALANCE_WITH_INTEREST: Regex = Regex::new(
        r"(?is)Saldo\s+Devedor\s+com\s+Juros.*?(?:R\$)?\s*([\d.]+,\d{2})"
    ).unwrap();

    pub static ref TOTAL_CONSOLIDATED: Regex = Regex::new(
        r"(?is)Valor\s+total\s+consolidado.*?(?:R\$)?\s*([\d.]+,\d{2})"
    ).unwrap();

    pub static ref GRAND_TOTAL: Regex = Regex::new(
        r"(?is)\bTotal\s+Geral.*?(?:R\$)?\s*([\d.]+,\d{2})"
    ).unwrap();

    pub static ref TABLE_TOTAL: Regex = Regex::new(
        r"(?is)\bTotal:.*?(?:R\$)?\s*([\d.]+,\d{2})"
    ).unwrap();

    pub static ref GENERIC_BALANCE: Regex = Regex::new(
        r"(?is)(?:Saldo\s+Devedor|Valor\s+Consolidado).*?(?:R\$)?\s*([\d.]+,\d{2})"
    ).unwrap();

    pub static ref BARE_TOTAL: Regex = Regex::new(
        r"(?is)\bTotal\b.*?(?:R\$)?\s*([\d.]+,\d{2})"
    ).unwrap();

    // Identifiers
    pub static ref NEGOTIATION_NUMBER: Regex = Regex::new(
        r"(?i)(?:Negocia[çc][ãa]o|Conta|Parcelamento)\s*(?:n[º°o]\.?|№)?[:\s№º°]*(\d+)"
    ).unwrap();

    /// Registration number: `NN N NN NNNNNN-NN`, spaces optional.
    pub static ref REGISTRATION_NUMBER: Regex = Regex::new(
        r"\b(\d{2})\s*(\d)\s*(\d{2})\s*(\d{6})\s*-\s*(\d{2})\b"
    ).unwrap();

    pub static ref SHORT_ACCOUNT: Regex = Regex::new(
        r"(?i)(?:Conta|Parcelamento)[:\s№º°]*(\d+)"
    ).unwrap();

    pub static ref YEAR_PREFIX: Regex = Regex::new(r"^(?:19|20)\d{2}").unwrap();

    // Modality
    pub static ref MODALITY_CAPTURE: Regex = Regex::new(
        r"(?is)(?:Modalidade|Tipo\s+de\s+Receita)\s*:\s*(.*?)(?:\b(?:Situa[çc][ãa]o|Data|Valor|N[úu]mero|Inscri[çc][ãa]o|Natureza|Receita|Quantidade)\b|\z)"
    ).unwrap();

    pub static ref MODALITY_STOP_WORD: Regex = Regex::new(
        r"(?i)\b(?:Situa[çc][ãa]o|Data|Valor|N[úu]mero|Inscri[çc][ãa]o|Natureza|Receita|Quantidade)\b"
    ).unwrap();

    pub static ref LEADING_DIGIT_RUN: Regex = Regex::new(r"^\d{8,}[\s\-–]*").unwrap();

    // Ledger report
    /// CNPJ, full (`12.345.678/0001-90`) or root only (`12.345.678`).
    pub static ref CNPJ_HEADER: Regex = Regex::new(
        r"(?i)CNPJ(?:\s+B[AÁ]SICO)?[:\s]*(\d{2}\.?\d{3}\.?\d{3}(?:/?\d{4}-?\d{2})?)(.*)$"
    ).unwrap();

    pub static ref LINKED_TO: Regex = Regex::new(r"(?i)vinculad[oa]s?").unwrap();

    pub static ref PAGE_FOOTER: Regex = Regex::new(
        r"(?i)^(?:P[áa]gina\b|MINIST[ÉE]RIO\s+DA\s+(?:FAZENDA|ECONOMIA)|SECRETARIA\s+ESPECIAL|RECEITA\s+FEDERAL|PROCURADORIA-?GERAL|INFORMA[ÇC][ÕO]ES\s+DE\s+APOIO|EMITIDO\s+EM|DATA\s*:|HORA\s*:)"
    ).unwrap();

    pub static ref FISCAL_BLOCK_START: Regex = Regex::new(
        r"(?i)(?:PEND[ÊE]NCIA\s*-\s*PROCESSO\s+FISCAL|PROCESSOS?\s+FISCA(?:L|IS)\s+EM\s+COBRAN[ÇC]A)"
    ).unwrap();

    pub static ref SECTION_HEADER: Regex = Regex::new(
        r"(?i)^(?:PEND[ÊE]NCIA\s*-|D[ÉE]BITOS?\s+COM\s+EXIGIBILIDADE|PROCESSOS?\s+FISCA(?:L|IS)\s+COM\s+EXIGIBILIDADE|PARCELAMENTOS?\s+COM\s+EXIGIBILIDADE|INSCRI[ÇC](?:[ÃA]O|[ÕO]ES)\s+COM\s+EXIGIBILIDADE|DIAGN[ÓO]STICO\s+FISCAL|FINAL\s+DO\s+RELAT[ÓO]RIO)"
    ).unwrap();

    /// Administrative process number, e.g. `10880.720.123/2023-45`.
    pub static ref PROCESS_NUMBER: Regex = Regex::new(
        r"\b\d{4,6}\.\d{3}\.\d{3}/\d{4}-\d{2}\b"
    ).unwrap();

    /// Looser shape used by the fallback scan; also matches formatted CNPJs,
    /// which are rejected by digit count.
    pub static ref PROCESS_LIKE: Regex = Regex::new(
        r"\b\d{2,6}\.\d{3}\.\d{3}/\d{4}-\d{2}\b"
    ).unwrap();

    pub static ref DEBTOR_STATUS: Regex = Regex::new(r"\bDEVEDOR\b").unwrap();

    pub static ref DEBTOR_DASH: Regex = Regex::new(r"DEVEDOR\s*-").unwrap();

    pub static ref PENALTY_CODE: Regex = Regex::new(r"\bMAED\b").unwrap();

    pub static ref OMISSION_MARKER: Regex = Regex::new(r"(?i)OMISS[ÃA]O").unwrap();

    pub static ref PERIOD_HINT: Regex = Regex::new(
        r"(?i)\b(?:(?:19|20)\d{2}|JAN|FEV|MAR|ABR|MAI|JUN|JUL|AGO|SET|OUT|NOV|DEZ)\b"
    ).unwrap();
}

/// Status words of non-debtor situations around a process number.
pub const NON_DEBTOR_TERMS: &[&str] = &[
    "AJUIZAD",
    "JUDICIAL",
    "NEGOCIAD",
    "SUSPENS",
    "JULGAD",
    "JULGAMENTO",
    "MANIFESTA",
    "IMPUGNA",
    "CREDITAD",
    "SISPAR",
];

/// Column headers repeated at the top of fiscal-process listings.
pub const PROCESS_COLUMN_HEADERS: &[&str] = &[
    "PROCESSO",
    "SITUAÇÃO",
    "SITUACAO",
    "LOCALIZAÇÃO",
    "LOCALIZACAO",
];
