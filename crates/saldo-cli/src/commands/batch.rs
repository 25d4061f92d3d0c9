//! Batch processing command for multiple statements.

use std::fs::{self, File};
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use saldo_core::{format_brl, BatchReport, DocumentSource, FileSource};

use super::output::{self, JsonReport};
use super::{build_processor, load_config, EngineArgs};

const SUMMARY_FILE: &str = "saldos.csv";
const LEDGER_FILE: &str = "relatorio_fiscal.csv";
const JSON_FILE: &str = "resultado.json";

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern of input PDFs (e.g. "extratos/*.pdf")
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Also write every record as JSON
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    engine: EngineArgs,
}

pub fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    fs::create_dir_all(&args.output_dir)?;

    let processor = build_processor(config, &args.engine);

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    // Sequential: the name cache and OCR engine are single-threaded.
    let mut report = BatchReport::new();
    for path in &files {
        let source = FileSource::new(path);
        pb.set_message(source.name().to_string());
        report.push(processor.process(&source));
        pb.inc(1);
    }

    pb.finish_and_clear();

    let summary_path = args.output_dir.join(SUMMARY_FILE);
    output::write_summaries(File::create(&summary_path)?, &report.summaries)?;
    debug!("Wrote {} summaries to {}", report.summaries.len(), summary_path.display());

    if !report.ledger_rows.is_empty() {
        let ledger_path = args.output_dir.join(LEDGER_FILE);
        output::write_ledger(File::create(&ledger_path)?, &report.ledger_rows)?;
        println!(
            "{} {} fiscal report rows written to {}",
            style("✓").green(),
            report.ledger_rows.len(),
            ledger_path.display()
        );
    }

    if args.json {
        let json_path = args.output_dir.join(JSON_FILE);
        let json = JsonReport::new(&report.summaries, &report.ledger_rows);
        fs::write(&json_path, serde_json::to_string_pretty(&json)?)?;
        debug!("Wrote JSON report to {}", json_path.display());
    }

    let failed: Vec<_> = report.summaries.iter().filter(|s| s.is_error()).collect();

    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        files.len(),
        start.elapsed()
    );
    println!(
        "   {} summaries written to {}",
        report.summaries.len(),
        summary_path.display()
    );
    println!(
        "   Total dos saldos: {}",
        style(format!("R$ {}", format_brl(report.total_balance()))).bold()
    );

    if !failed.is_empty() {
        println!();
        println!("{} {} files could not be read:", style("✗").red(), failed.len());
        for summary in &failed {
            println!("  - {}: {}", summary.filename, summary.identifier);
        }
    }

    Ok(())
}
