//! Process command - extract data from a single statement.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use saldo_core::{DocumentOutcome, FileSource};

use super::output::{self, JsonReport};
use super::{build_processor, load_config, EngineArgs};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output (`;` separated)
    Csv,
    /// Plain text summary
    Text,
}

pub fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Loading models...");

    let processor = build_processor(config, &args.engine);

    pb.set_message("Reading statement...");
    let outcome = processor.process(&FileSource::new(&args.input));
    pb.finish_and_clear();

    if outcome.is_error() {
        eprintln!(
            "{} {}",
            style("✗").red(),
            outcome.summary().identifier
        );
    }

    let rendered = format_outcome(&outcome, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &rendered)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", rendered);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn format_outcome(outcome: &DocumentOutcome, format: OutputFormat) -> anyhow::Result<String> {
    let summaries = std::slice::from_ref(outcome.summary());
    let rows = outcome.rows();

    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&JsonReport::new(summaries, rows))?),
        OutputFormat::Csv => {
            let mut buffer = Vec::new();
            if rows.is_empty() {
                output::write_summaries(&mut buffer, summaries)?;
            } else {
                output::write_ledger(&mut buffer, rows)?;
            }
            Ok(String::from_utf8(buffer)?)
        }
        OutputFormat::Text => {
            let mut text = output::summary_text(outcome.summary());
            if !rows.is_empty() {
                text.push_str(&format!("\n{} itens do relatório fiscal:\n", rows.len()));
                text.push_str(&output::ledger_text(rows));
            }
            Ok(text)
        }
    }
}
