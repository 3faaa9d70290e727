use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::{presets::UTF8_FULL, Table};
use stitcher_core::{pipeline, PipelineConfig, PipelineReport};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Stitch a person's transcription CSVs, add durations and match the metadata order
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Person's name; reads `{name}_files/` and writes `{name}_generated_files/`
    name: String,
    /// Metadata CSV holding the join key and duration columns
    #[arg(short, long)]
    metadata: Option<PathBuf>,
    /// TOML config file (defaults to ./stitcher.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Column used to match transcriptions against the metadata
    #[arg(long)]
    key_column: Option<String>,
    /// Metadata column copied onto each transcription row
    #[arg(long)]
    duration_column: Option<String>,
    /// Concatenate input files in directory order instead of by file name
    #[arg(long)]
    no_sort: bool,
    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    init_tracing(cli.json_logs);

    let config = resolve_config(&cli)?;
    let report = pipeline::run(&cli.name, &config)
        .with_context(|| format!("failed to process transcriptions for {}", cli.name))?;

    print_summary(&report);
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn resolve_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = PipelineConfig::discover(cli.config.as_deref(), Path::new("."))
        .context("could not load configuration")?
        .with_env(|name| env::var(name).ok());

    if let Some(metadata) = &cli.metadata {
        config.metadata = metadata.clone();
    }
    if let Some(column) = &cli.key_column {
        config.key_column = column.clone();
    }
    if let Some(column) = &cli.duration_column {
        config.duration_column = column.clone();
    }
    if cli.no_sort {
        config.sort_inputs = false;
    }
    Ok(config)
}

fn print_summary(report: &PipelineReport) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Step", "Output", "Rows", "blake3"]);
    let steps = ["combine", "enrich", "reorder"];
    for (step, output) in steps.iter().zip(report.outputs()) {
        table.add_row(vec![
            step.to_string(),
            output.path.display().to_string(),
            output.rows.to_string(),
            output.digest[..16].to_string(),
        ]);
    }
    println!("{table}");

    if !report.enrich.unmatched.is_empty() {
        warn!(
            rows = report.enrich.unmatched.len(),
            "Rows without a metadata duration were left blank"
        );
    }
    if !report.reorder.excluded.is_empty() {
        warn!(
            rows = report.reorder.excluded.len(),
            "Rows not listed in the metadata were left out of the final file"
        );
    }
    info!(
        output = %report.layout.output_dir.display(),
        "All files saved"
    );
}
