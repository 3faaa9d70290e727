use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Table};
use stitcher_core::{
    add_durations, combine_folder, compare_keys, merge_in_name_order, order::DEFAULT_ORDER_SUFFIX,
    order_pair, reorder_to_match, CombineOptions, JoinColumns, KeyComparison, OutputSummary,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Individual transcription CSV stages and checks", long_about = None)]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stitch every CSV file in a folder into one file
    Combine(CombineArgs),
    /// Add the metadata duration column to a combined file
    Enrich(EnrichArgs),
    /// Reorder a file to follow the row order of a reference file
    Reorder(ReorderArgs),
    /// Merge one file per name, in the order the names are given
    Merge(MergeArgs),
    /// Compare the keys listed in two CSV files
    Compare(CompareArgs),
    /// Sort two CSV files by a shared column
    Order(OrderArgs),
}

#[derive(Args, Debug)]
struct CombineArgs {
    #[arg(short, long, default_value = "files")]
    input_folder: PathBuf,
    #[arg(short, long, default_value = "combined_transcriptions.csv")]
    output: PathBuf,
    /// Keep directory order instead of sorting by file name
    #[arg(long)]
    no_sort: bool,
}

#[derive(Args, Debug)]
struct EnrichArgs {
    #[arg(short, long, default_value = "metadata_copy.csv")]
    metadata: PathBuf,
    #[arg(short, long, default_value = "combined_transcriptions.csv")]
    transcriptions: PathBuf,
    #[arg(short, long, default_value = "combined_transcriptions_duration.csv")]
    output: PathBuf,
    #[arg(short = 'c', long, default_value = "Filename")]
    key_column: String,
    #[arg(short, long, default_value = "duration_sec")]
    duration_column: String,
}

#[derive(Args, Debug)]
struct ReorderArgs {
    /// File whose row order should be matched
    #[arg(short, long, default_value = "metadata_copy.csv")]
    reference: PathBuf,
    #[arg(short, long, default_value = "combined_transcriptions_duration.csv")]
    input: PathBuf,
    #[arg(short, long, default_value = "combined_transcriptions_duration_reordered.csv")]
    output: PathBuf,
    #[arg(short, long, default_value = "Filename")]
    column: String,
}

#[derive(Args, Debug)]
struct MergeArgs {
    #[arg(short, long, default_value = "reviewed_files")]
    input_folder: PathBuf,
    #[arg(short, long, default_value = "merged_output.csv")]
    output: PathBuf,
    /// Name fragments, matched case-insensitively against file names
    #[arg(short, long, num_args = 1.., required = true)]
    names: Vec<String>,
}

#[derive(Args, Debug)]
struct CompareArgs {
    left: PathBuf,
    right: PathBuf,
    #[arg(short, long, default_value = "Filename")]
    column: String,
}

#[derive(Args, Debug)]
struct OrderArgs {
    left: PathBuf,
    right: PathBuf,
    #[arg(short, long, default_value = "Filename")]
    column: String,
    #[arg(short, long, default_value = DEFAULT_ORDER_SUFFIX)]
    suffix: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match cli.command {
        Command::Combine(args) => handle_combine(args),
        Command::Enrich(args) => handle_enrich(args),
        Command::Reorder(args) => handle_reorder(args),
        Command::Merge(args) => handle_merge(args),
        Command::Compare(args) => handle_compare(args),
        Command::Order(args) => handle_order(args),
    }
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

fn handle_combine(args: CombineArgs) -> Result<()> {
    let report = combine_folder(
        &args.input_folder,
        &args.output,
        CombineOptions { sort: !args.no_sort },
    )
    .context("combine failed")?;
    print_outputs(&[&report.output]);
    Ok(())
}

fn handle_enrich(args: EnrichArgs) -> Result<()> {
    let columns = JoinColumns {
        key: args.key_column,
        duration: args.duration_column,
    };
    let report = add_durations(&args.transcriptions, &args.metadata, &columns, &args.output)
        .context("adding durations failed")?;
    info!(
        rows = report.rows,
        matched = report.matched,
        unmatched = report.unmatched.len(),
        "Enrichment summary"
    );
    print_outputs(&[&report.output]);
    Ok(())
}

fn handle_reorder(args: ReorderArgs) -> Result<()> {
    if args.input == args.output {
        warn!(path = %args.input.display(), "Overwriting the input file in place");
    }
    let report = reorder_to_match(&args.input, &args.reference, &args.column, &args.output)
        .context("reorder failed")?;
    info!(
        written = report.written,
        missing = report.missing.len(),
        excluded = report.excluded.len(),
        "Reorder summary"
    );
    print_outputs(&[&report.output]);
    Ok(())
}

fn handle_merge(args: MergeArgs) -> Result<()> {
    let report = merge_in_name_order(&args.input_folder, &args.output, &args.names)
        .context("merge failed")?;
    for (name, path) in &report.matched {
        println!("{name}: {}", path.display());
    }
    print_outputs(&[&report.combined.output]);
    Ok(())
}

fn handle_compare(args: CompareArgs) -> Result<()> {
    let comparison =
        compare_keys(&args.left, &args.right, &args.column).context("compare failed")?;
    print_comparison(&args.left, &args.right, &comparison);
    Ok(())
}

fn handle_order(args: OrderArgs) -> Result<()> {
    let report = order_pair(&args.left, &args.right, &args.column, &args.suffix)
        .context("order failed")?;
    print_outputs(&[&report.left.output, &report.right.output]);
    if report.keys_match() {
        println!("Both files list the same {} values in the same order", args.column);
    } else {
        println!(
            "{} values differ: {} only in {}, {} only in {}",
            args.column,
            report.only_in_left,
            args.left.display(),
            report.only_in_right,
            args.right.display()
        );
    }
    Ok(())
}

fn print_outputs(outputs: &[&OutputSummary]) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Output", "Rows", "blake3"]);
    for output in outputs {
        table.add_row(vec![
            output.path.display().to_string(),
            output.rows.to_string(),
            output.digest[..16].to_string(),
        ]);
    }
    println!("{table}");
}

fn print_comparison(left: &Path, right: &Path, cmp: &KeyComparison) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["", "Total", "Unique", "Duplicated"]);
    for (path, counts) in [(left, &cmp.left), (right, &cmp.right)] {
        table.add_row(vec![
            path.display().to_string(),
            counts.total.to_string(),
            counts.unique.to_string(),
            counts.duplicates.len().to_string(),
        ]);
    }
    println!("{table}");
    println!("Common keys: {}", cmp.common);

    for (path, keys) in [(left, &cmp.only_in_left), (right, &cmp.only_in_right)] {
        if !keys.is_empty() {
            println!("\nOnly in {} ({}):", path.display(), keys.len());
            for key in keys {
                println!("  - {key}");
            }
        }
    }

    if cmp.same_keys() {
        println!("\nBoth files list the same keys");
        for (path, counts) in [(left, &cmp.left), (right, &cmp.right)] {
            for (key, count) in &counts.duplicates {
                println!("  {} repeats {key} {count} times", path.display());
            }
        }
    }
}
