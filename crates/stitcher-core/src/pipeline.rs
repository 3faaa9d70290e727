use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::combine::{combine_folder, discover_csv_files, CombineOptions, CombineReport};
use crate::config::PipelineConfig;
use crate::enrich::{add_durations, EnrichReport};
use crate::errors::{Result, Stage, StitchError};
use crate::reorder::{reorder_to_match, ReorderReport};
use crate::table::OutputSummary;

pub const INPUT_DIR_SUFFIX: &str = "_files";
pub const OUTPUT_DIR_SUFFIX: &str = "_generated_files";
pub const COMBINED_FILE: &str = "combined_transcriptions.csv";
pub const WITH_DURATION_FILE: &str = "combined_transcriptions_duration.csv";

/// Every path the pipeline touches for one person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonLayout {
    pub name: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub metadata: PathBuf,
    pub combined: PathBuf,
    pub with_duration: PathBuf,
    pub final_output: PathBuf,
}

impl PersonLayout {
    pub fn new(name: &str, config: &PipelineConfig) -> Result<Self> {
        validate_name(name)?;
        let input_dir = config.base_dir.join(format!("{name}{INPUT_DIR_SUFFIX}"));
        let output_dir = config.base_dir.join(format!("{name}{OUTPUT_DIR_SUFFIX}"));
        Ok(Self {
            name: name.to_string(),
            metadata: config.metadata_path(),
            combined: output_dir.join(COMBINED_FILE),
            with_duration: output_dir.join(WITH_DURATION_FILE),
            final_output: output_dir.join(format!("{name}_final.csv")),
            input_dir,
            output_dir,
        })
    }
}

fn validate_name(name: &str) -> Result<()> {
    let reason = if name.trim().is_empty() {
        "name is empty"
    } else if name.contains(['/', '\\']) {
        "name contains a path separator"
    } else if name == "." || name == ".." {
        "name is a relative directory"
    } else {
        return Ok(());
    };
    Err(StitchError::InvalidName {
        name: name.to_string(),
        reason,
    })
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub layout: PersonLayout,
    pub combine: CombineReport,
    pub enrich: EnrichReport,
    pub reorder: ReorderReport,
}

impl PipelineReport {
    pub fn outputs(&self) -> [&OutputSummary; 3] {
        [
            &self.combine.output,
            &self.enrich.output,
            &self.reorder.output,
        ]
    }
}

/// Checks inputs before any stage runs and makes sure the output folder
/// exists. Returns the number of CSV files found.
pub fn preflight(layout: &PersonLayout) -> Result<usize> {
    let stage = Stage::Preflight;
    let files = discover_csv_files(stage, &layout.input_dir)?;
    if !layout.metadata.is_file() {
        return Err(StitchError::MissingInput {
            stage,
            path: layout.metadata.clone(),
        });
    }
    fs::create_dir_all(&layout.output_dir)
        .map_err(|err| StitchError::io(stage, &layout.output_dir, err))?;
    Ok(files.len())
}

pub fn run(name: &str, config: &PipelineConfig) -> Result<PipelineReport> {
    let layout = PersonLayout::new(name, config)?;
    run_layout(layout, config)
}

pub fn run_layout(layout: PersonLayout, config: &PipelineConfig) -> Result<PipelineReport> {
    info!(
        name = %layout.name,
        input = %layout.input_dir.display(),
        output = %layout.output_dir.display(),
        metadata = %layout.metadata.display(),
        "Processing transcriptions"
    );

    let files = preflight(&layout)?;
    info!(files, "Found CSV files to process");

    let combine = combine_folder(
        &layout.input_dir,
        &layout.combined,
        CombineOptions {
            sort: config.sort_inputs,
        },
    )?;

    let enrich = add_durations(
        &layout.combined,
        &layout.metadata,
        &config.join_columns(),
        &layout.with_duration,
    )?;

    let reorder = reorder_to_match(
        &layout.with_duration,
        &layout.metadata,
        &config.key_column,
        &layout.final_output,
    )?;

    info!(name = %layout.name, path = %reorder.output.path.display(), "Processing complete");

    Ok(PipelineReport {
        layout,
        combine,
        enrich,
        reorder,
    })
}
