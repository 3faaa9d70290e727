use std::fs;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use tracing::{debug, info, warn};

use crate::errors::{Result, Stage, StitchError};
use crate::table::{describe_record, open_reader, OutputSummary, OutputWriter};

#[derive(Debug, Clone, Copy)]
pub struct CombineOptions {
    /// Concatenate files in file-name order instead of directory order.
    pub sort: bool,
}

impl Default for CombineOptions {
    fn default() -> Self {
        Self { sort: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFileSummary {
    pub path: PathBuf,
    pub rows: usize,
}

#[derive(Debug, Clone)]
pub struct CombineReport {
    pub headers: StringRecord,
    pub inputs: Vec<InputFileSummary>,
    /// Files with no header line at all.
    pub skipped: Vec<PathBuf>,
    pub output: OutputSummary,
}

/// Lists the `.csv` files directly inside `dir`, in directory order.
pub fn discover_csv_files(stage: Stage, dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(StitchError::MissingInput {
            stage,
            path: dir.to_path_buf(),
        });
    }
    if !dir.is_dir() {
        return Err(StitchError::NotADirectory {
            stage,
            path: dir.to_path_buf(),
        });
    }

    let entries = fs::read_dir(dir).map_err(|err| StitchError::io(stage, dir, err))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|err| StitchError::io(stage, dir, err))?.path();
        if path.is_file() && has_csv_extension(&path) {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(StitchError::EmptyInput {
            stage,
            path: dir.to_path_buf(),
        });
    }
    Ok(files)
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

pub fn combine_folder(
    input_dir: &Path,
    output: &Path,
    options: CombineOptions,
) -> Result<CombineReport> {
    let mut files = discover_csv_files(Stage::Combine, input_dir)?;
    if options.sort {
        files.sort();
    }
    info!(
        dir = %input_dir.display(),
        files = files.len(),
        "Stitching CSV files"
    );
    concatenate(Stage::Combine, input_dir, &files, output)
}

/// Streams `files` into `output` in the given order. The first file with a
/// header fixes the schema; any later header that differs is rejected.
pub(crate) fn concatenate(
    stage: Stage,
    input_dir: &Path,
    files: &[PathBuf],
    output: &Path,
) -> Result<CombineReport> {
    let mut writer: Option<(OutputWriter, StringRecord, &Path)> = None;
    let mut inputs = Vec::with_capacity(files.len());
    let mut skipped = Vec::new();

    for path in files {
        let mut reader = open_reader(stage, path)?;
        let headers = reader
            .headers()
            .map_err(|err| StitchError::csv(stage, path, err))?
            .clone();

        if headers.is_empty() {
            warn!(path = %path.display(), "Skipping empty file");
            skipped.push(path.clone());
            continue;
        }

        let state = match writer.take() {
            Some(state) => state,
            None => (
                OutputWriter::create(stage, output, &headers)?,
                headers.clone(),
                path.as_path(),
            ),
        };
        let (out, expected, reference) = writer.insert(state);

        if headers != *expected {
            return Err(StitchError::SchemaMismatch {
                stage,
                path: path.clone(),
                reference: reference.to_path_buf(),
                expected: describe_record(expected),
                found: describe_record(&headers),
            });
        }

        let mut rows = 0;
        for record in reader.records() {
            let record = record.map_err(|err| StitchError::csv(stage, path, err))?;
            out.write_row(&record)?;
            rows += 1;
        }
        debug!(path = %path.display(), rows, "Appended file");
        inputs.push(InputFileSummary {
            path: path.clone(),
            rows,
        });
    }

    let Some((out, headers, _)) = writer else {
        return Err(StitchError::EmptyInput {
            stage,
            path: input_dir.to_path_buf(),
        });
    };
    let output = out.finish()?;

    info!(
        files = inputs.len(),
        skipped = skipped.len(),
        rows = output.rows,
        path = %output.path.display(),
        "Combined files"
    );

    Ok(CombineReport {
        headers,
        inputs,
        skipped,
        output,
    })
}
