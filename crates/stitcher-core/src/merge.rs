use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use tracing::{info, warn};

use crate::combine::{concatenate, discover_csv_files, CombineReport};
use crate::errors::{Result, Stage, StitchError};

const NAME_MATCH: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
pub struct MergeReport {
    /// `(name pattern, file)` pairs in merge order.
    pub matched: Vec<(String, PathBuf)>,
    pub missing_patterns: Vec<String>,
    pub combined: CombineReport,
}

/// First file (in file-name order) whose name contains `name`, ignoring case.
pub fn find_file_by_name<'a>(files: &'a [PathBuf], name: &str) -> Result<Option<&'a PathBuf>> {
    let pattern = Pattern::new(&format!("*{}*", Pattern::escape(name))).map_err(|source| {
        StitchError::Pattern {
            stage: Stage::Merge,
            path: PathBuf::from(name),
            source,
        }
    })?;

    Ok(files.iter().find(|path| {
        path.file_name()
            .and_then(|file_name| file_name.to_str())
            .is_some_and(|file_name| pattern.matches_with(file_name, NAME_MATCH))
    }))
}

/// Concatenates one CSV file per name, in the order the names are given.
pub fn merge_in_name_order(
    input_dir: &Path,
    output: &Path,
    names: &[String],
) -> Result<MergeReport> {
    let stage = Stage::Merge;
    let mut files = discover_csv_files(stage, input_dir)?;
    files.sort();

    let mut matched = Vec::new();
    let mut missing_patterns = Vec::new();
    for name in names {
        match find_file_by_name(&files, name)? {
            Some(path) => {
                info!(name = %name, path = %path.display(), "Found file");
                matched.push((name.clone(), path.clone()));
            }
            None => {
                warn!(name = %name, "No file found containing name");
                missing_patterns.push(name.clone());
            }
        }
    }

    if matched.is_empty() {
        return Err(StitchError::EmptyInput {
            stage,
            path: input_dir.to_path_buf(),
        });
    }

    let ordered: Vec<PathBuf> = matched.iter().map(|(_, path)| path.clone()).collect();
    let combined = concatenate(stage, input_dir, &ordered, output)?;

    Ok(MergeReport {
        matched,
        missing_patterns,
        combined,
    })
}
