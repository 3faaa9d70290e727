use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::{info, warn};

use crate::errors::{Result, Stage};
use crate::table::{field, write_table, OutputSummary, Table};

#[derive(Debug, Clone)]
pub struct ReorderReport {
    pub reference_rows: usize,
    pub written: usize,
    /// Reference keys with no matching row, in reference order.
    pub missing: Vec<String>,
    /// Keys present in the reordered file but not in the reference, sorted.
    pub excluded: Vec<String>,
    /// Rows dropped because a later row carried the same key.
    pub duplicate_rows: usize,
    pub output: OutputSummary,
}

/// Rewrites `input` so its rows follow the row order of `reference`.
///
/// The result is a filter and permutation of the input rows: each key appears
/// at most once, at the position of the first reference row sharing it, and
/// a repeated key keeps its last row. Input rows whose key never appears in
/// the reference are left out.
pub fn reorder_to_match(
    input_path: &Path,
    reference_path: &Path,
    key_column: &str,
    output: &Path,
) -> Result<ReorderReport> {
    let stage = Stage::Reorder;

    let reference = Table::read(stage, reference_path)?;
    let reference_keys = reference.column_values(stage, key_column)?;
    info!(
        path = %reference_path.display(),
        rows = reference_keys.len(),
        "Read reference order"
    );

    let input = Table::read(stage, input_path)?;
    let key_idx = input.column_index(stage, key_column)?;

    let mut by_key: HashMap<&str, usize> = HashMap::with_capacity(input.len());
    for (idx, row) in input.rows.iter().enumerate() {
        by_key.insert(field(row, key_idx), idx);
    }
    let duplicate_rows = input.len() - by_key.len();
    if duplicate_rows > 0 {
        warn!(
            duplicate_rows,
            path = %input_path.display(),
            "Dropping earlier rows with repeated keys"
        );
    }

    let mut emitted = vec![false; input.len()];
    let mut ordered = Vec::with_capacity(input.len());
    let mut missing = Vec::new();
    for key in &reference_keys {
        match by_key.get(key) {
            Some(&idx) => {
                if !emitted[idx] {
                    emitted[idx] = true;
                    ordered.push(&input.rows[idx]);
                }
            }
            None => {
                warn!(key = *key, "Present in reference but not in file to reorder");
                missing.push(key.to_string());
            }
        }
    }

    let reference_set: HashSet<&str> = reference_keys.iter().copied().collect();
    let mut excluded: Vec<String> = by_key
        .keys()
        .filter(|key| !reference_set.contains(*key))
        .map(|key| key.to_string())
        .collect();
    excluded.sort();
    if !excluded.is_empty() {
        warn!(
            excluded = excluded.len(),
            first = %excluded.iter().take(5).cloned().collect::<Vec<_>>().join(", "),
            "Rows not in reference are left out"
        );
    }

    let output = write_table(stage, output, &input.headers, ordered.iter().copied())?;
    info!(
        written = output.rows,
        missing = missing.len(),
        excluded = excluded.len(),
        path = %output.path.display(),
        "Reordered to match reference"
    );

    Ok(ReorderReport {
        reference_rows: reference_keys.len(),
        written: output.rows,
        missing,
        excluded,
        duplicate_rows,
        output,
    })
}
