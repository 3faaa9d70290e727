use std::collections::HashMap;
use std::path::Path;

use csv::StringRecord;
use tracing::{info, warn};

use crate::errors::{Result, Stage};
use crate::table::{field, write_table, OutputSummary, Table};

pub const DEFAULT_KEY_COLUMN: &str = "Filename";
pub const DEFAULT_DURATION_COLUMN: &str = "duration_sec";

/// Column names used to join transcription rows against the metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinColumns {
    pub key: String,
    pub duration: String,
}

impl Default for JoinColumns {
    fn default() -> Self {
        Self {
            key: DEFAULT_KEY_COLUMN.to_string(),
            duration: DEFAULT_DURATION_COLUMN.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnrichReport {
    pub rows: usize,
    pub matched: usize,
    /// Keys of combined rows that received a blank duration, in row order.
    pub unmatched: Vec<String>,
    pub duplicate_metadata_keys: usize,
    pub output: OutputSummary,
}

#[derive(Debug, Default)]
pub struct DurationLookup {
    durations: HashMap<String, String>,
    duplicates: usize,
}

impl DurationLookup {
    /// Last occurrence of a key wins.
    pub fn from_metadata(stage: Stage, metadata: &Table, columns: &JoinColumns) -> Result<Self> {
        let key_idx = metadata.column_index(stage, &columns.key)?;
        let duration_idx = metadata.column_index(stage, &columns.duration)?;

        let mut lookup = Self {
            durations: HashMap::with_capacity(metadata.len()),
            duplicates: 0,
        };
        for row in &metadata.rows {
            let previous = lookup.durations.insert(
                field(row, key_idx).to_string(),
                field(row, duration_idx).to_string(),
            );
            if previous.is_some() {
                lookup.duplicates += 1;
            }
        }
        Ok(lookup)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.durations.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

/// Appends the metadata duration to every combined row. Rows whose key has
/// no metadata entry keep their position with an empty duration.
pub fn add_durations(
    combined_path: &Path,
    metadata_path: &Path,
    columns: &JoinColumns,
    output: &Path,
) -> Result<EnrichReport> {
    let stage = Stage::Enrich;

    let metadata = Table::read(stage, metadata_path)?;
    let lookup = DurationLookup::from_metadata(stage, &metadata, columns)?;
    info!(
        path = %metadata_path.display(),
        entries = lookup.len(),
        "Loaded duration entries"
    );
    if lookup.duplicates() > 0 {
        warn!(
            duplicates = lookup.duplicates(),
            "Metadata repeats join keys; keeping the last duration for each"
        );
    }

    let combined = Table::read(stage, combined_path)?;
    let key_idx = combined.column_index(stage, &columns.key)?;
    let existing_duration = combined
        .headers
        .iter()
        .position(|name| name == columns.duration);

    let headers = match existing_duration {
        Some(_) => combined.headers.clone(),
        None => {
            let mut headers = combined.headers.clone();
            headers.push_field(&columns.duration);
            headers
        }
    };

    let mut matched = 0;
    let mut unmatched = Vec::new();
    let mut rows = Vec::with_capacity(combined.len());
    for row in &combined.rows {
        let key = field(row, key_idx);
        let duration = match lookup.get(key) {
            Some(duration) => {
                matched += 1;
                duration
            }
            None => {
                warn!(key, "No duration found");
                unmatched.push(key.to_string());
                ""
            }
        };
        rows.push(with_duration(row, existing_duration, duration));
    }

    let output = write_table(stage, output, &headers, &rows)?;
    info!(
        rows = rows.len(),
        matched,
        unmatched = unmatched.len(),
        path = %output.path.display(),
        "Added durations"
    );

    Ok(EnrichReport {
        rows: rows.len(),
        matched,
        unmatched,
        duplicate_metadata_keys: lookup.duplicates(),
        output,
    })
}

fn with_duration(row: &StringRecord, existing: Option<usize>, duration: &str) -> StringRecord {
    match existing {
        Some(idx) => row
            .iter()
            .enumerate()
            .map(|(i, value)| if i == idx { duration } else { value })
            .collect(),
        None => {
            let mut row = row.clone();
            row.push_field(duration);
            row
        }
    }
}
