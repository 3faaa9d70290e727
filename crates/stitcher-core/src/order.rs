use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::errors::{Result, Stage};
use crate::table::{field, write_table, OutputSummary, Table};

pub const DEFAULT_ORDER_SUFFIX: &str = "_ordered";

#[derive(Debug, Clone)]
pub struct OrderedFile {
    pub output: OutputSummary,
    /// Sort column values in written order.
    pub keys: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct OrderPairReport {
    pub left: OrderedFile,
    pub right: OrderedFile,
    pub only_in_left: usize,
    pub only_in_right: usize,
}

impl OrderPairReport {
    /// Both files now list exactly the same keys in the same order.
    pub fn keys_match(&self) -> bool {
        self.left.keys == self.right.keys
    }
}

/// `dir/name.csv` becomes `dir/name<suffix>.csv`.
pub fn ordered_path(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match path.extension() {
        Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    };
    path.with_file_name(file_name)
}

/// Stable sort of the rows of `path` by `column`, written beside the input.
pub fn order_by_column(path: &Path, column: &str, suffix: &str) -> Result<OrderedFile> {
    let stage = Stage::Order;
    let table = Table::read(stage, path)?;
    let idx = table.column_index(stage, column)?;

    let mut rows: Vec<_> = table.rows.iter().collect();
    rows.sort_by(|a, b| field(a, idx).cmp(&field(b, idx)));
    let keys = rows.iter().map(|row| field(row, idx).to_string()).collect();

    let output = write_table(stage, &ordered_path(path, suffix), &table.headers, rows)?;
    info!(rows = output.rows, path = %output.path.display(), "Wrote ordered file");

    Ok(OrderedFile { output, keys })
}

pub fn order_pair(left: &Path, right: &Path, column: &str, suffix: &str) -> Result<OrderPairReport> {
    let left = order_by_column(left, column, suffix)?;
    let right = order_by_column(right, column, suffix)?;

    let left_keys: BTreeSet<&str> = left.keys.iter().map(String::as_str).collect();
    let right_keys: BTreeSet<&str> = right.keys.iter().map(String::as_str).collect();
    let only_in_left = left_keys.difference(&right_keys).count();
    let only_in_right = right_keys.difference(&left_keys).count();

    let report = OrderPairReport {
        left,
        right,
        only_in_left,
        only_in_right,
    };
    if !report.keys_match() {
        warn!(
            column,
            only_in_left, only_in_right, "Ordered files list different keys"
        );
    }
    Ok(report)
}
