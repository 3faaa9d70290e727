use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use tracing::info;

use crate::errors::{Result, Stage};
use crate::table::Table;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCounts {
    pub total: usize,
    pub unique: usize,
    /// Keys seen more than once, with their occurrence count.
    pub duplicates: Vec<(String, usize)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyComparison {
    pub left: KeyCounts,
    pub right: KeyCounts,
    pub common: usize,
    pub only_in_left: Vec<String>,
    pub only_in_right: Vec<String>,
}

impl KeyComparison {
    pub fn same_keys(&self) -> bool {
        self.only_in_left.is_empty() && self.only_in_right.is_empty()
    }
}

fn count_keys<'a>(keys: &[&'a str]) -> (BTreeMap<&'a str, usize>, KeyCounts) {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for key in keys {
        *counts.entry(*key).or_default() += 1;
    }
    let duplicates = counts
        .iter()
        .filter(|(_, count)| **count > 1)
        .map(|(key, count)| (key.to_string(), *count))
        .collect();
    let summary = KeyCounts {
        total: keys.len(),
        unique: counts.len(),
        duplicates,
    };
    (counts, summary)
}

pub fn compare_keys(left_path: &Path, right_path: &Path, column: &str) -> Result<KeyComparison> {
    let stage = Stage::Compare;
    let left = Table::read(stage, left_path)?;
    let right = Table::read(stage, right_path)?;

    let (left_counts, left_summary) = count_keys(&left.column_values(stage, column)?);
    let (right_counts, right_summary) = count_keys(&right.column_values(stage, column)?);

    let left_set: BTreeSet<&str> = left_counts.keys().copied().collect();
    let right_set: BTreeSet<&str> = right_counts.keys().copied().collect();

    let comparison = KeyComparison {
        left: left_summary,
        right: right_summary,
        common: left_set.intersection(&right_set).count(),
        only_in_left: left_set
            .difference(&right_set)
            .map(|key| key.to_string())
            .collect(),
        only_in_right: right_set
            .difference(&left_set)
            .map(|key| key.to_string())
            .collect(),
    };

    info!(
        left = %left_path.display(),
        right = %right_path.display(),
        common = comparison.common,
        only_in_left = comparison.only_in_left.len(),
        only_in_right = comparison.only_in_right.len(),
        "Compared keys"
    );
    Ok(comparison)
}
