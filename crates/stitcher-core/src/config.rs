use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::enrich::{JoinColumns, DEFAULT_DURATION_COLUMN, DEFAULT_KEY_COLUMN};
use crate::errors::{Result, StitchError};

pub const DEFAULT_CONFIG_FILE: &str = "stitcher.toml";
pub const DEFAULT_METADATA_FILE: &str = "metadata_copy.csv";

pub const ENV_METADATA: &str = "STITCHER_METADATA";
pub const ENV_KEY_COLUMN: &str = "STITCHER_KEY_COLUMN";
pub const ENV_DURATION_COLUMN: &str = "STITCHER_DURATION_COLUMN";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Directory holding `{name}_files/`, the metadata file and the output folder.
    pub base_dir: PathBuf,
    /// Metadata file, relative to `base_dir` unless absolute.
    pub metadata: PathBuf,
    pub key_column: String,
    pub duration_column: String,
    pub sort_inputs: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            metadata: PathBuf::from(DEFAULT_METADATA_FILE),
            key_column: DEFAULT_KEY_COLUMN.to_string(),
            duration_column: DEFAULT_DURATION_COLUMN.to_string(),
            sort_inputs: true,
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(raw: &str, origin: &Path) -> Result<Self> {
        toml::from_str(raw).map_err(|err| StitchError::Config {
            path: origin.to_path_buf(),
            message: err.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|err| StitchError::Config {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::from_toml_str(&raw, path)
    }

    /// Loads `explicit` when given, otherwise `stitcher.toml` inside `dir`
    /// if it exists, otherwise the defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Overrides fields from `STITCHER_*` variables as returned by `lookup`.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(metadata) = lookup(ENV_METADATA).filter(|v| !v.trim().is_empty()) {
            self.metadata = PathBuf::from(metadata);
        }
        if let Some(column) = lookup(ENV_KEY_COLUMN).filter(|v| !v.trim().is_empty()) {
            self.key_column = column;
        }
        if let Some(column) = lookup(ENV_DURATION_COLUMN).filter(|v| !v.trim().is_empty()) {
            self.duration_column = column;
        }
        self
    }

    pub fn join_columns(&self) -> JoinColumns {
        JoinColumns {
            key: self.key_column.clone(),
            duration: self.duration_column.clone(),
        }
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.base_dir.join(&self.metadata)
    }
}
