use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Preflight,
    Combine,
    Enrich,
    Reorder,
    Merge,
    Compare,
    Order,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Preflight => "preflight",
            Stage::Combine => "combine",
            Stage::Enrich => "enrich",
            Stage::Reorder => "reorder",
            Stage::Merge => "merge",
            Stage::Compare => "compare",
            Stage::Order => "order",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum StitchError {
    #[error("{stage}: {} does not exist", path.display())]
    MissingInput { stage: Stage, path: PathBuf },

    #[error("{stage}: {} exists but is not a directory", path.display())]
    NotADirectory { stage: Stage, path: PathBuf },

    #[error("{stage}: no CSV files found in {}", path.display())]
    EmptyInput { stage: Stage, path: PathBuf },

    #[error(
        "{stage}: header of {} does not match {}: expected [{expected}], found [{found}]",
        path.display(),
        reference.display()
    )]
    SchemaMismatch {
        stage: Stage,
        path: PathBuf,
        reference: PathBuf,
        expected: String,
        found: String,
    },

    #[error(
        "{stage}: column '{column}' not found in {}; available columns: {available}",
        path.display()
    )]
    MissingKey {
        stage: Stage,
        path: PathBuf,
        column: String,
        available: String,
    },

    #[error("{stage}: CSV error in {}: {source}", path.display())]
    Csv {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{stage}: I/O error on {}: {source}", path.display())]
    Io {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage}: invalid file pattern for {}: {source}", path.display())]
    Pattern {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: glob::PatternError,
    },

    #[error("invalid person name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("failed to load config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl StitchError {
    pub fn stage(&self) -> Option<Stage> {
        match self {
            StitchError::MissingInput { stage, .. }
            | StitchError::NotADirectory { stage, .. }
            | StitchError::EmptyInput { stage, .. }
            | StitchError::SchemaMismatch { stage, .. }
            | StitchError::MissingKey { stage, .. }
            | StitchError::Csv { stage, .. }
            | StitchError::Io { stage, .. }
            | StitchError::Pattern { stage, .. } => Some(*stage),
            StitchError::InvalidName { .. } | StitchError::Config { .. } => None,
        }
    }

    pub(crate) fn csv(stage: Stage, path: impl Into<PathBuf>, source: csv::Error) -> Self {
        StitchError::Csv {
            stage,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn io(stage: Stage, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StitchError::Io {
            stage,
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, StitchError>;
