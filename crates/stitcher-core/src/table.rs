use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::errors::{Result, Stage, StitchError};

/// A fully loaded CSV file: its header and every data row.
#[derive(Debug, Clone)]
pub struct Table {
    pub source: PathBuf,
    pub headers: StringRecord,
    pub rows: Vec<StringRecord>,
}

impl Table {
    pub fn read(stage: Stage, path: &Path) -> Result<Self> {
        let mut reader = open_reader(stage, path)?;
        let headers = reader
            .headers()
            .map_err(|err| StitchError::csv(stage, path, err))?
            .clone();
        let rows = reader
            .records()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|err| StitchError::csv(stage, path, err))?;

        debug!(path = %path.display(), rows = rows.len(), "Loaded table");

        Ok(Self {
            source: path.to_path_buf(),
            headers,
            rows,
        })
    }

    pub fn column_index(&self, stage: Stage, column: &str) -> Result<usize> {
        column_index(stage, &self.source, &self.headers, column)
    }

    /// Values of one column in row order.
    pub fn column_values(&self, stage: Stage, column: &str) -> Result<Vec<&str>> {
        let idx = self.column_index(stage, column)?;
        Ok(self.rows.iter().map(|row| field(row, idx)).collect())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub(crate) fn open_reader(stage: Stage, path: &Path) -> Result<csv::Reader<fs::File>> {
    if !path.exists() {
        return Err(StitchError::MissingInput {
            stage,
            path: path.to_path_buf(),
        });
    }
    ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|err| StitchError::csv(stage, path, err))
}

pub(crate) fn column_index(
    stage: Stage,
    path: &Path,
    headers: &StringRecord,
    column: &str,
) -> Result<usize> {
    headers
        .iter()
        .position(|name| name == column)
        .ok_or_else(|| StitchError::MissingKey {
            stage,
            path: path.to_path_buf(),
            column: column.to_string(),
            available: describe_record(headers),
        })
}

pub(crate) fn field(row: &StringRecord, idx: usize) -> &str {
    row.get(idx).unwrap_or_default()
}

pub(crate) fn describe_record(record: &StringRecord) -> String {
    record.iter().collect::<Vec<_>>().join(", ")
}

/// What a stage left on disk once its output was persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSummary {
    pub path: PathBuf,
    pub rows: usize,
    /// blake3 hex digest of the persisted bytes.
    pub digest: String,
}

/// Writes CSV rows into a temporary file next to the destination and only
/// moves it into place on [`OutputWriter::finish`]. Dropping the writer
/// early discards the temporary file, leaving any previous output intact.
pub struct OutputWriter {
    stage: Stage,
    destination: PathBuf,
    writer: csv::Writer<NamedTempFile>,
    rows: usize,
}

impl OutputWriter {
    pub fn create(stage: Stage, destination: &Path, headers: &StringRecord) -> Result<Self> {
        let parent = match destination.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|err| StitchError::io(stage, &parent, err))?;

        let tmp = output_file_builder()
            .tempfile_in(&parent)
            .map_err(|err| StitchError::io(stage, &parent, err))?;
        let mut writer = WriterBuilder::new().from_writer(tmp);
        writer
            .write_record(headers)
            .map_err(|err| StitchError::csv(stage, destination, err))?;

        Ok(Self {
            stage,
            destination: destination.to_path_buf(),
            writer,
            rows: 0,
        })
    }

    pub fn write_row(&mut self, row: &StringRecord) -> Result<()> {
        self.writer
            .write_record(row)
            .map_err(|err| StitchError::csv(self.stage, &self.destination, err))?;
        self.rows += 1;
        Ok(())
    }

    pub fn finish(self) -> Result<OutputSummary> {
        let stage = self.stage;
        let destination = self.destination;
        let mut tmp = self
            .writer
            .into_inner()
            .map_err(|err| StitchError::io(stage, &destination, err.into_error()))?;
        tmp.flush()
            .map_err(|err| StitchError::io(stage, &destination, err))?;

        let bytes = fs::read(tmp.path()).map_err(|err| StitchError::io(stage, &destination, err))?;
        let digest = blake3::hash(&bytes).to_hex().to_string();

        tmp.persist(&destination)
            .map_err(|err| StitchError::io(stage, &destination, err.error))?;

        debug!(path = %destination.display(), rows = self.rows, %digest, "Persisted output");

        Ok(OutputSummary {
            path: destination,
            rows: self.rows,
            digest,
        })
    }
}

/// Temporary files default to 0600; outputs should get the same mode as any
/// freshly created file, so request 0666 and let the umask apply.
fn output_file_builder() -> tempfile::Builder<'static, 'static> {
    #[allow(unused_mut)]
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder
}

pub fn write_table<'a, I>(
    stage: Stage,
    destination: &Path,
    headers: &StringRecord,
    rows: I,
) -> Result<OutputSummary>
where
    I: IntoIterator<Item = &'a StringRecord>,
{
    let mut writer = OutputWriter::create(stage, destination, headers)?;
    for row in rows {
        writer.write_row(row)?;
    }
    writer.finish()
}
