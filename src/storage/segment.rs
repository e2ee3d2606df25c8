//! Immutable segment writing.
//!
//! Segments are the fundamental unit of data organization:
//! - Each segment holds one column file group per schema column
//! - Segments are immutable once committed (append-only writes)
//! - The temp-directory rename makes the commit atomic and crash safe
//! - `metadata.json` enables segment pruning during queries
//!
//! The write path is: temp directory creation → per-record column writes
//! → metadata generation → atomic rename → manifest append.
//!
//! Records are a logical concept only; there is no physical row on disk.
//! A record is identified solely by its 0-based position within the
//! segment, every column of a segment holds exactly `record_count`
//! entries, values align by position across columns, and nulls never
//! remove a position. Rows are materialized only at query time.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::data::Value;
use crate::schema::{Column, ColumnType, Schema};
use crate::{Result, StrataError};

use super::column::{open_column_writer, ColumnWriter};
use super::manifest::{manifest_path_for, Manifest, ManifestItem};
use super::metadata::SegmentMetadata;

/// Segment writer configuration
#[derive(Debug, Clone, Copy)]
pub struct SegmentWriterConfig {
    /// Whether to fsync column files at close and the descriptor before
    /// the commit rename
    pub sync_writes: bool,
}

impl Default for SegmentWriterConfig {
    fn default() -> Self {
        Self { sync_writes: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Open,
    Committed,
    Aborted,
}

/// Manages the lifecycle of writing one immutable segment.
///
/// Coordinates the column writers for every schema column and publishes
/// the segment with atomic commit semantics. The writer is single-use:
/// `Committed` and `Aborted` are terminal states.
///
/// The temp directory doubles as the mutual-exclusion primitive: two
/// writers targeting the same segment id both attempt to create it, and
/// the second fails with "already exists". Serializing manifest appends
/// across processes is the caller's responsibility.
pub struct SegmentWriter {
    schema: Schema,
    segment_id: u64,
    segments_dir: PathBuf,
    temp_dir: PathBuf,
    final_dir: PathBuf,
    writers: Vec<Box<dyn ColumnWriter>>,
    record_count: u64,
    config: SegmentWriterConfig,
    state: State,
}

impl std::fmt::Debug for SegmentWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentWriter")
            .field("schema", &self.schema)
            .field("segment_id", &self.segment_id)
            .field("segments_dir", &self.segments_dir)
            .field("temp_dir", &self.temp_dir)
            .field("final_dir", &self.final_dir)
            .field("record_count", &self.record_count)
            .field("config", &self.config)
            .field("state", &self.state)
            .finish()
    }
}

impl SegmentWriter {
    /// Create a segment writer with the default configuration.
    pub fn new(segments_dir: impl AsRef<Path>, segment_id: u64, schema: &Schema) -> Result<Self> {
        Self::with_config(segments_dir, segment_id, schema, SegmentWriterConfig::default())
    }

    /// Create a segment writer for `segment_id` under `segments_dir`.
    ///
    /// Creates the temp directory (which must not already exist) and one
    /// column writer per schema column inside it. On any failure the
    /// already-created writers are closed and the temp directory is
    /// removed.
    pub fn with_config(
        segments_dir: impl AsRef<Path>,
        segment_id: u64,
        schema: &Schema,
        config: SegmentWriterConfig,
    ) -> Result<Self> {
        let segments_dir = segments_dir.as_ref().to_path_buf();
        let final_dir = segments_dir.join(format!("seg_{segment_id:06}"));
        let temp_dir = {
            let mut name = final_dir.clone().into_os_string();
            name.push(".tmp");
            PathBuf::from(name)
        };

        fs::create_dir(&temp_dir)?;
        log::debug!("segment {segment_id}: created temp dir {}", temp_dir.display());

        let mut writers: Vec<Box<dyn ColumnWriter>> = Vec::with_capacity(schema.columns.len());
        for col in &schema.columns {
            match open_column_writer(&temp_dir, col, config.sync_writes) {
                Ok(writer) => writers.push(writer),
                Err(e) => {
                    for writer in &mut writers {
                        let _ = writer.close();
                    }
                    let _ = fs::remove_dir_all(&temp_dir);
                    return Err(e);
                }
            }
        }

        Ok(Self {
            schema: schema.clone(),
            segment_id,
            segments_dir,
            temp_dir,
            final_dir,
            writers,
            record_count: 0,
            config,
            state: State::Open,
        })
    }

    pub fn segment_id(&self) -> u64 {
        self.segment_id
    }

    /// Number of records written so far.
    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    /// Write one logical record to all columns.
    ///
    /// The map must contain a value for every schema column; unknown
    /// keys are ignored. Every column is validated (presence,
    /// nullability, value type) before any column writer runs, so a
    /// rejected record never advances any column.
    pub fn write_record(&mut self, record: &HashMap<String, Value>) -> Result<()> {
        self.check_open()?;

        let mut values: Vec<&Value> = Vec::with_capacity(self.schema.columns.len());
        for col in &self.schema.columns {
            let value = record
                .get(&col.name)
                .ok_or_else(|| StrataError::MissingColumn(col.name.clone()))?;

            if value.is_null() {
                if !col.nullable {
                    return Err(StrataError::NullViolation(col.name.clone()));
                }
            } else {
                validate_value(col, value)?;
            }
            values.push(value);
        }

        for (writer, value) in self.writers.iter_mut().zip(values) {
            writer.write(value)?;
        }

        self.record_count += 1;
        Ok(())
    }

    /// Atomically finalize the segment.
    ///
    /// Closes every column writer (best-effort: all are closed even if
    /// one fails, the first error is kept), validates that all columns
    /// hold exactly `record_count` records, emits `metadata.json`, and
    /// renames the temp directory to its final name. Any failure before
    /// the rename aborts the segment. After the rename the segment is
    /// durable; a manifest append failure then surfaces as
    /// [`StrataError::ManifestUpdateFailed`] with the segment left
    /// committed on disk for the caller to re-append.
    pub fn commit(&mut self) -> Result<()> {
        self.check_open()?;

        let mut close_err = None;
        for writer in &mut self.writers {
            if let Err(e) = writer.close() {
                close_err.get_or_insert(e);
            }
        }
        if let Some(e) = close_err {
            let _ = self.abort();
            return Err(e);
        }

        let mismatch = self
            .schema
            .columns
            .iter()
            .zip(self.writers.iter())
            .find(|(_, writer)| writer.record_count() != self.record_count)
            .map(|(col, writer)| (col.name.clone(), writer.record_count()));
        if let Some((column, column_count)) = mismatch {
            let _ = self.abort();
            return Err(StrataError::RecordCountMismatch {
                segment_id: self.segment_id,
                column,
                column_count,
                segment_count: self.record_count,
            });
        }

        let meta = SegmentMetadata::collect(
            self.segment_id,
            self.record_count,
            &self.schema,
            &self.writers,
        );
        if let Err(e) = meta.write_to(&self.temp_dir, self.config.sync_writes) {
            let _ = self.abort();
            return Err(e);
        }

        // Statistics are snapshotted; drop the writers so every column
        // file handle is released before the directory is published
        self.writers.clear();

        if let Err(e) = fs::rename(&self.temp_dir, &self.final_dir) {
            let _ = self.abort();
            return Err(e.into());
        }

        self.state = State::Committed;
        log::info!(
            "committed segment {} with {} records at {}",
            self.segment_id,
            self.record_count,
            self.final_dir.display()
        );

        self.update_manifest()
    }

    /// Remove the temp directory of an uncommitted segment.
    ///
    /// Idempotent and safe in every state; after a successful commit it
    /// has no effect on the published directory.
    pub fn abort(&mut self) -> Result<()> {
        if self.state == State::Committed {
            return Ok(());
        }
        self.state = State::Aborted;

        match fs::remove_dir_all(&self.temp_dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn check_open(&self) -> Result<()> {
        match self.state {
            State::Open => Ok(()),
            State::Committed => Err(StrataError::SegmentCommitted(self.segment_id)),
            State::Aborted => Err(StrataError::SegmentAborted(self.segment_id)),
        }
    }

    fn update_manifest(&self) -> Result<()> {
        let manifest_path = manifest_path_for(&self.segments_dir);
        let path = relative_slash_path(&manifest_path, &self.final_dir);

        let item = ManifestItem {
            id: self.segment_id,
            path: path.clone(),
            record_count: self.record_count,
        };
        Manifest::append(&manifest_path, item).map_err(|e| {
            log::warn!(
                "segment {} committed but manifest append failed: {e}",
                self.segment_id
            );
            StrataError::ManifestUpdateFailed {
                segment_id: self.segment_id,
                path,
                source: Box::new(e),
            }
        })
    }
}

/// Check that a non-null value matches the column type and carries no
/// disallowed content (NaN, unrepresentable instant).
fn validate_value(col: &Column, value: &Value) -> Result<()> {
    match (col.column_type, value) {
        (ColumnType::Int64, Value::Int64(_))
        | (ColumnType::Bool, Value::Bool(_))
        | (ColumnType::String, Value::String(_))
        | (ColumnType::Timestamp, Value::Int64(_)) => Ok(()),
        (ColumnType::Float64, Value::Float64(v)) => {
            if v.is_nan() {
                Err(StrataError::DisallowedValue {
                    column: col.name.clone(),
                    reason: "NaN is not allowed".to_string(),
                })
            } else {
                Ok(())
            }
        }
        (ColumnType::Timestamp, Value::Timestamp(instant)) => {
            if instant.timestamp_nanos_opt().is_none() {
                Err(StrataError::DisallowedValue {
                    column: col.name.clone(),
                    reason: "instant outside the representable nanosecond range".to_string(),
                })
            } else {
                Ok(())
            }
        }
        _ => Err(StrataError::TypeMismatch {
            column: col.name.clone(),
            expected: col.column_type.as_str(),
            actual: value.type_name(),
        }),
    }
}

/// Express `target` relative to the manifest's directory using forward
/// slashes, falling back to the full path when it is not a descendant.
fn relative_slash_path(manifest_path: &Path, target: &Path) -> String {
    let base = manifest_path.parent().unwrap_or_else(|| Path::new(""));
    let rel = target.strip_prefix(base).unwrap_or(target);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
