//! Segment descriptor (`metadata.json`).
//!
//! Emitted into the temp directory just before the atomic rename, so a
//! committed segment always carries its descriptor. Per-column summaries
//! are snapshotted from the closed column writers.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::schema::{ColumnType, Schema};
use crate::Result;

use super::column::ColumnWriter;

/// A min/max statistic: integral for int64 and timestamp columns,
/// floating for float64 columns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Int(i64),
    Float(f64),
}

/// Summary of one column within a committed segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub record_count: u64,
    pub null_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<StatValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<StatValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionary_size: Option<u64>,
}

/// Descriptor of one committed segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentMetadata {
    pub segment_id: u64,
    pub record_count: u64,
    pub columns: Vec<ColumnMetadata>,
}

impl SegmentMetadata {
    /// Snapshot final statistics from closed column writers, in schema
    /// order. Min/max are emitted only when at least one non-null value
    /// was written; dictionary size only for string columns.
    pub(crate) fn collect(
        segment_id: u64,
        record_count: u64,
        schema: &Schema,
        writers: &[Box<dyn ColumnWriter>],
    ) -> SegmentMetadata {
        let columns = schema
            .columns
            .iter()
            .zip(writers.iter())
            .map(|(col, writer)| {
                let mut meta = ColumnMetadata {
                    name: col.name.clone(),
                    column_type: col.column_type,
                    record_count: writer.record_count(),
                    null_count: writer.null_count(),
                    min_value: None,
                    max_value: None,
                    dictionary_size: None,
                };

                if meta.null_count < meta.record_count {
                    match col.column_type {
                        ColumnType::Int64 | ColumnType::Timestamp => {
                            if let Some((min, max)) = writer.int_range() {
                                meta.min_value = Some(StatValue::Int(min));
                                meta.max_value = Some(StatValue::Int(max));
                            }
                        }
                        ColumnType::Float64 => {
                            if let Some((min, max)) = writer.float_range() {
                                meta.min_value = Some(StatValue::Float(min));
                                meta.max_value = Some(StatValue::Float(max));
                            }
                        }
                        _ => {}
                    }
                }

                if col.column_type == ColumnType::String {
                    meta.dictionary_size = writer.dictionary_size();
                }

                meta
            })
            .collect();

        SegmentMetadata {
            segment_id,
            record_count,
            columns,
        }
    }

    /// Write the descriptor as pretty-printed JSON to
    /// `dir/metadata.json`, flushed and closed before returning.
    pub(crate) fn write_to(&self, dir: &Path, sync: bool) -> Result<()> {
        let path = dir.join("metadata.json");
        let file = File::create(path)?;
        let mut out = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut out, self)?;
        out.flush()?;
        if sync {
            out.get_ref().sync_all()?;
        }
        Ok(())
    }
}
