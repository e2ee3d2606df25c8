//! Typed column writers and their factory.
//!
//! Each writer owns the files of one column within one in-progress
//! segment and encodes one value (or null) per call. The segment writer
//! drives all columns in lockstep so every column advances by exactly one
//! record per `write_record`.

mod bitmap;
pub mod boolean;
pub mod float64;
pub mod int64;
pub mod string;
pub mod timestamp;

use std::path::Path;

use crate::data::Value;
use crate::schema::{Column, ColumnType};
use crate::Result;

pub use boolean::BoolWriter;
pub use float64::Float64Writer;
pub use int64::Int64Writer;
pub use string::StringWriter;
pub use timestamp::TimestampWriter;

/// Interface for writing one column's data.
///
/// `write` must be called exactly once per column for each logical
/// record; `record_count` increases by exactly 1 per successful call.
/// The optional capability methods expose per-type statistics to the
/// metadata emitter and return `None` where a type does not track them,
/// or, for min/max, when no non-null value was written.
pub trait ColumnWriter {
    /// Append one value (including nulls) to the column.
    fn write(&mut self, value: &Value) -> Result<()>;

    /// Flush remaining buffered state, write trailing structures (string
    /// dictionary, partial bitmap bytes), and close all files. Terminal.
    fn close(&mut self) -> Result<()>;

    fn record_count(&self) -> u64;

    fn null_count(&self) -> u64;

    /// Min/max of non-null values for int64 and timestamp columns.
    fn int_range(&self) -> Option<(i64, i64)> {
        None
    }

    /// Min/max of non-null values for float64 columns.
    fn float_range(&self) -> Option<(f64, f64)> {
        None
    }

    /// Count of distinct non-null strings for string columns.
    fn dictionary_size(&self) -> Option<u64> {
        None
    }
}

/// Open the column writer matching `column`'s type inside `dir`.
pub fn open_column_writer(
    dir: &Path,
    column: &Column,
    sync_writes: bool,
) -> Result<Box<dyn ColumnWriter>> {
    let writer: Box<dyn ColumnWriter> = match column.column_type {
        ColumnType::Int64 => Box::new(Int64Writer::create(dir, &column.name, sync_writes)?),
        ColumnType::Float64 => Box::new(Float64Writer::create(dir, &column.name, sync_writes)?),
        ColumnType::Bool => Box::new(BoolWriter::create(dir, &column.name, sync_writes)?),
        ColumnType::String => Box::new(StringWriter::create(dir, &column.name, sync_writes)?),
        ColumnType::Timestamp => Box::new(TimestampWriter::create(dir, &column.name, sync_writes)?),
    };
    Ok(writer)
}
