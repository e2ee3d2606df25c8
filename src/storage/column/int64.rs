//! Int64 column writer.
//!
//! Values are stored as 8-byte little-endian integers in `<name>.bin` with
//! a separate MSB-first null bitmap in `<name>.nulls.bin`. Null positions
//! store a 0 placeholder so record positions stay aligned.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::data::Value;
use crate::{Result, StrataError};

use super::bitmap::{open_exclusive, BitmapWriter};
use super::ColumnWriter;

pub struct Int64Writer {
    column: String,
    values: BufWriter<File>,
    nulls: BitmapWriter,

    count: u64,
    null_count: u64,
    min: i64,
    max: i64,
    has_value: bool,
    sync: bool,
    closed: bool,
}

impl Int64Writer {
    /// Create a new int64 column writer in `dir`, failing if either
    /// target file already exists.
    pub fn create(dir: &Path, column: &str, sync: bool) -> Result<Self> {
        let values_path = dir.join(format!("{column}.bin"));
        let nulls_path = dir.join(format!("{column}.nulls.bin"));

        let values = BufWriter::new(open_exclusive(&values_path)?);
        let nulls = BitmapWriter::create_new(&nulls_path)?;

        Ok(Self {
            column: column.to_string(),
            values,
            nulls,
            count: 0,
            null_count: 0,
            min: 0,
            max: 0,
            has_value: false,
            sync,
            closed: false,
        })
    }

    pub(crate) fn column(&self) -> &str {
        &self.column
    }

    fn update_stats(&mut self, v: i64) {
        if !self.has_value {
            self.min = v;
            self.max = v;
            self.has_value = true;
        } else {
            if v > self.max {
                self.max = v;
            }
            if v < self.min {
                self.min = v;
            }
        }
    }
}

impl ColumnWriter for Int64Writer {
    fn write(&mut self, value: &Value) -> Result<()> {
        if self.closed {
            return Err(StrataError::WriterClosed(self.column.clone()));
        }

        match value {
            Value::Null => {
                self.null_count += 1;
                self.nulls.push(false)?;
                self.values.write_i64::<LittleEndian>(0)?;
            }
            Value::Int64(v) => {
                self.nulls.push(true)?;
                self.values.write_i64::<LittleEndian>(*v)?;
                self.update_stats(*v);
            }
            other => {
                return Err(StrataError::TypeMismatch {
                    column: self.column.clone(),
                    expected: "int64",
                    actual: other.type_name(),
                })
            }
        }

        self.count += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Err(StrataError::WriterAlreadyClosed(self.column.clone()));
        }
        self.closed = true;

        self.nulls.finish()?;
        self.values.flush()?;
        if self.sync {
            self.values.get_ref().sync_all()?;
            self.nulls.sync_all()?;
        }
        Ok(())
    }

    fn record_count(&self) -> u64 {
        self.count
    }

    fn null_count(&self) -> u64 {
        self.null_count
    }

    fn int_range(&self) -> Option<(i64, i64)> {
        self.has_value.then_some((self.min, self.max))
    }
}
