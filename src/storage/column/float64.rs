//! Float64 column writer.
//!
//! Values are stored as IEEE-754 8-byte little-endian doubles in
//! `<name>.bin` with a separate null bitmap. Null positions store +0.0.
//! NaN is rejected at write time so segment statistics stay totally
//! ordered.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::data::Value;
use crate::{Result, StrataError};

use super::bitmap::{open_exclusive, BitmapWriter};
use super::ColumnWriter;

pub struct Float64Writer {
    column: String,
    values: BufWriter<File>,
    nulls: BitmapWriter,

    count: u64,
    null_count: u64,
    min: f64,
    max: f64,
    has_value: bool,
    sync: bool,
    closed: bool,
}

impl Float64Writer {
    /// Create a new float64 column writer in `dir`, failing if either
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
            min: 0.0,
            max: 0.0,
            has_value: false,
            sync,
            closed: false,
        })
    }

    fn update_stats(&mut self, v: f64) {
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

impl ColumnWriter for Float64Writer {
    fn write(&mut self, value: &Value) -> Result<()> {
        if self.closed {
            return Err(StrataError::WriterClosed(self.column.clone()));
        }

        match value {
            Value::Null => {
                self.null_count += 1;
                self.nulls.push(false)?;
                self.values.write_f64::<LittleEndian>(0.0)?;
            }
            Value::Float64(v) => {
                // Reject NaN before any bit or byte is appended; the
                // writer stays usable.
                if v.is_nan() {
                    return Err(StrataError::DisallowedValue {
                        column: self.column.clone(),
                        reason: "NaN is not allowed".to_string(),
                    });
                }
                self.nulls.push(true)?;
                self.values.write_f64::<LittleEndian>(*v)?;
                self.update_stats(*v);
            }
            other => {
                return Err(StrataError::TypeMismatch {
                    column: self.column.clone(),
                    expected: "float64",
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

    fn float_range(&self) -> Option<(f64, f64)> {
        self.has_value.then_some((self.min, self.max))
    }
}
