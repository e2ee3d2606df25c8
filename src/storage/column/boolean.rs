//! Bool column writer.
//!
//! The value file is itself bit-packed MSB-first, 8 values per byte,
//! independently of the null bitmap. A null contributes a 0 bit to both
//! streams. Both files flush their final partial byte at close,
//! low-order-padded with 0.

use std::path::Path;

use crate::data::Value;
use crate::{Result, StrataError};

use super::bitmap::BitmapWriter;
use super::ColumnWriter;

pub struct BoolWriter {
    column: String,
    values: BitmapWriter,
    nulls: BitmapWriter,

    count: u64,
    null_count: u64,
    sync: bool,
    closed: bool,
}

impl BoolWriter {
    /// Create a new bool column writer in `dir`, failing if either
    /// target file already exists.
    pub fn create(dir: &Path, column: &str, sync: bool) -> Result<Self> {
        let values_path = dir.join(format!("{column}.bin"));
        let nulls_path = dir.join(format!("{column}.nulls.bin"));

        let values = BitmapWriter::create_new(&values_path)?;
        let nulls = BitmapWriter::create_new(&nulls_path)?;

        Ok(Self {
            column: column.to_string(),
            values,
            nulls,
            count: 0,
            null_count: 0,
            sync,
            closed: false,
        })
    }
}

impl ColumnWriter for BoolWriter {
    fn write(&mut self, value: &Value) -> Result<()> {
        if self.closed {
            return Err(StrataError::WriterClosed(self.column.clone()));
        }

        match value {
            Value::Null => {
                self.null_count += 1;
                self.nulls.push(false)?;
                self.values.push(false)?;
            }
            Value::Bool(v) => {
                self.nulls.push(true)?;
                self.values.push(*v)?;
            }
            other => {
                return Err(StrataError::TypeMismatch {
                    column: self.column.clone(),
                    expected: "bool",
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

        self.values.finish()?;
        self.nulls.finish()?;
        if self.sync {
            self.values.sync_all()?;
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_bit_packed_values_and_nulls() {
        let dir = tempdir().unwrap();
        let mut w = BoolWriter::create(dir.path(), "active", false).unwrap();

        w.write(&Value::Bool(true)).unwrap();
        w.write(&Value::Bool(false)).unwrap();
        w.write(&Value::Null).unwrap();
        w.write(&Value::Bool(true)).unwrap();
        w.close().unwrap();

        assert_eq!(
            fs::read(dir.path().join("active.bin")).unwrap(),
            vec![0b10010000]
        );
        assert_eq!(
            fs::read(dir.path().join("active.nulls.bin")).unwrap(),
            vec![0b11010000]
        );
        assert_eq!(w.record_count(), 4);
        assert_eq!(w.null_count(), 1);
    }

    #[test]
    fn test_nine_values_span_two_bytes() {
        let dir = tempdir().unwrap();
        let mut w = BoolWriter::create(dir.path(), "flags", false).unwrap();

        for _ in 0..8 {
            w.write(&Value::Bool(true)).unwrap();
        }
        w.write(&Value::Bool(true)).unwrap();
        w.close().unwrap();

        assert_eq!(
            fs::read(dir.path().join("flags.bin")).unwrap(),
            vec![0xFF, 0b10000000]
        );
        assert_eq!(
            fs::read(dir.path().join("flags.nulls.bin")).unwrap(),
            vec![0xFF, 0b10000000]
        );
    }

    #[test]
    fn test_type_mismatch() {
        let dir = tempdir().unwrap();
        let mut w = BoolWriter::create(dir.path(), "active", false).unwrap();

        let err = w.write(&Value::Int64(1)).unwrap_err();
        assert!(matches!(err, StrataError::TypeMismatch { .. }));
        assert_eq!(w.record_count(), 0);
        w.close().unwrap();
    }
}
