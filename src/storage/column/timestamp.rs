//! Timestamp column writer.
//!
//! Adapts the int64 writer: values are nanoseconds since the Unix epoch.
//! A wall-clock instant is converted to its nanosecond count before
//! encoding; an absolute integer is stored unchanged.

use std::path::Path;

use crate::data::Value;
use crate::{Result, StrataError};

use super::int64::Int64Writer;
use super::ColumnWriter;

pub struct TimestampWriter {
    inner: Int64Writer,
}

impl TimestampWriter {
    pub fn create(dir: &Path, column: &str, sync: bool) -> Result<Self> {
        Ok(Self {
            inner: Int64Writer::create(dir, column, sync)?,
        })
    }
}

impl ColumnWriter for TimestampWriter {
    fn write(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Null | Value::Int64(_) => self.inner.write(value),
            Value::Timestamp(instant) => {
                let nanos = instant.timestamp_nanos_opt().ok_or_else(|| {
                    StrataError::DisallowedValue {
                        column: self.inner.column().to_string(),
                        reason: "instant outside the representable nanosecond range".to_string(),
                    }
                })?;
                self.inner.write(&Value::Int64(nanos))
            }
            other => Err(StrataError::TypeMismatch {
                column: self.inner.column().to_string(),
                expected: "timestamp",
                actual: other.type_name(),
            }),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.inner.close()
    }

    fn record_count(&self) -> u64 {
        self.inner.record_count()
    }

    fn null_count(&self) -> u64 {
        self.inner.null_count()
    }

    fn int_range(&self) -> Option<(i64, i64)> {
        self.inner.int_range()
    }
}
