//! Dynamic values accepted by the segment write path.
//!
//! A logical record is a map from column name to `Value`. Records carry no
//! identifier; they are identified only by their 0-based position within a
//! segment.

use chrono::{DateTime, Utc};

/// A dynamically typed value for one column of one logical record.
///
/// Timestamp columns accept either `Value::Timestamp` (a wall-clock
/// instant, converted to nanoseconds since the Unix epoch before
/// encoding) or `Value::Int64` (an absolute nanosecond count, stored
/// unchanged).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int64(i64),
    Float64(f64),
    Bool(bool),
    String(String),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Check if the value is the null sentinel
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the runtime type, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int64(_) => "int64",
            Value::Float64(_) => "float64",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::Timestamp(_) => "timestamp",
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}
