//! Schema model and validation for columnar datastores.
//!
//! A schema is append-only and immutable once loaded. It defines:
//! - Column types and nullability
//! - Column ordering (fixed for the lifetime of a datastore)
//! - Version for future compatibility checks
//!
//! Schema validation ensures structural integrity before any data
//! operations.

mod load;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Result, StrataError};

/// Supported column data types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// 64-bit signed integers
    Int64,
    /// 64-bit IEEE-754 floating point numbers
    Float64,
    /// Boolean values
    Bool,
    /// UTF-8 strings (dictionary encoded on disk)
    String,
    /// Nanoseconds since the Unix epoch (UTC)
    Timestamp,
}

impl ColumnType {
    /// Canonical lowercase name, as stored in schema and metadata JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Int64 => "int64",
            ColumnType::Float64 => "float64",
            ColumnType::Bool => "bool",
            ColumnType::String => "string",
            ColumnType::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "int64" => Ok(ColumnType::Int64),
            "float64" => Ok(ColumnType::Float64),
            "bool" => Ok(ColumnType::Bool),
            "string" => Ok(ColumnType::String),
            "timestamp" => Ok(ColumnType::Timestamp),
            other => Err(StrataError::UnsupportedType(other.to_string())),
        }
    }
}

impl Serialize for ColumnType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ColumnType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A single field in the schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name (unique within schema)
    pub name: String,
    /// Data type
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Whether null values are allowed
    pub nullable: bool,
    /// Runtime position index, assigned after validation
    #[serde(skip)]
    pub index: usize,
}

/// The structure of stored data: an ordered, versioned list of columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Schema version for compatibility
    pub version: u32,
    /// Ordered list of columns
    pub columns: Vec<Column>,
}

impl Schema {
    /// Create a validated schema from parts, assigning column indices.
    pub fn new(version: u32, columns: Vec<Column>) -> Result<Self> {
        let mut schema = Schema { version, columns };
        schema.validate()?;
        schema.assign_indices();
        Ok(schema)
    }

    /// Ensure the schema meets all structural requirements.
    ///
    /// Unknown column types never get this far: `ColumnType` parsing
    /// already rejects them.
    pub fn validate(&self) -> Result<()> {
        if self.version == 0 {
            return Err(StrataError::InvalidSchema(
                "schema version must be > 0".to_string(),
            ));
        }

        if self.columns.is_empty() {
            return Err(StrataError::InvalidSchema(
                "schema must have at least one column".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for col in &self.columns {
            if col.name.is_empty() {
                return Err(StrataError::InvalidSchema(
                    "column name cannot be empty".to_string(),
                ));
            }
            if !seen.insert(col.name.as_str()) {
                return Err(StrataError::InvalidSchema(format!(
                    "duplicate column name: {}",
                    col.name
                )));
            }
        }

        Ok(())
    }

    fn assign_indices(&mut self) {
        for (i, col) in self.columns.iter_mut().enumerate() {
            col.index = i;
        }
    }
}
