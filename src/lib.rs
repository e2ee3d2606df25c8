//! Strata Core Storage Engine
//!
//! A local, embedded, append-only columnar data store for read-heavy
//! analytical workloads. This crate implements the segment write path:
//! typed records go in, an immutable on-disk segment comes out, consisting
//! of per-column binary files, a `metadata.json` descriptor, and an entry
//! in the datastore manifest, all published with atomic commit semantics.

pub mod data;
pub mod schema;
pub mod storage;

// Re-export main types
pub use data::Value;
pub use schema::{Column, ColumnType, Schema};
pub use storage::manifest::{Manifest, ManifestItem};
pub use storage::metadata::{ColumnMetadata, SegmentMetadata, StatValue};
pub use storage::segment::{SegmentWriter, SegmentWriterConfig};

/// Storage engine error type
#[derive(Debug, thiserror::Error)]
pub enum StrataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("unsupported column type: {0}")]
    UnsupportedType(String),

    #[error("type mismatch in column '{column}': expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("disallowed value in column '{column}': {reason}")]
    DisallowedValue { column: String, reason: String },

    #[error("null value in non-nullable column '{0}'")]
    NullViolation(String),

    #[error("missing value for column '{0}'")]
    MissingColumn(String),

    #[error("write on closed column writer '{0}'")]
    WriterClosed(String),

    #[error("column writer '{0}' already closed")]
    WriterAlreadyClosed(String),

    #[error("segment {0} already committed")]
    SegmentCommitted(u64),

    #[error("segment {0} was aborted")]
    SegmentAborted(u64),

    #[error("record count mismatch in segment {segment_id}: column '{column}' has {column_count} records, segment has {segment_count}")]
    RecordCountMismatch {
        segment_id: u64,
        column: String,
        column_count: u64,
        segment_count: u64,
    },

    #[error("manifest already contains segment id {0}")]
    DuplicateSegmentId(u64),

    #[error("manifest already contains segment path '{0}'")]
    DuplicateSegmentPath(String),

    #[error("segment {segment_id} committed at '{path}' but manifest update failed: {source}")]
    ManifestUpdateFailed {
        segment_id: u64,
        path: String,
        #[source]
        source: Box<StrataError>,
    },
}

pub type Result<T> = std::result::Result<T, StrataError>;
