//! Storage module - the segment write path.
//!
//! Turns a stream of logical records against a fixed schema into an
//! immutable on-disk segment: per-column binary files, a `metadata.json`
//! descriptor, and a manifest entry, published by atomic rename.
//!
//! ```text
//! <root>/
//! ├── schema.json           (schema collaborator)
//! ├── manifest.json         (this module)
//! └── segments/
//!     ├── seg_000001/
//!     │   ├── metadata.json
//!     │   ├── <col>.bin     or  <col>.ids.bin + <col>.dict.bin
//!     │   └── <col>.nulls.bin
//!     └── seg_000002/
//! ```

pub mod column;
pub mod manifest;
pub mod metadata;
pub mod segment;

// Re-export the write-path types
pub use column::{open_column_writer, ColumnWriter};
pub use manifest::{manifest_path_for, Manifest, ManifestItem};
pub use metadata::{ColumnMetadata, SegmentMetadata, StatValue};
pub use segment::{SegmentWriter, SegmentWriterConfig};
