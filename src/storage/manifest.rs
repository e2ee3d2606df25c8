//! Datastore manifest (`manifest.json`).
//!
//! The append-only index of committed segments. Updates go through a
//! sibling temp file renamed over the target, so readers always observe
//! either the pre-append or the post-append manifest, never a partial
//! one. The manifest itself provides no cross-process locking; callers
//! that commit concurrently must serialize externally.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Result, StrataError};

const MANIFEST_VERSION: u32 = 1;

/// One committed segment, as indexed by the manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestItem {
    pub id: u64,
    /// Segment directory location relative to the manifest file, with
    /// forward slashes
    pub path: String,
    pub record_count: u64,
}

/// Datastore-level list of committed segments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub segments: Vec<ManifestItem>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION,
            segments: Vec::new(),
        }
    }
}

impl Manifest {
    /// Load the manifest at `path`. A missing file yields the empty v1
    /// manifest; a decoded `version` of 0 is normalized to 1 for
    /// compatibility with early writers.
    pub fn load(path: &Path) -> Result<Manifest> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Manifest::default()),
            Err(e) => return Err(e.into()),
        };

        let mut manifest: Manifest = serde_json::from_slice(&data)?;
        if manifest.version == 0 {
            manifest.version = MANIFEST_VERSION;
        }
        Ok(manifest)
    }

    /// Atomically replace the manifest at `path` with `self`: write a
    /// `manifest-*.json` temp file in the same directory, then rename it
    /// over the target. The temp file is removed on failure.
    pub fn write(&self, path: &Path) -> Result<()> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let temp = tempfile::Builder::new()
            .prefix("manifest-")
            .suffix(".json")
            .tempfile_in(parent)?;
        serde_json::to_writer_pretty(temp.as_file(), self)?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| StrataError::Io(e.error))?;
        Ok(())
    }

    /// Append one segment to the manifest at `path`, rejecting any item
    /// whose id or path is already present.
    pub fn append(path: &Path, item: ManifestItem) -> Result<()> {
        let mut manifest = Manifest::load(path)?;

        for existing in &manifest.segments {
            if existing.id == item.id {
                return Err(StrataError::DuplicateSegmentId(item.id));
            }
            if existing.path == item.path {
                return Err(StrataError::DuplicateSegmentPath(item.path));
            }
        }

        log::debug!("manifest: appending segment {} at '{}'", item.id, item.path);
        manifest.segments.push(item);
        manifest.write(path)
    }
}

/// Locate the manifest for a segments directory. When the directory's
/// final path component is literally `segments`, the manifest is its
/// sibling `manifest.json` (the standard datastore layout); otherwise it
/// lives inside the directory itself.
pub fn manifest_path_for(segments_dir: &Path) -> PathBuf {
    if segments_dir.file_name() == Some(OsStr::new("segments")) {
        match segments_dir.parent() {
            Some(parent) => parent.join("manifest.json"),
            None => segments_dir.join("manifest.json"),
        }
    } else {
        segments_dir.join("manifest.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn item(id: u64, path: &str, record_count: u64) -> ManifestItem {
        ManifestItem {
            id,
            path: path.to_string(),
            record_count,
        }
    }

    #[test]
    fn test_load_missing_file_yields_empty_v1() {
        let dir = tempdir().unwrap();
        let manifest = Manifest::load(&dir.path().join("manifest.json")).unwrap();
        assert_eq!(manifest.version, 1);
        assert!(manifest.segments.is_empty());
    }

    #[test]
    fn test_version_zero_is_normalized() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, r#"{"version": 0, "segments": []}"#).unwrap();

        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.version, 1);
    }

    #[test]
    fn test_corrupt_manifest_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, b"{not json").unwrap();

        let err = Manifest::load(&path).unwrap_err();
        assert!(matches!(err, StrataError::Json(_)));
    }

    #[test]
    fn test_append_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("manifest.json");

        Manifest::append(&path, item(1, "segments/seg_000001", 10)).unwrap();
        Manifest::append(&path, item(2, "segments/seg_000002", 20)).unwrap();

        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.segments.len(), 2);
        assert_eq!(manifest.segments[0].id, 1);
        assert_eq!(manifest.segments[1].record_count, 20);
    }

    #[test]
    fn test_append_rejects_duplicate_id() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("manifest.json");

        Manifest::append(&path, item(1, "segments/seg_000001", 10)).unwrap();
        let err = Manifest::append(&path, item(1, "segments/seg_000009", 5)).unwrap_err();
        assert!(matches!(err, StrataError::DuplicateSegmentId(1)));

        // Failed append leaves the manifest untouched
        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.segments.len(), 1);
    }

    #[test]
    fn test_append_rejects_duplicate_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("manifest.json");

        Manifest::append(&path, item(1, "segments/seg_000001", 10)).unwrap();
        let err = Manifest::append(&path, item(2, "segments/seg_000001", 5)).unwrap_err();
        assert!(matches!(err, StrataError::DuplicateSegmentPath(_)));
    }

    #[test]
    fn test_write_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("manifest.json");

        Manifest::append(&path, item(1, "segments/seg_000001", 10)).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["manifest.json"]);
    }

    #[test]
    fn test_manifest_location_rule() {
        assert_eq!(
            manifest_path_for(Path::new("/data/segments")),
            PathBuf::from("/data/manifest.json")
        );
        assert_eq!(
            manifest_path_for(Path::new("/data/cold_segments")),
            PathBuf::from("/data/cold_segments/manifest.json")
        );
    }

    #[test]
    fn test_written_manifest_is_pretty_printed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("manifest.json");

        Manifest::append(&path, item(1, "segments/seg_000001", 10)).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"version\": 1"));
        assert!(text.contains("\"record_count\": 10"));
    }
}
