//! Schema loading from `schema.json`

use std::fs;
use std::path::Path;

use crate::Result;

use super::Schema;

impl Schema {
    /// Read, validate, and initialize a schema from a JSON file.
    ///
    /// Returns a fully initialized schema ready for use, with column
    /// indices assigned in declaration order.
    pub fn load(path: impl AsRef<Path>) -> Result<Schema> {
        let data = fs::read(path)?;
        let mut schema: Schema = serde_json::from_slice(&data)?;
        schema.validate()?;
        schema.assign_indices();
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;
    use crate::StrataError;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_valid_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("schema.json");
        fs::write(
            &path,
            r#"{
  "version": 2,
  "columns": [
    {"name": "id", "type": "string", "nullable": false},
    {"name": "age", "type": "int64", "nullable": true},
    {"name": "created_at", "type": "timestamp", "nullable": false}
  ]
}"#,
        )
        .unwrap();

        let schema = Schema::load(&path).unwrap();
        assert_eq!(schema.version, 2);
        assert_eq!(schema.columns.len(), 3);
        assert_eq!(schema.columns[1].name, "age");
        assert_eq!(schema.columns[1].column_type, ColumnType::Int64);
        assert!(schema.columns[1].nullable);
        assert_eq!(schema.columns[2].index, 2);
    }

    #[test]
    fn test_load_unknown_type_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("schema.json");
        fs::write(
            &path,
            r#"{"version": 1, "columns": [{"name": "v", "type": "decimal", "nullable": false}]}"#,
        )
        .unwrap();

        let err = Schema::load(&path).unwrap_err();
        assert!(matches!(err, StrataError::Json(_)));
    }

    #[test]
    fn test_load_invalid_structure_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("schema.json");
        fs::write(&path, r#"{"version": 0, "columns": [{"name": "v", "type": "int64", "nullable": false}]}"#)
            .unwrap();

        let err = Schema::load(&path).unwrap_err();
        assert!(matches!(err, StrataError::InvalidSchema(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = Schema::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, StrataError::Io(_)));
    }
}
