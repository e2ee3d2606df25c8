//! String column writer with dictionary encoding.
//!
//! Three files per column: `<name>.ids.bin` holds one 4-byte LE unsigned
//! dictionary id per record, `<name>.dict.bin` the dictionary entries in
//! id order as `[u32 len][UTF-8 bytes]`, and `<name>.nulls.bin` the null
//! bitmap. Id 0 is reserved for NULL; real ids start at 1 in first-seen
//! order. Dictionary encoding assumes the low cardinality typical of
//! analytical string columns.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use ahash::AHashMap;
use byteorder::{LittleEndian, WriteBytesExt};

use crate::data::Value;
use crate::{Result, StrataError};

use super::bitmap::{open_exclusive, BitmapWriter};
use super::ColumnWriter;

pub struct StringWriter {
    column: String,
    ids: BufWriter<File>,
    dict: BufWriter<File>,
    nulls: BitmapWriter,

    // Insertion-order dictionary; ids are offsets into `entries` plus 1
    id_by_string: AHashMap<String, u32>,
    entries: Vec<String>,

    count: u64,
    null_count: u64,
    sync: bool,
    closed: bool,
}

impl StringWriter {
    /// Create a new string column writer in `dir`, failing if any of the
    /// three target files already exists.
    pub fn create(dir: &Path, column: &str, sync: bool) -> Result<Self> {
        let ids_path = dir.join(format!("{column}.ids.bin"));
        let dict_path = dir.join(format!("{column}.dict.bin"));
        let nulls_path = dir.join(format!("{column}.nulls.bin"));

        let ids = BufWriter::new(open_exclusive(&ids_path)?);
        let dict = BufWriter::new(open_exclusive(&dict_path)?);
        let nulls = BitmapWriter::create_new(&nulls_path)?;

        Ok(Self {
            column: column.to_string(),
            ids,
            dict,
            nulls,
            id_by_string: AHashMap::new(),
            entries: Vec::new(),
            count: 0,
            null_count: 0,
            sync,
            closed: false,
        })
    }

    fn intern(&mut self, s: &str) -> u32 {
        if let Some(&id) = self.id_by_string.get(s) {
            return id;
        }
        // Id 0 is reserved for NULL; real ids start at 1.
        let id = self.entries.len() as u32 + 1;
        self.id_by_string.insert(s.to_string(), id);
        self.entries.push(s.to_string());
        id
    }
}

impl ColumnWriter for StringWriter {
    fn write(&mut self, value: &Value) -> Result<()> {
        if self.closed {
            return Err(StrataError::WriterClosed(self.column.clone()));
        }

        match value {
            Value::Null => {
                self.null_count += 1;
                self.nulls.push(false)?;
                self.ids.write_u32::<LittleEndian>(0)?;
            }
            Value::String(s) => {
                self.nulls.push(true)?;
                let id = self.intern(s);
                self.ids.write_u32::<LittleEndian>(id)?;
            }
            other => {
                return Err(StrataError::TypeMismatch {
                    column: self.column.clone(),
                    expected: "string",
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

        // Serialize the dictionary in id order, length-prefixed
        for entry in &self.entries {
            self.dict.write_u32::<LittleEndian>(entry.len() as u32)?;
            self.dict.write_all(entry.as_bytes())?;
        }

        self.ids.flush()?;
        self.dict.flush()?;
        if self.sync {
            self.ids.get_ref().sync_all()?;
            self.dict.get_ref().sync_all()?;
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

    fn dictionary_size(&self) -> Option<u64> {
        Some(self.entries.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn read_dict(raw: &[u8]) -> Vec<String> {
        let mut words = Vec::new();
        let mut pos = 0;
        while pos < raw.len() {
            let len = u32::from_le_bytes(raw[pos..pos + 4].try_into().unwrap()) as usize;
            pos += 4;
            words.push(String::from_utf8(raw[pos..pos + len].to_vec()).unwrap());
            pos += len;
        }
        words
    }

    #[test]
    fn test_dictionary_ids_and_nulls() {
        let dir = tempdir().unwrap();
        let mut w = StringWriter::create(dir.path(), "name", false).unwrap();

        for v in [
            Value::Null,
            Value::from("alpha"),
            Value::from("beta"),
            Value::from("alpha"),
        ] {
            w.write(&v).unwrap();
        }
        w.close().unwrap();

        let raw = fs::read(dir.path().join("name.ids.bin")).unwrap();
        assert_eq!(raw.len(), 16);
        let ids: Vec<u32> = raw
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
            .collect();
        assert_eq!(ids, vec![0, 1, 2, 1]);

        assert_eq!(
            fs::read(dir.path().join("name.nulls.bin")).unwrap(),
            vec![0b01110000]
        );

        let dict = read_dict(&fs::read(dir.path().join("name.dict.bin")).unwrap());
        assert_eq!(dict, vec!["alpha", "beta"]);

        assert_eq!(w.record_count(), 4);
        assert_eq!(w.null_count(), 1);
        assert_eq!(w.dictionary_size(), Some(2));
    }

    #[test]
    fn test_empty_string_is_a_valid_entry() {
        let dir = tempdir().unwrap();
        let mut w = StringWriter::create(dir.path(), "tag", false).unwrap();

        w.write(&Value::from("")).unwrap();
        w.write(&Value::from("x")).unwrap();
        w.write(&Value::from("")).unwrap();
        w.close().unwrap();

        let raw = fs::read(dir.path().join("tag.ids.bin")).unwrap();
        let ids: Vec<u32> = raw
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
            .collect();
        assert_eq!(ids, vec![1, 2, 1]);

        let dict = read_dict(&fs::read(dir.path().join("tag.dict.bin")).unwrap());
        assert_eq!(dict, vec!["", "x"]);
        assert_eq!(w.dictionary_size(), Some(2));
    }

    #[test]
    fn test_empty_dictionary_when_all_null() {
        let dir = tempdir().unwrap();
        let mut w = StringWriter::create(dir.path(), "name", false).unwrap();

        w.write(&Value::Null).unwrap();
        w.close().unwrap();

        assert!(fs::read(dir.path().join("name.dict.bin")).unwrap().is_empty());
        assert_eq!(w.dictionary_size(), Some(0));
    }

    #[test]
    fn test_double_close() {
        let dir = tempdir().unwrap();
        let mut w = StringWriter::create(dir.path(), "name", false).unwrap();
        w.close().unwrap();

        let err = w.close().unwrap_err();
        assert!(matches!(err, StrataError::WriterAlreadyClosed(c) if c == "name"));
    }
}
