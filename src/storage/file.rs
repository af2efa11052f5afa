//! Durable backend: a single JSON document under the configured directory.
//!
//! # Responsibilities
//! - Load the document on open, drop it from memory on close
//! - Persist every mutation before acknowledging it
//!
//! # Design Decisions
//! - Write-then-rename so a crash never leaves a torn document behind
//! - One RwLock guards both the in-memory copy and the file

use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::storage::{Storage, StorageError, Tables};

const DATA_FILE: &str = "keyhold.json";

/// JSON-file storage backend.
#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
    tables: RwLock<Option<Tables>>,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            tables: RwLock::new(None),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn data_path(&self) -> PathBuf {
        self.dir.join(DATA_FILE)
    }

    fn load(&self) -> Result<Tables, StorageError> {
        let path = self.data_path();
        if !path.exists() {
            return Ok(Tables::default());
        }
        let reader = BufReader::new(File::open(&path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    fn persist(&self, tables: &Tables) -> Result<(), StorageError> {
        let path = self.data_path();
        let tmp = path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer(&mut writer, tables)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut Tables) -> Result<T, StorageError>) -> Result<T, StorageError> {
        let mut guard = self.tables.write().expect("file storage lock poisoned");
        let tables = guard.as_mut().ok_or(StorageError::NotOpen)?;

        // Apply to a copy so a failed write leaves memory and disk in agreement
        let mut next = tables.clone();
        let out = f(&mut next)?;
        self.persist(&next)?;
        *tables = next;
        Ok(out)
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> Result<T, StorageError>) -> Result<T, StorageError> {
        let guard = self.tables.read().expect("file storage lock poisoned");
        let tables = guard.as_ref().ok_or(StorageError::NotOpen)?;
        f(tables)
    }
}

impl Storage for FileStorage {
    fn open(&self) -> Result<(), StorageError> {
        let mut guard = self.tables.write().expect("file storage lock poisoned");
        if guard.is_some() {
            return Err(StorageError::AlreadyOpen);
        }
        fs::create_dir_all(&self.dir)?;
        let tables = self.load()?;
        *guard = Some(tables);
        tracing::debug!(path = %self.dir.display(), "Storage opened");
        Ok(())
    }

    fn close(&self) -> Result<(), StorageError> {
        let mut guard = self.tables.write().expect("file storage lock poisoned");
        match guard.take() {
            Some(_) => {
                tracing::debug!(path = %self.dir.display(), "Storage closed");
                Ok(())
            }
            None => Err(StorageError::NotOpen),
        }
    }

    fn is_open(&self) -> bool {
        self.tables.read().expect("file storage lock poisoned").is_some()
    }

    fn put_value(&self, kind: &str, key: &str, value: Value) -> Result<(), StorageError> {
        self.mutate(|tables| {
            tables.put(kind, key, value);
            Ok(())
        })
    }

    fn get_value(&self, kind: &str, key: &str) -> Result<Value, StorageError> {
        self.read(|tables| tables.get(kind, key))
    }

    fn list(&self, kind: &str) -> Result<Vec<String>, StorageError> {
        self.read(|tables| Ok(tables.list(kind)))
    }

    fn delete_key(&self, kind: &str, key: &str) -> Result<(), StorageError> {
        self.mutate(|tables| tables.delete(kind, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();

        let storage = FileStorage::new(dir.path());
        storage.open().unwrap();
        storage
            .put_value("account", "a@b.com", json!({"email": "a@b.com"}))
            .unwrap();
        storage.close().unwrap();

        let reopened = FileStorage::new(dir.path());
        reopened.open().unwrap();
        assert_eq!(
            reopened.get_value("account", "a@b.com").unwrap(),
            json!({"email": "a@b.com"})
        );
        assert!(!dir.path().join("keyhold.json.tmp").exists());
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested").join("db");

        let storage = FileStorage::new(&nested);
        storage.open().unwrap();
        assert!(nested.is_dir());
        assert!(storage.list("account").unwrap().is_empty());
    }

    #[test]
    fn test_delete_missing_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        storage.open().unwrap();
        storage.put_value("account", "x@y.com", json!({})).unwrap();

        let err = storage.delete_key("account", "nobody@y.com").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(storage.list("account").unwrap(), vec!["x@y.com".to_string()]);
    }

    #[test]
    fn test_corrupt_document_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(DATA_FILE), "{not json").unwrap();

        let storage = FileStorage::new(dir.path());
        assert!(matches!(storage.open(), Err(StorageError::Serde(_))));
        assert!(!storage.is_open());
    }

    #[test]
    fn test_closed_storage_rejects_operations() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(matches!(
            storage.put_value("account", "a", json!({})),
            Err(StorageError::NotOpen)
        ));
    }
}
