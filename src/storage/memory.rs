//! Volatile backend. Contents survive close/open cycles of the same instance.

use serde_json::Value;
use std::sync::RwLock;

use crate::storage::{Storage, StorageError, Tables};

#[derive(Debug, Default)]
struct State {
    open: bool,
    tables: Tables,
}

/// In-process storage backend.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: RwLock<State>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> Result<T, StorageError>) -> Result<T, StorageError> {
        let state = self.state.read().expect("memory storage lock poisoned");
        if !state.open {
            return Err(StorageError::NotOpen);
        }
        f(&state.tables)
    }

    fn write<T>(&self, f: impl FnOnce(&mut Tables) -> Result<T, StorageError>) -> Result<T, StorageError> {
        let mut state = self.state.write().expect("memory storage lock poisoned");
        if !state.open {
            return Err(StorageError::NotOpen);
        }
        f(&mut state.tables)
    }
}

impl Storage for MemoryStorage {
    fn open(&self) -> Result<(), StorageError> {
        let mut state = self.state.write().expect("memory storage lock poisoned");
        if state.open {
            return Err(StorageError::AlreadyOpen);
        }
        state.open = true;
        Ok(())
    }

    fn close(&self) -> Result<(), StorageError> {
        let mut state = self.state.write().expect("memory storage lock poisoned");
        if !state.open {
            return Err(StorageError::NotOpen);
        }
        state.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.state.read().expect("memory storage lock poisoned").open
    }

    fn put_value(&self, kind: &str, key: &str, value: Value) -> Result<(), StorageError> {
        self.write(|tables| {
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
        self.write(|tables| tables.delete(kind, key))
    }
}
