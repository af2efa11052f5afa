//! Key-value storage subsystem.
//!
//! # Data Flow
//! ```text
//! Entity (Account, ...)
//!     → StorageExt (typed put/get/list/delete, serde_json values)
//!     → Storage (object-safe backend contract)
//!     → memory.rs (tests) | file.rs (JSON document on disk)
//! ```
//!
//! # Design Decisions
//! - Backends are opened and closed explicitly; every operation on a closed
//!   backend fails with `NotOpen`
//! - Backends synchronize internally and are shared via Arc once open
//! - Records are grouped by entity kind; keys are unique within a kind

pub mod file;
pub mod memory;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage is not open")]
    NotOpen,
    #[error("storage is already open")]
    AlreadyOpen,
    #[error("{kind} {key:?} not found")]
    NotFound { kind: String, key: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

/// A record that can be stored under a string key.
pub trait Entity: Serialize + DeserializeOwned {
    /// Table the entity lives in.
    const KIND: &'static str;

    /// Unique key within [`KIND`](Self::KIND).
    fn key(&self) -> &str;
}

/// Backend contract. Must tolerate repeated open/close cycles.
pub trait Storage: Send + Sync {
    fn open(&self) -> Result<(), StorageError>;
    fn close(&self) -> Result<(), StorageError>;
    fn is_open(&self) -> bool;

    fn put_value(&self, kind: &str, key: &str, value: Value) -> Result<(), StorageError>;
    /// Fails with `NotFound` if absent.
    fn get_value(&self, kind: &str, key: &str) -> Result<Value, StorageError>;
    /// Keys of `kind`, sorted.
    fn list(&self, kind: &str) -> Result<Vec<String>, StorageError>;
    /// Fails with `NotFound` if absent.
    fn delete_key(&self, kind: &str, key: &str) -> Result<(), StorageError>;
}

/// Typed helpers over any [`Storage`].
pub trait StorageExt: Storage {
    fn put<E: Entity>(&self, entity: &E) -> Result<(), StorageError> {
        let value = serde_json::to_value(entity)?;
        self.put_value(E::KIND, entity.key(), value)
    }

    fn get<E: Entity>(&self, key: &str) -> Result<E, StorageError> {
        let value = self.get_value(E::KIND, key)?;
        Ok(serde_json::from_value(value)?)
    }

    fn list_keys<E: Entity>(&self) -> Result<Vec<String>, StorageError> {
        self.list(E::KIND)
    }

    fn delete<E: Entity>(&self, entity: &E) -> Result<(), StorageError> {
        self.delete_key(E::KIND, entity.key())
    }
}

impl<S: Storage + ?Sized> StorageExt for S {}

/// In-memory table set shared by the backends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, serde::Deserialize)]
#[serde(transparent)]
pub(crate) struct Tables(BTreeMap<String, BTreeMap<String, Value>>);

impl Tables {
    pub(crate) fn put(&mut self, kind: &str, key: &str, value: Value) {
        self.0
            .entry(kind.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    pub(crate) fn get(&self, kind: &str, key: &str) -> Result<Value, StorageError> {
        self.0
            .get(kind)
            .and_then(|table| table.get(key))
            .cloned()
            .ok_or_else(|| not_found(kind, key))
    }

    pub(crate) fn list(&self, kind: &str) -> Vec<String> {
        self.0
            .get(kind)
            .map(|table| table.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn delete(&mut self, kind: &str, key: &str) -> Result<(), StorageError> {
        let removed = self.0.get_mut(kind).and_then(|table| table.remove(key));
        match removed {
            Some(_) => Ok(()),
            None => Err(not_found(kind, key)),
        }
    }
}

fn not_found(kind: &str, key: &str) -> StorageError {
    StorageError::NotFound {
        kind: kind.to_string(),
        key: key.to_string(),
    }
}
