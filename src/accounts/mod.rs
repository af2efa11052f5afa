//! Account records and their administrative operations.
//!
//! The core only knows an account by its email address; every other field is
//! owned by the application handler and carried through untouched.

pub mod admin;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::storage::Entity;

pub use admin::{AccountAdmin, AdminError, ListOutcome};

/// A stored account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique key in the backing store.
    pub email: String,

    /// Creation time, seconds since epoch.
    #[serde(default)]
    pub created: u64,

    /// Fields owned by the application handler.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Account {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            created: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            extra: Map::new(),
        }
    }

    /// Human-readable dump of the full record.
    pub fn render(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Entity for Account {
    const KIND: &'static str = "account";

    fn key(&self) -> &str {
        &self.email
    }
}
