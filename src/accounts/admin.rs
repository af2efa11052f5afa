//! One-shot account administration.
//!
//! Every operation runs in its own storage session: open, one logical
//! operation, close. The session closes on every exit path, including early
//! returns and panics, and a close failure is reported like any other failure.

use std::sync::Arc;

use crate::accounts::Account;
use crate::storage::{Entity, Storage, StorageError, StorageExt};

/// Error type for account administration.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    /// The operator did not supply an email address.
    #[error("Please provide an email address!")]
    MissingEmail,
    #[error("Account {0:?} not found")]
    NotFound(String),
    #[error("Storage error: {0}")]
    Storage(StorageError),
    #[error("Failed to render account: {0}")]
    Render(#[from] serde_json::Error),
}

impl AdminError {
    /// True for operator mistakes, as opposed to backend failures.
    pub fn is_input_error(&self) -> bool {
        matches!(self, AdminError::MissingEmail)
    }
}

impl From<StorageError> for AdminError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { key, .. } => AdminError::NotFound(key),
            other => AdminError::Storage(other),
        }
    }
}

/// Result of listing accounts.
#[derive(Debug, Clone, PartialEq)]
pub enum ListOutcome {
    /// The store holds no accounts. Informational, not a failure.
    Empty,
    Accounts(Vec<String>),
}

/// An open storage session. Closes the backend when finished or dropped.
struct Session<'a> {
    storage: &'a dyn Storage,
    closed: bool,
}

impl<'a> Session<'a> {
    fn open(storage: &'a dyn Storage) -> Result<Self, StorageError> {
        storage.open()?;
        Ok(Self {
            storage,
            closed: false,
        })
    }

    fn finish(mut self) -> Result<(), StorageError> {
        self.closed = true;
        self.storage.close()
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.storage.close() {
                tracing::error!(error = %e, "Failed to close storage session");
            }
        }
    }
}

/// Administrative facade over the account store.
#[derive(Clone)]
pub struct AccountAdmin {
    storage: Arc<dyn Storage>,
}

impl AccountAdmin {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Run `op` inside a fresh session. The operation's own error wins over a close error.
    fn with_session<T>(&self, op: impl FnOnce(&dyn Storage) -> Result<T, AdminError>) -> Result<T, AdminError> {
        let session = Session::open(self.storage.as_ref())?;
        let result = op(session.storage);
        let closed = session.finish();

        match (result, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(close_err)) => Err(close_err.into()),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_err)) => {
                tracing::error!(error = %close_err, "Failed to close storage after failed operation");
                Err(e)
            }
        }
    }

    pub fn list(&self) -> Result<ListOutcome, AdminError> {
        let keys = self.with_session(|storage| Ok(storage.list_keys::<Account>()?))?;
        if keys.is_empty() {
            Ok(ListOutcome::Empty)
        } else {
            Ok(ListOutcome::Accounts(keys))
        }
    }

    /// Create (or silently replace) the account for `email`.
    pub fn create(&self, email: &str) -> Result<Account, AdminError> {
        let email = require_email(email)?;
        let account = Account::new(email);

        self.with_session(|storage| {
            storage.put(&account)?;
            Ok(())
        })?;

        tracing::info!(email = %account.email, "Account created");
        Ok(account)
    }

    pub fn display(&self, email: &str) -> Result<Account, AdminError> {
        let email = require_email(email)?;
        self.with_session(|storage| Ok(storage.get::<Account>(email)?))
    }

    pub fn delete(&self, email: &str) -> Result<(), AdminError> {
        let email = require_email(email)?;

        self.with_session(|storage| {
            storage.delete_key(Account::KIND, email)?;
            Ok(())
        })?;

        tracing::info!(email = %email, "Account deleted");
        Ok(())
    }
}

fn require_email(email: &str) -> Result<&str, AdminError> {
    if email.trim().is_empty() {
        Err(AdminError::MissingEmail)
    } else {
        Ok(email)
    }
}
