// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Persistence errors, classified at the source.
//!
//! The bootstrap sequence decides between degrading and aborting from the
//! variant alone; nothing downstream inspects error text.

use std::io;

/// Error returned by persistence and seeding collaborators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    /// The database could not be reached. Presumed transient.
    #[error("database unreachable: {0}")]
    Connectivity(String),

    /// Any other failure (corruption, schema, serialization).
    #[error("database error: {0}")]
    Other(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

impl PersistenceError {
    pub fn connectivity(reason: impl Into<String>) -> Self {
        PersistenceError::Connectivity(reason.into())
    }

    pub fn other(reason: impl Into<String>) -> Self {
        PersistenceError::Other(reason.into())
    }

    pub fn is_connectivity(&self) -> bool {
        matches!(self, PersistenceError::Connectivity(_))
    }
}

impl From<redb::StorageError> for PersistenceError {
    fn from(e: redb::StorageError) -> Self {
        match e {
            // The backing file went away or became unreadable.
            redb::StorageError::Io(io) => PersistenceError::Connectivity(io.to_string()),
            other => PersistenceError::Other(other.to_string()),
        }
    }
}

impl From<redb::DatabaseError> for PersistenceError {
    fn from(e: redb::DatabaseError) -> Self {
        match e {
            // Another process holds the file lock.
            redb::DatabaseError::DatabaseAlreadyOpen => {
                PersistenceError::connectivity("database is already open by another process")
            }
            redb::DatabaseError::Storage(storage) => storage.into(),
            other => PersistenceError::Other(other.to_string()),
        }
    }
}

impl From<redb::TransactionError> for PersistenceError {
    fn from(e: redb::TransactionError) -> Self {
        match e {
            redb::TransactionError::Storage(storage) => storage.into(),
            other => PersistenceError::Other(other.to_string()),
        }
    }
}

impl From<redb::TableError> for PersistenceError {
    fn from(e: redb::TableError) -> Self {
        match e {
            redb::TableError::Storage(storage) => storage.into(),
            other => PersistenceError::Other(other.to_string()),
        }
    }
}

impl From<redb::CommitError> for PersistenceError {
    fn from(e: redb::CommitError) -> Self {
        match e {
            redb::CommitError::Storage(storage) => storage.into(),
            other => PersistenceError::Other(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(e: serde_json::Error) -> Self {
        PersistenceError::Other(format!("serialization error: {e}"))
    }
}

impl From<io::Error> for PersistenceError {
    fn from(e: io::Error) -> Self {
        PersistenceError::Connectivity(e.to_string())
    }
}
