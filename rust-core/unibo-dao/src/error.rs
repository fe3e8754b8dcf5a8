// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DAO error taxonomy.
//
// A missing row is never an error: `get` returns `None` and `update`/`delete`
// return `false`. Everything else falls into one of the kinds below.
// Duplicate detection is a normal outcome callers are expected to branch on.

use thiserror::Error;
use unibo_core::BoError;
use unibo_storage::StorageError;

/// Result alias for DAO operations.
pub type DaoResult<T> = Result<T, DaoError>;

/// Errors returned by the DAOs.
#[derive(Debug, Error)]
pub enum DaoError {
    /// A primary key or unique group already holds the written value.
    #[error("duplicated entry: {0}")]
    DuplicatedEntry(String),

    /// The backend failed; propagated unchanged.
    #[error("backend error: {0}")]
    Backend(StorageError),

    /// A row could not be translated to or from a BO.
    #[error("mapping error: {0}")]
    Mapping(String),

    /// The DAO is misconfigured (hash pair, partition key, table names).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A filter the backend cannot express (unmapped field, raw predicate).
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
}

impl DaoError {
    /// True for [`DaoError::DuplicatedEntry`].
    pub fn is_duplicated_entry(&self) -> bool {
        matches!(self, DaoError::DuplicatedEntry(_))
    }
}

impl From<StorageError> for DaoError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::DuplicateKey(msg) => DaoError::DuplicatedEntry(msg),
            other => DaoError::Backend(other),
        }
    }
}

impl From<BoError> for DaoError {
    fn from(err: BoError) -> Self {
        DaoError::Mapping(err.to_string())
    }
}
