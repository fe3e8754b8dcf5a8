// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Storage error types for the universal persistence layer.
//
// Provides a unified error enum covering the failure modes a backend client
// may report: I/O errors, unique-key violations, cancelled transactions with
// per-item reasons, failed conditional writes, malformed requests, data
// corruption and backend unavailability.

use std::fmt;

use thiserror::Error;

/// Result alias for backend operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Why a single item of a transactional write was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancellationReason {
    /// The item was fine; another item cancelled the transaction.
    None,
    /// The item's write condition did not hold.
    ConditionalCheckFailed,
    /// The item was malformed (unknown table, missing key attribute, ...).
    ValidationError(String),
    /// Any other backend-specific code.
    Other(String),
}

impl fmt::Display for CancellationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::ConditionalCheckFailed => write!(f, "ConditionalCheckFailed"),
            Self::ValidationError(msg) => write!(f, "ValidationError({msg})"),
            Self::Other(code) => write!(f, "{code}"),
        }
    }
}

fn render_reasons(reasons: &[CancellationReason]) -> String {
    reasons
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors that can occur when interacting with a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred in the underlying storage layer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A primary key or unique index already holds the written value.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// A transactional write was cancelled; one reason per submitted item.
    #[error("transaction canceled: [{}]", render_reasons(.reasons))]
    TransactionCanceled {
        /// Reasons, positionally aligned with the submitted items.
        reasons: Vec<CancellationReason>,
    },

    /// A single conditional write did not meet its condition.
    #[error("conditional check failed: {0}")]
    ConditionalCheckFailed(String),

    /// The addressed table or collection does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request itself is malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Failed to serialize or deserialize a value.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// The stored data is corrupted or in an unexpected format.
    #[error("corrupted data: {0}")]
    CorruptedData(String),

    /// The storage backend is not available (e.g., connection lost).
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::SerializationError(err.to_string())
    }
}
