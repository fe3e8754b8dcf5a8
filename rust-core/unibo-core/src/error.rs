// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Error types for the universal business object model.
//
// Covers malformed attribute paths, paths that collide with existing scalar
// nodes, failed typed conversions and unparseable JSON or timestamp input.

use thiserror::Error;

/// Result alias for business-object operations.
pub type BoResult<T> = Result<T, BoError>;

/// Errors raised while reading or mutating a [`crate::UniversalBo`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BoError {
    /// The dotted path could not be parsed (e.g. `a..b`, `a[x]`).
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// The offending path.
        path: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The tree holds a node whose shape cannot host the requested path.
    #[error("path '{path}' conflicts with existing {found} node")]
    PathConflict {
        /// The path being written.
        path: String,
        /// JSON type of the node that blocked the write.
        found: &'static str,
    },

    /// A value could not be converted to the requested type.
    #[error("cannot convert {value} to {target}")]
    Conversion {
        /// Rendered source value.
        value: String,
        /// Name of the requested target type.
        target: &'static str,
    },

    /// An extra attribute was given the name of a canonical field.
    #[error("'{0}' is a reserved field name")]
    ReservedField(String),

    /// A string that should hold a JSON document did not parse.
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    /// A string that should hold an instant did not parse.
    #[error("invalid timestamp '{value}': {reason}")]
    InvalidTimestamp {
        /// The rejected input.
        value: String,
        /// Parser message.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_path_display() {
        let err = BoError::InvalidPath {
            path: "a..b".to_string(),
            reason: "empty segment".to_string(),
        };
        assert_eq!(err.to_string(), "invalid path 'a..b': empty segment");
    }

    #[test]
    fn test_conflict_display() {
        let err = BoError::PathConflict {
            path: "name.first".to_string(),
            found: "string",
        };
        assert!(err.to_string().contains("string node"));
    }

    #[test]
    fn test_conversion_display() {
        let err = BoError::Conversion {
            value: "\"abc\"".to_string(),
            target: "i64",
        };
        assert!(err.to_string().contains("to i64"));
    }
}
