// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Uniqueness-index fingerprints and cancellation classification.
//!
//! A unique group `[f1, .., fk]` of a row is identified in the uidx table by
//!
//! ```text
//! uname = "f1|..|fk"
//! uhash = hex(H1(h1(v1)|..|h1(vk))) + "|" + hex(H2(h2(v1)|..|h2(vk)))
//! ```
//!
//! where `vi` is the canonical JSON of the row's value for `fi` (`null` when
//! absent) and `h1`/`h2` are the hex digests under `H1`/`H2`. Two different
//! hash functions make a false collision require a collision in both.

use md5::Md5;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use unibo_core::checksum::canonical_json;
use unibo_storage::{CancellationReason, StorageError};

use crate::mapper::Row;

/// Hash function used for fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Sha1,
    Md5,
    Sha256,
}

impl HashAlgorithm {
    /// Lowercase hex digest of `input`.
    pub fn hex_digest(self, input: &[u8]) -> String {
        match self {
            HashAlgorithm::Sha1 => hex::encode(Sha1::digest(input)),
            HashAlgorithm::Md5 => hex::encode(Md5::digest(input)),
            HashAlgorithm::Sha256 => hex::encode(Sha256::digest(input)),
        }
    }
}

/// Primary key of a uidx row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub uname: String,
    pub uhash: String,
}

/// Fingerprint of one unique group of `row`.
pub fn fingerprint(group: &[String], row: &Row, h1: HashAlgorithm, h2: HashAlgorithm) -> Fingerprint {
    let values: Vec<String> = group
        .iter()
        .map(|f| canonical_json(row.get(f).unwrap_or(&Value::Null)))
        .collect();
    let per_field = |h: HashAlgorithm| {
        values
            .iter()
            .map(|v| h.hex_digest(v.as_bytes()))
            .collect::<Vec<_>>()
            .join("|")
    };
    Fingerprint {
        uname: group.join("|"),
        uhash: format!(
            "{}|{}",
            h1.hex_digest(per_field(h1).as_bytes()),
            h2.hex_digest(per_field(h2).as_bytes())
        ),
    }
}

/// Fingerprints of every configured group, in group order.
pub fn fingerprints(
    groups: &[Vec<String>],
    row: &Row,
    h1: HashAlgorithm,
    h2: HashAlgorithm,
) -> Vec<Fingerprint> {
    groups.iter().map(|g| fingerprint(g, row, h1, h2)).collect()
}

/// Outcome class of a failed uidx transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cancellation {
    /// The main-row item's condition failed.
    MainRowCondition,
    /// A uidx item's condition failed (unique group taken).
    UniqueViolation,
    /// Anything else: transport errors, validation errors, other codes.
    Other,
}

/// Classify a transactional-write error. `main_index` is the position of the
/// main-row item in the submitted list.
pub fn classify_cancellation(err: &StorageError, main_index: usize) -> Cancellation {
    let StorageError::TransactionCanceled { reasons } = err else {
        return Cancellation::Other;
    };
    let failed = |r: &CancellationReason| *r == CancellationReason::ConditionalCheckFailed;
    if reasons.get(main_index).is_some_and(failed) {
        Cancellation::MainRowCondition
    } else if reasons.iter().any(failed) {
        Cancellation::UniqueViolation
    } else {
        Cancellation::Other
    }
}
