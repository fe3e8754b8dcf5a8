// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Content checksum of a business object.
//!
//! The checksum is the hex MD5 of a canonical JSON encoding of
//! `[id, tver, tcre, data, extras]`. Object keys are emitted in sorted order
//! regardless of how the input maps were built, so the digest is stable
//! across processes and serde_json feature sets. `tupd` never participates.

use md5::{Digest, Md5};
use serde_json::{Map, Value};

/// Rebuild `v` with every object's keys inserted in sorted order.
pub fn canonicalize(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = Map::with_capacity(map.len());
            for k in keys {
                out.insert(k.clone(), canonicalize(&map[k]));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Canonical compact JSON text of `v`.
pub fn canonical_json(v: &Value) -> String {
    canonicalize(v).to_string()
}

/// Compute the content checksum.
///
/// `time_created` must already be rounded and formatted in UTC.
pub fn compute(
    id: &str,
    tag_version: u64,
    time_created: &str,
    data: &Value,
    extras: &Map<String, Value>,
) -> String {
    let payload = Value::Array(vec![
        Value::from(id),
        Value::from(tag_version),
        Value::from(time_created),
        data.clone(),
        Value::Object(extras.clone()),
    ]);
    let mut hasher = Md5::new();
    hasher.update(canonical_json(&payload).as_bytes());
    hex::encode(hasher.finalize())
}
