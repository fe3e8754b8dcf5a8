// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Item-level helpers shared by the wide-column backends.
//!
//! Primary keys are encoded as the compact JSON array of the key attribute
//! values, in `TableSpec::key_attrs` order. The encoding is the storage key
//! in both the in-memory and the redb backend.

use serde_json::Value;

use crate::backend::{Document, ScanRequest, TableSpec, TransactItem, WriteCondition};
use crate::error::{CancellationReason, StorageError, StorageResult};
use crate::query::{matches_opt, sort_order};

/// Encode the primary key of `doc` (an item or a bare key).
pub fn encode_key(spec: &TableSpec, doc: &Document) -> StorageResult<String> {
    let mut parts = Vec::with_capacity(spec.key_attrs.len());
    for attr in &spec.key_attrs {
        match doc.get(attr) {
            Some(v) if !v.is_null() => parts.push(v.clone()),
            _ => {
                return Err(StorageError::InvalidRequest(format!(
                    "missing key attribute '{attr}' for table '{}'",
                    spec.name
                )))
            }
        }
    }
    Ok(Value::Array(parts).to_string())
}

/// Encoded key addressed by a transaction item.
pub fn transact_item_key(spec: &TableSpec, item: &TransactItem) -> StorageResult<String> {
    match item {
        TransactItem::Put { item, .. } => encode_key(spec, item),
        TransactItem::Update { key, .. } | TransactItem::Delete { key, .. } => encode_key(spec, key),
    }
}

/// Whether `condition` holds given the key's current existence.
pub fn condition_holds(condition: WriteCondition, exists: bool) -> bool {
    match condition {
        WriteCondition::None => true,
        WriteCondition::KeyNotExists => !exists,
        WriteCondition::KeyExists => exists,
    }
}

/// Per-item cancellation reason for a pre-validated item.
pub fn check_reason(condition: WriteCondition, exists: bool) -> CancellationReason {
    if condition_holds(condition, exists) {
        CancellationReason::None
    } else {
        CancellationReason::ConditionalCheckFailed
    }
}

/// Apply an update to the current item (or to a fresh item built from `key`).
pub fn apply_update(
    spec: &TableSpec,
    current: Option<Document>,
    key: &Document,
    set: &Document,
    remove: &[String],
) -> Document {
    let mut item = current.unwrap_or_else(|| {
        spec.key_attrs
            .iter()
            .filter_map(|a| key.get(a).map(|v| (a.clone(), v.clone())))
            .collect()
    });
    for (k, v) in set {
        if !spec.key_attrs.contains(k) {
            item.insert(k.clone(), v.clone());
        }
    }
    for k in remove {
        if !spec.key_attrs.contains(k) {
            item.remove(k);
        }
    }
    item
}

/// Filter and order scanned items according to `request`.
///
/// `items` must be in base-table key order; that order is kept when no
/// index is requested.
pub fn scan_items(
    spec: &TableSpec,
    items: impl IntoIterator<Item = Document>,
    request: &ScanRequest,
) -> StorageResult<Vec<Document>> {
    let sort_attr = match &request.index {
        Some(name) => Some(
            spec.indexes
                .iter()
                .find(|ix| &ix.name == name)
                .map(|ix| ix.sort_attr.clone())
                .ok_or_else(|| {
                    StorageError::InvalidRequest(format!(
                        "table '{}' has no index '{name}'",
                        spec.name
                    ))
                })?,
        ),
        None => None,
    };

    let mut out = Vec::new();
    for item in items {
        if let Some(attr) = &sort_attr {
            if item.get(attr).map_or(true, Value::is_null) {
                continue;
            }
        }
        if matches_opt(&item, request.filter.as_ref())? {
            out.push(item);
        }
    }

    if let Some(attr) = &sort_attr {
        // Stable sort keeps base-key order among equal index values.
        out.sort_by(|a, b| {
            let ord = sort_order(a.get(attr), b.get(attr));
            if request.descending {
                ord.reverse()
            } else {
                ord
            }
        });
    } else if request.descending {
        out.reverse();
    }
    Ok(out)
}
