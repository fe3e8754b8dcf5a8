// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Native predicate language of the bundled document and wide-column backends.
//!
//! Predicates are JSON objects in the familiar document-store shape:
//!
//! ```text
//! {"email": "a@b"}                         equality shorthand
//! {"age": {"$gte": 3, "$lt": 9}}           operators, implicitly AND-ed
//! {"$and": [ {...}, {...} ]}               conjunction
//! {"$or":  [ {...}, {...} ]}               disjunction
//! {"name.first": "Thanh"}                  dotted paths into nested objects
//! ```
//!
//! Supported operators: `$eq`, `$ne`, `$lt`, `$lte`, `$gt`, `$gte`, `$in`.
//! Comparisons between values of different JSON types are false (except
//! `$ne`, which is true).

use std::cmp::Ordering;

use serde_json::{Map, Value};

use crate::error::{StorageError, StorageResult};

/// Resolve a dotted path inside a document.
pub fn lookup<'a>(doc: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    if let Some(v) = doc.get(path) {
        return Some(v);
    }
    let mut parts = path.split('.');
    let mut node = doc.get(parts.next()?)?;
    for part in parts {
        node = node.as_object()?.get(part)?;
    }
    Some(node)
}

/// Compare two values of the same JSON type.
///
/// Returns `None` when the values are not comparable.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
        },
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
            if a == b {
                Some(Ordering::Equal)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn type_rank(v: Option<&Value>) -> u8 {
    match v {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
    }
}

/// Total order used for sorting: missing/null < bool < number < string < array < object.
pub fn sort_order(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let (ra, rb) = (type_rank(a), type_rank(b));
    if ra != rb {
        return ra.cmp(&rb);
    }
    match (a, b) {
        (Some(x), Some(y)) => compare_values(x, y).unwrap_or_else(|| x.to_string().cmp(&y.to_string())),
        _ => Ordering::Equal,
    }
}

/// Sort documents in place by a list of `(field, descending)` keys.
pub fn sort_documents(docs: &mut [Map<String, Value>], sort: &[(String, bool)]) {
    if sort.is_empty() {
        return;
    }
    docs.sort_by(|a, b| {
        for (field, descending) in sort {
            let ord = sort_order(lookup(a, field), lookup(b, field));
            let ord = if *descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

fn bad(msg: impl Into<String>) -> StorageError {
    StorageError::InvalidRequest(msg.into())
}

fn eval_operator(op: &str, actual: Option<&Value>, expected: &Value) -> StorageResult<bool> {
    let cmp = || actual.and_then(|a| compare_values(a, expected));
    Ok(match op {
        "$eq" => cmp() == Some(Ordering::Equal),
        "$ne" => cmp() != Some(Ordering::Equal),
        "$lt" => cmp() == Some(Ordering::Less),
        "$lte" => matches!(cmp(), Some(Ordering::Less | Ordering::Equal)),
        "$gt" => cmp() == Some(Ordering::Greater),
        "$gte" => matches!(cmp(), Some(Ordering::Greater | Ordering::Equal)),
        "$in" => {
            let options = expected
                .as_array()
                .ok_or_else(|| bad("$in expects an array"))?;
            options
                .iter()
                .any(|o| actual.and_then(|a| compare_values(a, o)) == Some(Ordering::Equal))
        }
        other => return Err(bad(format!("unsupported operator '{other}'"))),
    })
}

fn eval_field(doc: &Map<String, Value>, field: &str, cond: &Value) -> StorageResult<bool> {
    let actual = lookup(doc, field);
    match cond {
        Value::Object(ops) if !ops.is_empty() && ops.keys().all(|k| k.starts_with('$')) => {
            for (op, expected) in ops {
                if !eval_operator(op, actual, expected)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        literal => eval_operator("$eq", actual, literal),
    }
}

/// Evaluate a predicate against a document.
pub fn matches(doc: &Map<String, Value>, predicate: &Value) -> StorageResult<bool> {
    let clauses = predicate
        .as_object()
        .ok_or_else(|| bad("predicate must be a JSON object"))?;
    for (key, cond) in clauses {
        let ok = match key.as_str() {
            "$and" | "$or" => {
                let parts = cond
                    .as_array()
                    .ok_or_else(|| bad(format!("{key} expects an array")))?;
                let mut results = Vec::with_capacity(parts.len());
                for part in parts {
                    results.push(matches(doc, part)?);
                }
                if key == "$and" {
                    results.iter().all(|r| *r)
                } else {
                    results.iter().any(|r| *r)
                }
            }
            other if other.starts_with('$') => {
                return Err(bad(format!("unsupported logical operator '{other}'")))
            }
            field => eval_field(doc, field, cond)?,
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Evaluate an optional predicate; `None` matches everything.
pub fn matches_opt(doc: &Map<String, Value>, predicate: Option<&Value>) -> StorageResult<bool> {
    match predicate {
        Some(p) => matches(doc, p),
        None => Ok(true),
    }
}
