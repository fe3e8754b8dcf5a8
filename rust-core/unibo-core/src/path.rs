// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Hierarchical get/set over a decoded JSON tree.
//!
//! Paths are dotted keys with optional array indices: `name.first`,
//! `tags[2]`, `a.b[0].c`, `[1].x`. Writes create missing intermediate
//! containers (an object when the next segment is a key, an array when it is
//! an index) and grow arrays with `null` padding, up to [`MAX_ARRAY_INDEX`].

use serde_json::{Map, Value};

use crate::error::{BoError, BoResult};
use crate::value::json_type_name;

/// Largest index a write may grow an array to.
pub const MAX_ARRAY_INDEX: usize = 65_535;

/// One step of a parsed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Object member.
    Key(String),
    /// Array element.
    Index(usize),
}

fn invalid(path: &str, reason: &str) -> BoError {
    BoError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

/// Split a path into segments.
pub fn parse_path(path: &str) -> BoResult<Vec<PathSegment>> {
    if path.is_empty() {
        return Err(invalid(path, "empty path"));
    }
    let mut segments = Vec::new();
    for (n, part) in path.split('.').enumerate() {
        let (key, mut rest) = match part.find('[') {
            Some(pos) => (&part[..pos], &part[pos..]),
            None => (part, ""),
        };
        if key.is_empty() {
            // Only a leading `[i]` on the very first part may omit the key.
            if n > 0 || rest.is_empty() {
                return Err(invalid(path, "empty segment"));
            }
        } else {
            segments.push(PathSegment::Key(key.to_string()));
        }
        while !rest.is_empty() {
            let close = rest.find(']').ok_or_else(|| invalid(path, "unclosed '['"))?;
            if !rest.starts_with('[') {
                return Err(invalid(path, "unexpected characters after ']'"));
            }
            let idx = rest[1..close]
                .trim()
                .parse::<usize>()
                .map_err(|_| invalid(path, "array index is not a non-negative integer"))?;
            segments.push(PathSegment::Index(idx));
            rest = &rest[close + 1..];
        }
    }
    Ok(segments)
}

/// Look up `path` in `root`. Malformed paths resolve to `None`.
pub fn get<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let segments = parse_path(path).ok()?;
    let mut node = root;
    for segment in &segments {
        node = match (segment, node) {
            (PathSegment::Key(k), Value::Object(map)) => map.get(k)?,
            (PathSegment::Index(i), Value::Array(items)) => items.get(*i)?,
            _ => return None,
        };
    }
    Some(node)
}

fn empty_container_for(segment: &PathSegment) -> Value {
    match segment {
        PathSegment::Key(_) => Value::Object(Map::new()),
        PathSegment::Index(_) => Value::Array(Vec::new()),
    }
}

/// Write `value` at `path`, creating intermediate containers as needed.
pub fn set(root: &mut Value, path: &str, value: Value) -> BoResult<()> {
    let segments = parse_path(path)?;
    if root.is_null() {
        *root = empty_container_for(&segments[0]);
    }
    let mut node = root;
    for (i, segment) in segments.iter().enumerate() {
        let last = i + 1 == segments.len();
        let slot: &mut Value = match segment {
            PathSegment::Key(k) => match node {
                Value::Object(map) => map.entry(k.clone()).or_insert(Value::Null),
                other => {
                    return Err(BoError::PathConflict {
                        path: path.to_string(),
                        found: json_type_name(other),
                    })
                }
            },
            PathSegment::Index(idx) => match node {
                Value::Array(items) => {
                    if items.len() <= *idx {
                        let len = idx
                            .checked_add(1)
                            .filter(|_| *idx <= MAX_ARRAY_INDEX)
                            .ok_or_else(|| invalid(path, "array index too large"))?;
                        items.resize(len, Value::Null);
                    }
                    &mut items[*idx]
                }
                other => {
                    return Err(BoError::PathConflict {
                        path: path.to_string(),
                        found: json_type_name(other),
                    })
                }
            },
        };
        if last {
            *slot = value;
            return Ok(());
        }
        if slot.is_null() {
            *slot = empty_container_for(&segments[i + 1]);
        }
        node = slot;
    }
    Ok(())
}
