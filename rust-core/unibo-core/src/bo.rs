// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! The universal business object.
//!
//! A [`UniversalBo`] carries a handful of top-level fields (`id`, `tver`,
//! `csum`, `tcre`, `tupd`), a free-form JSON `data` tree and a flat `extras`
//! map. Mutators only mark the object dirty; the checksum, serialized data
//! and rounded timestamps are refreshed by [`UniversalBo::sync`], which every
//! read that crosses a storage boundary ([`UniversalBo::to_generic`],
//! [`Clone::clone`]) triggers implicitly.
//!
//! # Locking
//!
//! State sits behind a single `parking_lot::RwLock`: getters take the shared
//! lock, mutators and `sync` take the exclusive lock.

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::checksum;
use crate::error::{BoError, BoResult};
use crate::path;
use crate::timestamp::{format_timestamp, parse_timestamp, TimestampRounding};
use crate::value::{AttrValue, FromAttr};

/// Canonical name of the id field.
pub const FIELD_ID: &str = "id";
/// Canonical name of the JSON data field.
pub const FIELD_DATA: &str = "data";
/// Canonical name of the tag-version field.
pub const FIELD_TAG_VERSION: &str = "tver";
/// Canonical name of the checksum field.
pub const FIELD_CHECKSUM: &str = "csum";
/// Canonical name of the creation timestamp.
pub const FIELD_TIME_CREATED: &str = "tcre";
/// Canonical name of the last-update timestamp.
pub const FIELD_TIME_UPDATED: &str = "tupd";

/// Top-level names that can never appear in the extras map.
pub const RESERVED_FIELDS: [&str; 6] = [
    FIELD_ID,
    FIELD_DATA,
    FIELD_TAG_VERSION,
    FIELD_CHECKSUM,
    FIELD_TIME_CREATED,
    FIELD_TIME_UPDATED,
];

/// True if `name` is one of the reserved top-level field names.
pub fn is_reserved_field(name: &str) -> bool {
    RESERVED_FIELDS.contains(&name)
}

/// Flattened attribute-bag form of a BO: top-level fields plus extras.
pub type GenericBo = Map<String, Value>;

/// Construction options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoOptions {
    /// Precision for `tcre`, `tupd` and instants stored in the object.
    #[serde(default)]
    pub timestamp_rounding: TimestampRounding,
}

/// Flags for [`UniversalBo::sync`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Always move `tupd` to now.
    pub update_timestamp: bool,
    /// Move `tupd` to now only if the checksum changed.
    pub update_timestamp_if_checksum_change: bool,
}

impl SyncOptions {
    /// Bump `tupd` unconditionally.
    pub fn touch() -> Self {
        Self {
            update_timestamp: true,
            ..Self::default()
        }
    }

    /// Bump `tupd` only when content changed.
    pub fn touch_if_changed() -> Self {
        Self {
            update_timestamp_if_checksum_change: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
struct BoState {
    id: String,
    tag_version: u64,
    checksum: String,
    time_created: DateTime<Utc>,
    time_updated: DateTime<Utc>,
    data_json: String,
    /// Decoded `data`; `None` until first needed.
    data_tree: Option<Value>,
    extras: Map<String, Value>,
    dirty: bool,
    rounding: TimestampRounding,
}

fn decode_tree(json: &str) -> Value {
    serde_json::from_str(json).unwrap_or(Value::Null)
}

impl BoState {
    fn tree(&self) -> Cow<'_, Value> {
        match &self.data_tree {
            Some(tree) => Cow::Borrowed(tree),
            None => Cow::Owned(decode_tree(&self.data_json)),
        }
    }

    fn tree_mut(&mut self) -> &mut Value {
        let json = &self.data_json;
        self.data_tree.get_or_insert_with(|| decode_tree(json))
    }

    fn compute_checksum(&self) -> String {
        checksum::compute(
            &self.id,
            self.tag_version,
            &format_timestamp(&self.time_created),
            &self.tree(),
            &self.extras,
        )
    }

    fn sync(&mut self, opts: SyncOptions) {
        if !self.dirty {
            return;
        }
        self.time_created = self.rounding.round(self.time_created);
        self.time_updated = self.rounding.round(self.time_updated);
        let previous = std::mem::take(&mut self.checksum);
        self.checksum = self.compute_checksum();
        if opts.update_timestamp
            || (opts.update_timestamp_if_checksum_change && previous != self.checksum)
        {
            // tupd is not a checksum input, so the digest stays valid.
            self.time_updated = self.rounding.round(Utc::now());
        }
        // Text that does not decode is stored as `null`.
        self.data_json = self.tree_mut().to_string();
        self.dirty = false;
    }
}

/// The in-memory entity persisted by every DAO.
pub struct UniversalBo {
    state: RwLock<BoState>,
}

impl UniversalBo {
    /// Create a fresh object with default options.
    pub fn new(id: impl Into<String>, tag_version: u64) -> Self {
        Self::with_options(id, tag_version, BoOptions::default())
    }

    /// Create a fresh object: timestamps are now, the initial sync has run.
    pub fn with_options(id: impl Into<String>, tag_version: u64, opts: BoOptions) -> Self {
        let now = Utc::now();
        let mut state = BoState {
            id: id.into().trim().to_string(),
            tag_version,
            checksum: String::new(),
            time_created: now,
            time_updated: now,
            data_json: "null".to_string(),
            data_tree: None,
            extras: Map::new(),
            dirty: true,
            rounding: opts.timestamp_rounding,
        };
        state.sync(SyncOptions::default());
        Self {
            state: RwLock::new(state),
        }
    }

    /// Rebuild an object from its attribute-bag form.
    ///
    /// Reserved fields are pulled out of the bag; everything else becomes an
    /// extra. Returns `None` when `data` holds text that is not valid JSON.
    /// Missing timestamps default to now.
    pub fn from_generic(gbo: &GenericBo, opts: BoOptions) -> Option<Self> {
        let now = Utc::now();
        let id = match gbo.get(FIELD_ID) {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        let tag_version = gbo
            .get(FIELD_TAG_VERSION)
            .and_then(|v| u64::from_attr(v).ok())
            .unwrap_or(0);
        let checksum = gbo
            .get(FIELD_CHECKSUM)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let timestamp = |field: &str| {
            gbo.get(field)
                .and_then(Value::as_str)
                .and_then(|s| parse_timestamp(s).ok())
                .unwrap_or(now)
        };
        let (data_json, data_tree) = match gbo.get(FIELD_DATA) {
            None | Some(Value::Null) => ("null".to_string(), None),
            Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
                Ok(tree) => (s.clone(), Some(tree)),
                Err(_) => return None,
            },
            Some(tree) => (tree.to_string(), Some(tree.clone())),
        };
        let extras = gbo
            .iter()
            .filter(|(k, _)| !is_reserved_field(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let mut state = BoState {
            id,
            tag_version,
            checksum,
            time_created: timestamp(FIELD_TIME_CREATED),
            time_updated: timestamp(FIELD_TIME_UPDATED),
            data_json,
            data_tree,
            extras,
            dirty: true,
            rounding: opts.timestamp_rounding,
        };
        state.sync(SyncOptions::default());
        Some(Self {
            state: RwLock::new(state),
        })
    }

    /// Flatten into the attribute-bag form, syncing first.
    pub fn to_generic(&self) -> GenericBo {
        self.sync(SyncOptions::default());
        let state = self.state.read();
        let mut gbo = state.extras.clone();
        gbo.insert(FIELD_ID.to_string(), Value::from(state.id.clone()));
        gbo.insert(FIELD_TAG_VERSION.to_string(), Value::from(state.tag_version));
        gbo.insert(FIELD_CHECKSUM.to_string(), Value::from(state.checksum.clone()));
        gbo.insert(
            FIELD_TIME_CREATED.to_string(),
            Value::from(format_timestamp(&state.time_created)),
        );
        gbo.insert(
            FIELD_TIME_UPDATED.to_string(),
            Value::from(format_timestamp(&state.time_updated)),
        );
        gbo.insert(FIELD_DATA.to_string(), Value::from(state.data_json.clone()));
        gbo
    }

    /// Refresh checksum, serialized data and rounded timestamps if dirty.
    pub fn sync(&self, opts: SyncOptions) {
        self.state.write().sync(opts);
    }

    // ---------------------------------------------------------------------
    // Getters
    // ---------------------------------------------------------------------

    pub fn id(&self) -> String {
        self.state.read().id.clone()
    }

    pub fn tag_version(&self) -> u64 {
        self.state.read().tag_version
    }

    /// Checksum as of the last sync.
    pub fn checksum(&self) -> String {
        self.state.read().checksum.clone()
    }

    pub fn time_created(&self) -> DateTime<Utc> {
        self.state.read().time_created
    }

    pub fn time_updated(&self) -> DateTime<Utc> {
        self.state.read().time_updated
    }

    pub fn is_dirty(&self) -> bool {
        self.state.read().dirty
    }

    pub fn timestamp_rounding(&self) -> TimestampRounding {
        self.state.read().rounding
    }

    /// Current `data` as JSON text, reflecting unsynced edits. Always valid
    /// JSON: undecodable text reads as `null`.
    pub fn data_json(&self) -> String {
        self.state.read().tree().to_string()
    }

    /// Decoded `data` tree.
    pub fn data_tree(&self) -> Value {
        self.state.read().tree().into_owned()
    }

    /// Value at `path` in the data tree.
    pub fn data_attr(&self, path: &str) -> Option<Value> {
        let state = self.state.read();
        let tree = state.tree();
        path::get(&tree, path).cloned()
    }

    /// Typed value at `path`; `Ok(None)` when the path does not resolve.
    pub fn data_attr_as<T: FromAttr>(&self, path: &str) -> BoResult<Option<T>> {
        self.data_attr(path).map(|v| T::from_attr(&v)).transpose()
    }

    pub fn extra_attr(&self, key: &str) -> Option<Value> {
        self.state.read().extras.get(key).cloned()
    }

    /// Typed extra; `Ok(None)` when absent.
    pub fn extra_attr_as<T: FromAttr>(&self, key: &str) -> BoResult<Option<T>> {
        self.extra_attr(key).map(|v| T::from_attr(&v)).transpose()
    }

    pub fn extra_attrs(&self) -> Map<String, Value> {
        self.state.read().extras.clone()
    }

    /// Same id and same content checksum.
    pub fn same_content(&self, other: &UniversalBo) -> bool {
        self.sync(SyncOptions::default());
        other.sync(SyncOptions::default());
        self.id() == other.id() && self.checksum() == other.checksum()
    }

    // ---------------------------------------------------------------------
    // Mutators
    // ---------------------------------------------------------------------

    /// Set the id (space-trimmed).
    pub fn set_id(&self, id: &str) -> &Self {
        let mut state = self.state.write();
        state.id = id.trim().to_string();
        state.dirty = true;
        self
    }

    pub fn set_tag_version(&self, tag_version: u64) -> &Self {
        let mut state = self.state.write();
        state.tag_version = tag_version;
        state.dirty = true;
        self
    }

    /// Replace `data` with raw JSON text; decoding is deferred.
    pub fn set_data_json(&self, json: &str) -> &Self {
        let mut state = self.state.write();
        state.data_json = json.to_string();
        state.data_tree = None;
        state.dirty = true;
        self
    }

    /// Replace the whole data tree.
    pub fn set_data_tree(&self, tree: Value) -> &Self {
        let mut state = self.state.write();
        state.data_tree = Some(tree);
        state.dirty = true;
        self
    }

    /// Write `value` at `path` in the data tree. Instants are normalized.
    pub fn set_data_attr(&self, path: &str, value: impl Into<AttrValue>) -> BoResult<&Self> {
        let mut state = self.state.write();
        let value = value.into().normalize(state.rounding);
        path::set(state.tree_mut(), path, value)?;
        state.dirty = true;
        Ok(self)
    }

    /// Set one extra attribute. Reserved names are ignored with a warning;
    /// use [`Self::try_set_extra_attr`] to have them reported.
    pub fn set_extra_attr(&self, key: &str, value: impl Into<AttrValue>) -> &Self {
        if let Err(e) = self.try_set_extra_attr(key, value) {
            warn!(error = %e, "ignoring extra attribute");
        }
        self
    }

    /// Set one extra attribute, failing with [`BoError::ReservedField`] when
    /// `key` names a canonical field.
    pub fn try_set_extra_attr(&self, key: &str, value: impl Into<AttrValue>) -> BoResult<&Self> {
        if is_reserved_field(key) {
            return Err(BoError::ReservedField(key.to_string()));
        }
        let mut state = self.state.write();
        let value = value.into().normalize(state.rounding);
        state.extras.insert(key.to_string(), value);
        state.dirty = true;
        Ok(self)
    }

    /// Merge several extras at once.
    pub fn set_extra_attrs(&self, extras: Map<String, Value>) -> &Self {
        for (k, v) in extras {
            self.set_extra_attr(&k, v);
        }
        self
    }

    /// Remove an extra attribute, returning its old value.
    pub fn remove_extra_attr(&self, key: &str) -> Option<Value> {
        let mut state = self.state.write();
        let old = state.extras.remove(key);
        if old.is_some() {
            state.dirty = true;
        }
        old
    }

    pub fn set_time_created(&self, t: DateTime<Utc>) -> &Self {
        let mut state = self.state.write();
        state.time_created = t;
        state.dirty = true;
        self
    }

    pub fn set_time_updated(&self, t: DateTime<Utc>) -> &Self {
        let mut state = self.state.write();
        state.time_updated = t;
        state.dirty = true;
        self
    }

    /// Change the rounding precision; applied at the next sync.
    pub fn set_timestamp_rounding(&self, rounding: TimestampRounding) -> &Self {
        let mut state = self.state.write();
        state.rounding = rounding;
        state.dirty = true;
        self
    }

    /// Fetch `data` as a typed value, failing if the JSON does not decode.
    pub fn data_as<T: serde::de::DeserializeOwned>(&self) -> BoResult<T> {
        let json = self.data_json();
        serde_json::from_str(&json).map_err(|e| BoError::InvalidJson(e.to_string()))
    }
}

impl Clone for UniversalBo {
    /// Independent deep copy, synced and not dirty, same rounding setting.
    fn clone(&self) -> Self {
        let mut state = self.state.read().clone();
        state.sync(SyncOptions::default());
        Self {
            state: RwLock::new(state),
        }
    }
}

impl fmt::Debug for UniversalBo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("UniversalBo")
            .field("id", &state.id)
            .field("tver", &state.tag_version)
            .field("csum", &state.checksum)
            .field("tcre", &format_timestamp(&state.time_created))
            .field("tupd", &format_timestamp(&state.time_updated))
            .field("extras", &state.extras)
            .field("dirty", &state.dirty)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use serde_json::json;

    fn scenario_bo() -> UniversalBo {
        let bo = UniversalBo::new("id", 1357);
        bo.set_data_attr("name.first", "Thanh").unwrap();
        bo.set_data_attr("name.last", "Nguyen").unwrap();
        bo.set_extra_attr("email", "myname@mydomain.com");
        bo.set_extra_attr("age", 35);
        bo
    }

    #[test]
    fn test_new_is_synced() {
        let bo = UniversalBo::new("  abc  ", 7);
        assert_eq!(bo.id(), "abc");
        assert_eq!(bo.tag_version(), 7);
        assert!(!bo.is_dirty());
        assert_eq!(bo.checksum().len(), 32);
        assert_eq!(bo.time_created().nanosecond(), 0);
        assert_eq!(bo.data_json(), "null");
    }

    #[test]
    fn test_mutators_mark_dirty() {
        let bo = UniversalBo::new("id", 1);
        bo.set_extra_attr("k", 1);
        assert!(bo.is_dirty());
        bo.sync(SyncOptions::default());
        assert!(!bo.is_dirty());
        bo.set_data_attr("a", 1).unwrap();
        assert!(bo.is_dirty());
    }

    #[test]
    fn test_checksum_stable_and_content_sensitive() {
        let bo = scenario_bo();
        bo.sync(SyncOptions::default());
        let first = bo.checksum();
        bo.sync(SyncOptions::default());
        assert_eq!(first, bo.checksum());

        bo.set_extra_attr("age", 36);
        bo.sync(SyncOptions::default());
        assert_ne!(first, bo.checksum());
    }

    #[test]
    fn test_checksum_ignores_time_updated() {
        let bo = scenario_bo();
        bo.sync(SyncOptions::default());
        let before = bo.checksum();
        bo.set_time_updated(Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap());
        bo.sync(SyncOptions::default());
        assert_eq!(before, bo.checksum());
    }

    #[test]
    fn test_sync_touch_if_changed() {
        let old = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap();
        let bo = scenario_bo();
        bo.set_time_updated(old);
        bo.sync(SyncOptions::default());
        assert_eq!(bo.time_updated(), old);

        // Dirty but same content: tupd must not move.
        bo.set_tag_version(1357);
        bo.sync(SyncOptions::touch_if_changed());
        assert_eq!(bo.time_updated(), old);

        bo.set_extra_attr("age", 40);
        bo.sync(SyncOptions::touch_if_changed());
        assert!(bo.time_updated() > old);
    }

    #[test]
    fn test_sync_touch_always() {
        let old = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap();
        let bo = UniversalBo::new("id", 1);
        bo.set_time_updated(old);
        bo.sync(SyncOptions::touch());
        assert!(bo.time_updated() > old);
    }

    #[test]
    fn test_generic_round_trip() {
        let bo = scenario_bo();
        let gbo = bo.to_generic();
        assert_eq!(gbo["id"], json!("id"));
        assert_eq!(gbo["tver"], json!(1357));
        assert_eq!(gbo["email"], json!("myname@mydomain.com"));
        assert!(gbo["data"].is_string());

        let back = UniversalBo::from_generic(&gbo, BoOptions::default()).unwrap();
        assert_eq!(back.tag_version(), 1357);
        assert_eq!(back.data_attr("name.first"), Some(json!("Thanh")));
        assert_eq!(back.extra_attr_as::<i64>("age").unwrap(), Some(35));
        assert_eq!(back.checksum(), bo.checksum());
        assert_eq!(back.time_created(), bo.time_created());
        assert!(back.extra_attrs().keys().all(|k| !is_reserved_field(k)));
    }

    #[test]
    fn test_from_generic_rejects_bad_json() {
        let mut gbo = GenericBo::new();
        gbo.insert("id".into(), json!("x"));
        gbo.insert("data".into(), json!("{not json"));
        assert!(UniversalBo::from_generic(&gbo, BoOptions::default()).is_none());
    }

    #[test]
    fn test_from_generic_accepts_decoded_data() {
        let mut gbo = GenericBo::new();
        gbo.insert("id".into(), json!("x"));
        gbo.insert("data".into(), json!({"a": [1, 2]}));
        let bo = UniversalBo::from_generic(&gbo, BoOptions::default()).unwrap();
        assert_eq!(bo.data_attr("a[1]"), Some(json!(2)));
    }

    #[test]
    fn test_reserved_extra_is_ignored() {
        let bo = UniversalBo::new("id", 1);
        bo.set_extra_attr("tcre", "nope");
        assert!(bo.extra_attr("tcre").is_none());
        assert!(!bo.is_dirty());
    }

    #[test]
    fn test_try_set_reserved_extra_reports_error() {
        let bo = UniversalBo::new("id", 1);
        let err = bo.try_set_extra_attr("csum", "nope").unwrap_err();
        assert_eq!(err, BoError::ReservedField("csum".to_string()));
        assert!(bo.extra_attr("csum").is_none());
        assert!(!bo.is_dirty());

        bo.try_set_extra_attr("email", "a@b").unwrap();
        assert_eq!(bo.extra_attr("email"), Some(json!("a@b")));
    }

    #[test]
    fn test_timestamp_rounding_applied_on_sync() {
        let t = Utc.with_ymd_and_hms(2024, 3, 4, 5, 6, 7).unwrap() + chrono::Duration::microseconds(891_011);
        for rounding in [
            TimestampRounding::None,
            TimestampRounding::Nanosecond,
            TimestampRounding::Microsecond,
            TimestampRounding::Millisecond,
            TimestampRounding::Second,
        ] {
            let bo = UniversalBo::new("id", 1);
            bo.set_timestamp_rounding(rounding);
            bo.set_time_created(t);
            bo.set_time_updated(t);
            bo.sync(SyncOptions::default());
            assert_eq!(bo.time_created(), rounding.round(t));
            assert_eq!(bo.time_updated(), rounding.round(t));
        }
    }

    #[test]
    fn test_extra_timestamp_normalized() {
        let t = Utc.with_ymd_and_hms(2024, 3, 4, 5, 6, 7).unwrap() + chrono::Duration::milliseconds(250);
        let bo = UniversalBo::new("id", 1);
        bo.set_extra_attr("t", t);
        let stored: DateTime<Utc> = bo.extra_attr_as("t").unwrap().unwrap();
        assert_eq!(stored, TimestampRounding::Second.round(t));
    }

    #[test]
    fn test_set_data_json_is_lazy() {
        let bo = UniversalBo::new("id", 1);
        bo.set_data_json(r#"{"a":{"b":1}}"#);
        assert_eq!(bo.data_attr_as::<i64>("a.b").unwrap(), Some(1));
        bo.set_data_attr("a.c", 2).unwrap();
        bo.sync(SyncOptions::default());
        assert_eq!(bo.data_json(), r#"{"a":{"b":1,"c":2}}"#);
    }

    #[test]
    fn test_set_data_attr_conflict() {
        let bo = UniversalBo::new("id", 1);
        bo.set_data_attr("a", "scalar").unwrap();
        assert!(bo.set_data_attr("a.b", 1).is_err());
    }

    #[test]
    fn test_invalid_data_json_treated_as_null() {
        let bo = UniversalBo::new("id", 1);
        bo.set_data_json("{oops");
        assert_eq!(bo.data_tree(), Value::Null);
        bo.set_data_attr("x", 1).unwrap();
        assert_eq!(bo.data_tree(), json!({"x": 1}));
    }

    #[test]
    fn test_sync_normalizes_invalid_data_json() {
        let bo = UniversalBo::new("id", 1);
        bo.set_data_json("{oops");
        assert_eq!(bo.data_json(), "null");
        bo.sync(SyncOptions::default());
        assert_eq!(bo.data_json(), "null");
        assert_eq!(bo.to_generic()["data"], json!("null"));

        // Valid but loosely formatted text is re-serialized.
        bo.set_data_json(r#"{ "a" :  1 }"#);
        bo.sync(SyncOptions::default());
        assert_eq!(bo.to_generic()["data"], json!(r#"{"a":1}"#));
    }

    #[test]
    fn test_clone_is_independent() {
        let bo = scenario_bo();
        bo.set_timestamp_rounding(TimestampRounding::Millisecond);
        let copy = bo.clone();
        assert!(!copy.is_dirty());
        assert!(bo.is_dirty());
        assert_eq!(copy.timestamp_rounding(), TimestampRounding::Millisecond);

        copy.set_extra_attr("email", "other@x");
        assert_eq!(bo.extra_attr("email"), Some(json!("myname@mydomain.com")));
    }

    #[test]
    fn test_data_as_typed() {
        #[derive(serde::Deserialize)]
        struct Name {
            first: String,
        }
        #[derive(serde::Deserialize)]
        struct Data {
            name: Name,
        }
        let bo = scenario_bo();
        let data: Data = bo.data_as().unwrap();
        assert_eq!(data.name.first, "Thanh");
    }
}
