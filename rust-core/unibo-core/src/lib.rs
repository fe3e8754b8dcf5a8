// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Universal business object model.
//
// One in-memory entity type, `UniversalBo`, is shared by every storage
// backend. This crate owns its data model and the discipline around it:
// dirty tracking, content checksums that ignore `tupd`, and timestamp
// rounding applied before anything is persisted.
//
// # Modules
//
// - [`bo`] -- `UniversalBo`, its generic attribute-bag form and sync options.
// - [`path`] -- Dotted-path get/set over the decoded `data` tree.
// - [`value`] -- `AttrValue` input conversions and `FromAttr` typed views.
// - [`timestamp`] -- Rounding settings and the canonical storage layout.
// - [`checksum`] -- Canonical JSON and the content checksum.
// - [`error`] -- The `BoError` enum.
//
// # Example
//
// ```rust
// use unibo_core::{SyncOptions, UniversalBo};
//
// let bo = UniversalBo::new("id", 1357);
// bo.set_data_attr("name.first", "Thanh").unwrap();
// bo.set_extra_attr("email", "myname@mydomain.com");
// bo.sync(SyncOptions::default());
//
// let gbo = bo.to_generic();
// assert_eq!(gbo["email"], "myname@mydomain.com");
// ```

pub mod bo;
pub mod checksum;
pub mod error;
pub mod path;
pub mod timestamp;
pub mod value;

pub use bo::{
    is_reserved_field, BoOptions, GenericBo, SyncOptions, UniversalBo, FIELD_CHECKSUM, FIELD_DATA,
    FIELD_ID, FIELD_TAG_VERSION, FIELD_TIME_CREATED, FIELD_TIME_UPDATED, RESERVED_FIELDS,
};
pub use error::{BoError, BoResult};
pub use timestamp::{format_timestamp, normalize_for_storage, parse_timestamp, TimestampRounding};
pub use value::{AttrValue, FromAttr};
