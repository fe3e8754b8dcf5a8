// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Timestamp rounding and the canonical storage layout.
//!
//! Every instant that crosses a storage boundary goes through
//! [`normalize_for_storage`]: it is truncated to the configured precision and
//! formatted as RFC3339 in UTC with a fixed nine-digit fraction. The fixed
//! width keeps the strings lexicographically ordered, so backends that only
//! see text can still sort and range-filter on them.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BoError, BoResult};

/// Precision that `tcre`, `tupd` and stored instants are truncated to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampRounding {
    /// Keep the instant untouched.
    None,
    /// Nanosecond precision (chrono's native resolution).
    Nanosecond,
    /// Microsecond precision (PostgreSQL `timestamptz`).
    Microsecond,
    /// Millisecond precision.
    Millisecond,
    /// Whole seconds.
    #[default]
    Second,
}

impl TimestampRounding {
    /// Number of fractional digits kept by this setting.
    pub fn digits(self) -> u16 {
        match self {
            TimestampRounding::None | TimestampRounding::Nanosecond => 9,
            TimestampRounding::Microsecond => 6,
            TimestampRounding::Millisecond => 3,
            TimestampRounding::Second => 0,
        }
    }

    /// Truncate `t` to this precision.
    pub fn round(self, t: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            TimestampRounding::None | TimestampRounding::Nanosecond => t,
            other => t.trunc_subsecs(other.digits()),
        }
    }
}

/// Format an instant in the canonical layout (`2024-05-01T10:00:00.000000000Z`).
pub fn format_timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Round then format: the single normalization applied at storage boundaries.
pub fn normalize_for_storage(t: DateTime<Utc>, rounding: TimestampRounding) -> String {
    format_timestamp(&rounding.round(t))
}

/// Parse an instant written by this crate or by a SQL driver.
///
/// Accepts RFC3339 (any offset), `YYYY-MM-DD HH:MM:SS[.f]±hh:mm` as emitted by
/// SQLite drivers, and offset-less `YYYY-MM-DD HH:MM:SS[.f]` read as UTC.
pub fn parse_timestamp(s: &str) -> BoResult<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(t) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| BoError::InvalidTimestamp {
            value: s.to_string(),
            reason: e.to_string(),
        })
}

/// Parse an instant using an explicit chrono format string.
///
/// Layouts without an offset are interpreted as UTC.
pub fn parse_timestamp_with_layout(s: &str, layout: &str) -> BoResult<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_str(s, layout) {
        return Ok(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, layout)
        .map(|naive| naive.and_utc())
        .map_err(|e| BoError::InvalidTimestamp {
            value: s.to_string(),
            reason: e.to_string(),
        })
}
