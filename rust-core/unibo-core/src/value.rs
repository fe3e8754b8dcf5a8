// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Attribute values and typed views over them.
//!
//! Attribute trees are plain [`serde_json::Value`]s. [`AttrValue`] is the input
//! side: anything convertible into a JSON value, plus instants which are
//! normalized to the canonical layout on write. [`FromAttr`] is the output
//! side: lenient conversions from a stored JSON value into a Rust type.

use chrono::{DateTime, FixedOffset, Utc};
use serde_json::{Map, Value};

use crate::error::{BoError, BoResult};
use crate::timestamp::{normalize_for_storage, parse_timestamp, parse_timestamp_with_layout, TimestampRounding};

/// A value about to be written into a business object.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Any JSON value, stored as-is.
    Json(Value),
    /// An instant, stored as its canonical string after rounding.
    Time(DateTime<Utc>),
}

impl AttrValue {
    /// Resolve to the JSON value that is actually stored.
    pub fn normalize(self, rounding: TimestampRounding) -> Value {
        match self {
            AttrValue::Json(v) => v,
            AttrValue::Time(t) => Value::String(normalize_for_storage(t, rounding)),
        }
    }
}

macro_rules! attr_from_json {
    ($($t:ty),*) => {
        $(
            impl From<$t> for AttrValue {
                fn from(v: $t) -> Self {
                    AttrValue::Json(Value::from(v))
                }
            }
        )*
    };
}

attr_from_json!(bool, i32, i64, u32, u64, usize, f64, String, &str, Vec<Value>);

impl From<Value> for AttrValue {
    fn from(v: Value) -> Self {
        AttrValue::Json(v)
    }
}

impl From<Map<String, Value>> for AttrValue {
    fn from(v: Map<String, Value>) -> Self {
        AttrValue::Json(Value::Object(v))
    }
}

impl From<DateTime<Utc>> for AttrValue {
    fn from(t: DateTime<Utc>) -> Self {
        AttrValue::Time(t)
    }
}

impl From<DateTime<FixedOffset>> for AttrValue {
    fn from(t: DateTime<FixedOffset>) -> Self {
        AttrValue::Time(t.with_timezone(&Utc))
    }
}

/// Human-readable JSON type name, used in error messages.
pub fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn conversion_error(v: &Value, target: &'static str) -> BoError {
    BoError::Conversion {
        value: v.to_string(),
        target,
    }
}

/// Typed view over a stored attribute.
///
/// Conversions are lenient in the same way for every type: numbers parse
/// from strings, strings render from scalars.
pub trait FromAttr: Sized {
    /// Convert `v` to `Self`.
    fn from_attr(v: &Value) -> BoResult<Self>;
}

impl FromAttr for i64 {
    fn from_attr(v: &Value) -> BoResult<Self> {
        match v {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .ok_or_else(|| conversion_error(v, "i64")),
            Value::String(s) => s.trim().parse().map_err(|_| conversion_error(v, "i64")),
            Value::Bool(b) => Ok(i64::from(*b)),
            _ => Err(conversion_error(v, "i64")),
        }
    }
}

impl FromAttr for u64 {
    fn from_attr(v: &Value) -> BoResult<Self> {
        match v {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64))
                .ok_or_else(|| conversion_error(v, "u64")),
            Value::String(s) => s.trim().parse().map_err(|_| conversion_error(v, "u64")),
            Value::Bool(b) => Ok(u64::from(*b)),
            _ => Err(conversion_error(v, "u64")),
        }
    }
}

impl FromAttr for f64 {
    fn from_attr(v: &Value) -> BoResult<Self> {
        match v {
            Value::Number(n) => n.as_f64().ok_or_else(|| conversion_error(v, "f64")),
            Value::String(s) => s.trim().parse().map_err(|_| conversion_error(v, "f64")),
            _ => Err(conversion_error(v, "f64")),
        }
    }
}

impl FromAttr for bool {
    fn from_attr(v: &Value) -> BoResult<Self> {
        match v {
            Value::Bool(b) => Ok(*b),
            Value::Number(n) => Ok(n.as_f64().map(|f| f != 0.0).unwrap_or(false)),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "t" | "yes" => Ok(true),
                "false" | "0" | "f" | "no" | "" => Ok(false),
                _ => Err(conversion_error(v, "bool")),
            },
            _ => Err(conversion_error(v, "bool")),
        }
    }
}

impl FromAttr for String {
    fn from_attr(v: &Value) -> BoResult<Self> {
        match v {
            Value::String(s) => Ok(s.clone()),
            Value::Null => Err(conversion_error(v, "string")),
            other => Ok(other.to_string()),
        }
    }
}

impl FromAttr for DateTime<Utc> {
    fn from_attr(v: &Value) -> BoResult<Self> {
        match v {
            Value::String(s) => parse_timestamp(s),
            Value::Number(n) => n
                .as_i64()
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .ok_or_else(|| conversion_error(v, "timestamp")),
            _ => Err(conversion_error(v, "timestamp")),
        }
    }
}

impl FromAttr for Value {
    fn from_attr(v: &Value) -> BoResult<Self> {
        Ok(v.clone())
    }
}

/// Read `v` as an instant using an explicit chrono layout.
pub fn time_with_layout(v: &Value, layout: &str) -> BoResult<DateTime<Utc>> {
    match v {
        Value::String(s) => parse_timestamp_with_layout(s, layout),
        _ => Err(conversion_error(v, "timestamp")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_attr_from_scalars() {
        assert_eq!(AttrValue::from(35), AttrValue::Json(json!(35)));
        assert_eq!(AttrValue::from("x"), AttrValue::Json(json!("x")));
        assert_eq!(AttrValue::from(true), AttrValue::Json(json!(true)));
    }

    #[test]
    fn test_time_is_normalized() {
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap() + chrono::Duration::milliseconds(678);
        let v = AttrValue::from(t).normalize(TimestampRounding::Second);
        assert_eq!(v, json!("2024-01-02T03:04:05.000000000Z"));
        let v = AttrValue::from(t).normalize(TimestampRounding::Millisecond);
        assert_eq!(v, json!("2024-01-02T03:04:05.678000000Z"));
    }

    #[test]
    fn test_numeric_views() {
        assert_eq!(i64::from_attr(&json!(42)).unwrap(), 42);
        assert_eq!(i64::from_attr(&json!("42")).unwrap(), 42);
        assert_eq!(i64::from_attr(&json!(42.0)).unwrap(), 42);
        assert!(i64::from_attr(&json!(4.5)).is_err());
        assert_eq!(u64::from_attr(&json!(7)).unwrap(), 7);
        assert!(u64::from_attr(&json!(-7)).is_err());
        assert_eq!(f64::from_attr(&json!("2.5")).unwrap(), 2.5);
    }

    #[test]
    fn test_bool_and_string_views() {
        assert!(bool::from_attr(&json!("true")).unwrap());
        assert!(!bool::from_attr(&json!(0)).unwrap());
        assert!(bool::from_attr(&json!("maybe")).is_err());
        assert_eq!(String::from_attr(&json!(12)).unwrap(), "12");
        assert!(String::from_attr(&Value::Null).is_err());
    }

    #[test]
    fn test_time_views() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let t: DateTime<Utc> = FromAttr::from_attr(&json!("2024-01-02T03:04:05Z")).unwrap();
        assert_eq!(t, expected);
        let t = time_with_layout(&json!("2024/01/02 03:04:05"), "%Y/%m/%d %H:%M:%S").unwrap();
        assert_eq!(t, expected);
        assert!(time_with_layout(&json!(5), "%Y").is_err());
    }
}
