// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Backend-neutral filters and sort orders.
//!
//! Field names in filters are BO-level names (`id`, `tcre`, extras keys).
//! Each DAO translates them to its own column names before building the
//! native predicate; a field with no mapping is a [`DaoError::InvalidFilter`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use unibo_core::parse_timestamp;
use unibo_storage::{SqlFlavor, SqlParam};

use crate::error::{DaoError, DaoResult};

/// Comparison operator of a field filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
    Ne,
}

impl FilterOp {
    fn sql(self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Lt => "<",
            FilterOp::Le => "<=",
            FilterOp::Gt => ">",
            FilterOp::Ge => ">=",
            FilterOp::Ne => "<>",
        }
    }

    fn predicate(self) -> &'static str {
        match self {
            FilterOp::Eq => "$eq",
            FilterOp::Lt => "$lt",
            FilterOp::Le => "$lte",
            FilterOp::Gt => "$gt",
            FilterOp::Ge => "$gte",
            FilterOp::Ne => "$ne",
        }
    }
}

/// A row filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    /// `field <op> value`.
    Field {
        field: String,
        op: FilterOp,
        value: Value,
    },
    /// All sub-filters must match.
    And(Vec<Filter>),
    /// At least one sub-filter must match.
    Or(Vec<Filter>),
    /// A native predicate passed through untouched (document and
    /// wide-column backends only).
    Raw(Map<String, Value>),
}

impl Filter {
    pub fn field(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Filter::Field {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(field, FilterOp::Eq, value)
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(field, FilterOp::Ne, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(field, FilterOp::Lt, value)
    }

    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(field, FilterOp::Le, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(field, FilterOp::Gt, value)
    }

    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(field, FilterOp::Ge, value)
    }

    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And(filters)
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or(filters)
    }

    /// Wrap a native predicate. Non-object values become an empty predicate.
    pub fn raw(predicate: Value) -> Self {
        match predicate {
            Value::Object(map) => Filter::Raw(map),
            _ => Filter::Raw(Map::new()),
        }
    }

    /// Translate into the JSON predicate language of the document and
    /// wide-column backends. `column` maps a BO field to a stored field name.
    pub fn to_predicate(&self, column: &dyn Fn(&str) -> Option<String>) -> DaoResult<Value> {
        match self {
            Filter::Field { field, op, value } => {
                let name = column(field.as_str()).ok_or_else(|| unmapped(field))?;
                let mut cond = Map::new();
                cond.insert(op.predicate().to_string(), value.clone());
                let mut clause = Map::new();
                clause.insert(name, Value::Object(cond));
                Ok(Value::Object(clause))
            }
            Filter::And(parts) => Ok(json!({ "$and": predicates(parts, column)? })),
            Filter::Or(parts) => Ok(json!({ "$or": predicates(parts, column)? })),
            Filter::Raw(map) => Ok(Value::Object(map.clone())),
        }
    }

    /// Translate into a SQL boolean expression, appending bound values to
    /// `params`. `column` maps a BO field to `(quoted column, is_timestamp)`.
    pub fn to_sql(
        &self,
        flavor: SqlFlavor,
        column: &dyn Fn(&str) -> Option<(String, bool)>,
        params: &mut Vec<SqlParam>,
    ) -> DaoResult<String> {
        match self {
            Filter::Field { field, op, value } => {
                let (name, is_timestamp) = column(field.as_str()).ok_or_else(|| unmapped(field))?;
                params.push(sql_param(value, is_timestamp)?);
                Ok(format!("{name} {} {}", op.sql(), flavor.placeholder(params.len())))
            }
            Filter::And(parts) => join_sql(parts, " AND ", "1=1", flavor, column, params),
            Filter::Or(parts) => join_sql(parts, " OR ", "1=0", flavor, column, params),
            Filter::Raw(_) => Err(DaoError::InvalidFilter(
                "raw predicates are not supported by SQL backends".to_string(),
            )),
        }
    }
}

fn unmapped(field: &str) -> DaoError {
    DaoError::InvalidFilter(format!("field '{field}' is not mapped to a column"))
}

fn predicates(parts: &[Filter], column: &dyn Fn(&str) -> Option<String>) -> DaoResult<Vec<Value>> {
    parts.iter().map(|p| p.to_predicate(column)).collect()
}

fn join_sql(
    parts: &[Filter],
    sep: &str,
    empty: &str,
    flavor: SqlFlavor,
    column: &dyn Fn(&str) -> Option<(String, bool)>,
    params: &mut Vec<SqlParam>,
) -> DaoResult<String> {
    if parts.is_empty() {
        return Ok(empty.to_string());
    }
    let mut out = Vec::with_capacity(parts.len());
    for p in parts {
        out.push(format!("({})", p.to_sql(flavor, column, params)?));
    }
    Ok(out.join(sep))
}

fn sql_param(value: &Value, is_timestamp: bool) -> DaoResult<SqlParam> {
    match value {
        Value::String(s) if is_timestamp => parse_timestamp(s)
            .map(SqlParam::Timestamp)
            .map_err(|e| DaoError::InvalidFilter(e.to_string())),
        other => Ok(SqlParam::from_json(other)),
    }
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    pub field: String,
    #[serde(default)]
    pub descending: bool,
}

/// An ordered list of sort keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort(pub Vec<SortField>);

impl Sort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-key sort.
    pub fn by(field: impl Into<String>, descending: bool) -> Self {
        Self::new().then(field, descending)
    }

    pub fn asc(self, field: impl Into<String>) -> Self {
        self.then(field, false)
    }

    pub fn desc(self, field: impl Into<String>) -> Self {
        self.then(field, true)
    }

    pub fn then(mut self, field: impl Into<String>, descending: bool) -> Self {
        self.0.push(SortField {
            field: field.into(),
            descending,
        });
        self
    }

    pub fn fields(&self) -> &[SortField] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Map BO field names to stored names, as `(name, descending)` pairs.
    pub fn resolve(&self, column: &dyn Fn(&str) -> Option<String>) -> DaoResult<Vec<(String, bool)>> {
        self.0
            .iter()
            .map(|s| {
                column(s.field.as_str())
                    .map(|name| (name, s.descending))
                    .ok_or_else(|| DaoError::InvalidFilter(format!("cannot sort by '{}'", s.field)))
            })
            .collect()
    }
}
