// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Row mappers: BO attribute bag <-> backend row.
//
// Every backend stores the same top-level fields. Mappers differ only in the
// column name used for `id`, in whether `data` travels as a JSON string or as
// a decoded tree, and in how extras become columns (promoted one-to-one, or
// passed through as-is).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;
use unibo_core::{
    is_reserved_field, GenericBo, FIELD_CHECKSUM, FIELD_DATA, FIELD_ID, FIELD_TAG_VERSION,
    FIELD_TIME_CREATED, FIELD_TIME_UPDATED,
};

use crate::error::{DaoError, DaoResult};

/// A backend row.
pub type Row = Map<String, Value>;

/// Translates between the generic BO form and a backend row.
pub trait RowMapper: Send + Sync {
    /// Build the backend row for `gbo`.
    fn to_row(&self, table: &str, gbo: &GenericBo) -> DaoResult<Row>;

    /// Rebuild the generic BO form from a row; `data` comes back as a JSON
    /// string.
    fn to_bo(&self, table: &str, row: &Row) -> DaoResult<GenericBo>;

    /// Ordered column names of `table`.
    fn columns(&self, table: &str) -> Vec<String>;

    /// Storage name of a BO field, or `None` if it has no column.
    fn to_db_col_name(&self, field: &str) -> Option<String>;
}

/// How the `data` tree is carried in a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataEncoding {
    /// A JSON-encoded string.
    #[default]
    JsonString,
    /// The decoded tree itself.
    Decoded,
}

/// Interpretation of a promoted column's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Bound as the JSON scalar type of the value.
    #[default]
    Auto,
    /// Canonical timestamp strings, bound as native instants where supported.
    Timestamp,
}

/// An extras key stored in its own column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotedColumn {
    /// Column name.
    pub column: String,
    /// Extras key it holds.
    pub extra: String,
    #[serde(default)]
    pub kind: ColumnKind,
}

impl PromotedColumn {
    /// Column named after its extras key.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            column: name.clone(),
            extra: name,
            kind: ColumnKind::Auto,
        }
    }

    pub fn timestamp(name: impl Into<String>) -> Self {
        Self {
            kind: ColumnKind::Timestamp,
            ..Self::new(name)
        }
    }

    /// Store the extra under a different column name.
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }
}

/// The row mapper shared by all bundled DAOs.
#[derive(Debug, Clone, PartialEq)]
pub struct UboRowMapper {
    pub id_column: String,
    pub data_encoding: DataEncoding,
    pub promoted: Vec<PromotedColumn>,
    /// Store every extra under its own name instead of only promoted ones.
    pub pass_through_extras: bool,
}

const FIXED_FIELDS: [&str; 5] = [
    FIELD_DATA,
    FIELD_TAG_VERSION,
    FIELD_CHECKSUM,
    FIELD_TIME_CREATED,
    FIELD_TIME_UPDATED,
];

impl UboRowMapper {
    /// Relational layout: `data` as JSON text, only promoted extras stored.
    pub fn sql(promoted: Vec<PromotedColumn>) -> Self {
        Self {
            id_column: FIELD_ID.to_string(),
            data_encoding: DataEncoding::JsonString,
            promoted,
            pass_through_extras: false,
        }
    }

    /// Document layout: `_id` key, decoded `data`, all extras as fields.
    pub fn document() -> Self {
        Self {
            id_column: "_id".to_string(),
            data_encoding: DataEncoding::Decoded,
            promoted: Vec::new(),
            pass_through_extras: true,
        }
    }

    /// Partitioned-document layout: `id` key, decoded `data`.
    pub fn partitioned_document() -> Self {
        Self {
            id_column: FIELD_ID.to_string(),
            ..Self::document()
        }
    }

    /// Wide-column layout: `id` key, `data` as JSON text, all extras as
    /// attributes.
    pub fn wide_column() -> Self {
        Self {
            id_column: FIELD_ID.to_string(),
            data_encoding: DataEncoding::JsonString,
            promoted: Vec::new(),
            pass_through_extras: true,
        }
    }

    /// Promoted column holding `extra`, if any.
    pub fn promoted_for(&self, extra: &str) -> Option<&PromotedColumn> {
        self.promoted.iter().find(|p| p.extra == extra)
    }

    fn is_fixed_column(&self, name: &str) -> bool {
        name == self.id_column || FIXED_FIELDS.contains(&name)
    }
}

impl RowMapper for UboRowMapper {
    fn to_row(&self, table: &str, gbo: &GenericBo) -> DaoResult<Row> {
        let mut row = Row::new();
        let id = gbo
            .get(FIELD_ID)
            .cloned()
            .ok_or_else(|| DaoError::Mapping("business object has no id".to_string()))?;
        row.insert(self.id_column.clone(), id);

        let data = match (self.data_encoding, gbo.get(FIELD_DATA)) {
            (DataEncoding::JsonString, Some(Value::String(s))) => Value::String(s.clone()),
            (DataEncoding::JsonString, Some(other)) => Value::String(other.to_string()),
            (DataEncoding::JsonString, None) => Value::String("null".to_string()),
            (DataEncoding::Decoded, Some(Value::String(s))) => serde_json::from_str(s)
                .map_err(|e| DaoError::Mapping(format!("data is not valid JSON: {e}")))?,
            (DataEncoding::Decoded, Some(other)) => other.clone(),
            (DataEncoding::Decoded, None) => Value::Null,
        };
        row.insert(FIELD_DATA.to_string(), data);

        for field in [FIELD_TAG_VERSION, FIELD_CHECKSUM, FIELD_TIME_CREATED, FIELD_TIME_UPDATED] {
            row.insert(field.to_string(), gbo.get(field).cloned().unwrap_or(Value::Null));
        }

        for p in &self.promoted {
            row.insert(p.column.clone(), gbo.get(&p.extra).cloned().unwrap_or(Value::Null));
        }

        for (key, value) in gbo.iter().filter(|(k, _)| !is_reserved_field(k)) {
            if self.promoted_for(key).is_some() {
                continue;
            }
            if !self.pass_through_extras {
                warn!(table, extra = %key, "dropping extra attribute without a promoted column");
                continue;
            }
            if self.is_fixed_column(key) {
                return Err(DaoError::Mapping(format!(
                    "extra attribute '{key}' collides with a column of table '{table}'"
                )));
            }
            row.insert(key.clone(), value.clone());
        }
        Ok(row)
    }

    fn to_bo(&self, table: &str, row: &Row) -> DaoResult<GenericBo> {
        let mut gbo = GenericBo::new();
        match row.get(&self.id_column) {
            Some(Value::Null) | None => {
                return Err(DaoError::Mapping(format!(
                    "row of table '{table}' has no '{}' column",
                    self.id_column
                )))
            }
            Some(id) => {
                gbo.insert(FIELD_ID.to_string(), id.clone());
            }
        }

        let data = match row.get(FIELD_DATA) {
            None | Some(Value::Null) => "null".to_string(),
            Some(Value::String(s)) if self.data_encoding == DataEncoding::JsonString => s.clone(),
            Some(other) => other.to_string(),
        };
        gbo.insert(FIELD_DATA.to_string(), Value::String(data));

        for field in [FIELD_TAG_VERSION, FIELD_CHECKSUM, FIELD_TIME_CREATED, FIELD_TIME_UPDATED] {
            if let Some(v) = row.get(field).filter(|v| !v.is_null()) {
                gbo.insert(field.to_string(), v.clone());
            }
        }

        for p in &self.promoted {
            if let Some(v) = row.get(&p.column).filter(|v| !v.is_null()) {
                gbo.insert(p.extra.clone(), v.clone());
            }
        }

        if self.pass_through_extras {
            for (key, value) in row {
                if self.is_fixed_column(key) || self.promoted.iter().any(|p| &p.column == key) {
                    continue;
                }
                gbo.insert(key.clone(), value.clone());
            }
        }
        Ok(gbo)
    }

    fn columns(&self, _table: &str) -> Vec<String> {
        let mut cols = vec![self.id_column.clone()];
        cols.extend(FIXED_FIELDS.iter().map(|f| f.to_string()));
        cols.extend(self.promoted.iter().map(|p| p.column.clone()));
        cols
    }

    fn to_db_col_name(&self, field: &str) -> Option<String> {
        if field == FIELD_ID {
            return Some(self.id_column.clone());
        }
        if is_reserved_field(field) {
            return Some(field.to_string());
        }
        if let Some(p) = self.promoted_for(field) {
            return Some(p.column.clone());
        }
        self.pass_through_extras.then(|| field.to_string())
    }
}
