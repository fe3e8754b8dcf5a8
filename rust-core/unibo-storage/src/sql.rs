// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Relational backend interface.
//
// The SQL DAO builds `Statement`s (SQL text plus positional parameters) in
// the dialect reported by the connector's `SqlFlavor`, then executes them
// through `SqlConnector` or inside a `SqlTransaction`. Rows come back as
// JSON objects keyed by column name, with timestamps in the canonical
// RFC3339 layout.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::StorageResult;

/// A fetched row: column name to decoded value.
pub type SqlRow = Map<String, Value>;

/// SQL dialect spoken by a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlFlavor {
    /// SQLite: `?` placeholders, timestamps stored as canonical text.
    Sqlite,
    /// PostgreSQL: `$n` placeholders, `TIMESTAMPTZ` and `JSONB` columns.
    Postgres,
}

impl SqlFlavor {
    /// Placeholder for the 1-based parameter `n`.
    pub fn placeholder(self, n: usize) -> String {
        match self {
            SqlFlavor::Sqlite => "?".to_string(),
            SqlFlavor::Postgres => format!("${n}"),
        }
    }

    /// Column type used for timestamps.
    pub fn timestamp_type(self) -> &'static str {
        match self {
            SqlFlavor::Sqlite => "TEXT",
            SqlFlavor::Postgres => "TIMESTAMPTZ",
        }
    }

    /// Column type used for the JSON `data` column.
    pub fn json_type(self) -> &'static str {
        match self {
            SqlFlavor::Sqlite => "TEXT",
            SqlFlavor::Postgres => "JSONB",
        }
    }

    /// Paging clause; `limit == 0` means no limit.
    pub fn paging(self, offset: usize, limit: usize) -> String {
        match (self, limit) {
            (_, 0) if offset == 0 => String::new(),
            (SqlFlavor::Sqlite, 0) => format!(" LIMIT -1 OFFSET {offset}"),
            (SqlFlavor::Postgres, 0) => format!(" OFFSET {offset}"),
            (_, limit) => format!(" LIMIT {limit} OFFSET {offset}"),
        }
    }
}

/// Quote an identifier for both supported dialects.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// A positional statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Bound natively on PostgreSQL, as canonical text on SQLite.
    Timestamp(DateTime<Utc>),
    /// Bound as `JSONB` on PostgreSQL, as compact text on SQLite.
    Json(Value),
}

impl SqlParam {
    /// Convert a JSON scalar into a parameter. Arrays and objects are bound
    /// as JSON.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => SqlParam::Null,
            Value::Bool(b) => SqlParam::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SqlParam::Int(i),
                None => SqlParam::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => SqlParam::Text(s.clone()),
            other => SqlParam::Json(other.clone()),
        }
    }
}

/// Canonical text form of a timestamp parameter.
pub fn timestamp_text(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// SQL text plus positional parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Append a parameter.
    pub fn bind(mut self, param: SqlParam) -> Self {
        self.params.push(param);
        self
    }
}

/// A pooled relational database client.
///
/// Unique-constraint violations surface as
/// [`crate::StorageError::DuplicateKey`].
#[async_trait]
pub trait SqlConnector: Send + Sync {
    /// Dialect of the underlying database.
    fn flavor(&self) -> SqlFlavor;

    /// Execute a statement; returns the number of affected rows.
    async fn execute(&self, stmt: &Statement) -> StorageResult<u64>;

    /// Run a query and return all rows.
    async fn fetch_all(&self, stmt: &Statement) -> StorageResult<Vec<SqlRow>>;

    /// Start a transaction on a dedicated connection.
    async fn begin(&self) -> StorageResult<Box<dyn SqlTransaction>>;

    /// A human-readable name for this backend, used in logging.
    fn name(&self) -> &str;
}

/// An open transaction. Dropping it without `commit` rolls back.
#[async_trait]
pub trait SqlTransaction: Send {
    async fn execute(&mut self, stmt: &Statement) -> StorageResult<u64>;

    async fn fetch_all(&mut self, stmt: &Statement) -> StorageResult<Vec<SqlRow>>;

    async fn commit(self: Box<Self>) -> StorageResult<()>;

    async fn rollback(self: Box<Self>) -> StorageResult<()>;
}

/// Storage type of a promoted column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlColumnType {
    #[default]
    Text,
    BigInt,
    Double,
    Boolean,
    Timestamp,
}

impl SqlColumnType {
    fn ddl(self, flavor: SqlFlavor) -> &'static str {
        match self {
            SqlColumnType::Text => "TEXT",
            SqlColumnType::BigInt => "BIGINT",
            SqlColumnType::Double => "DOUBLE PRECISION",
            SqlColumnType::Boolean => "BOOLEAN",
            SqlColumnType::Timestamp => flavor.timestamp_type(),
        }
    }
}

/// A promoted column declared by the table initializer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlColumnSpec {
    pub name: String,
    #[serde(default)]
    pub column_type: SqlColumnType,
}

/// Layout of a BO table: fixed columns plus promoted ones.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SqlTableSpec {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<SqlColumnSpec>,
    /// Column groups covered by a unique index.
    #[serde(default)]
    pub unique: Vec<Vec<String>>,
}

impl SqlTableSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a promoted column.
    pub fn with_column(mut self, name: impl Into<String>, column_type: SqlColumnType) -> Self {
        self.columns.push(SqlColumnSpec {
            name: name.into(),
            column_type,
        });
        self
    }

    /// Add a unique index over `columns`.
    pub fn with_unique(mut self, columns: &[&str]) -> Self {
        self.unique
            .push(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    /// DDL statements creating the table and its unique indexes.
    pub fn ddl(&self, flavor: SqlFlavor) -> Vec<String> {
        let ts = flavor.timestamp_type();
        let mut cols = vec![
            format!("{} TEXT PRIMARY KEY", quote_ident("id")),
            format!("{} {}", quote_ident("data"), flavor.json_type()),
            format!("{} TEXT", quote_ident("csum")),
            format!("{} BIGINT", quote_ident("tver")),
            format!("{} {ts}", quote_ident("tcre")),
            format!("{} {ts}", quote_ident("tupd")),
        ];
        for c in &self.columns {
            cols.push(format!("{} {}", quote_ident(&c.name), c.column_type.ddl(flavor)));
        }
        let mut out = vec![format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(&self.name),
            cols.join(", ")
        )];
        for group in &self.unique {
            let index = format!("uidx_{}_{}", self.name, group.join("_"));
            let columns: Vec<String> = group.iter().map(|c| quote_ident(c)).collect();
            out.push(format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {} ({})",
                quote_ident(&index),
                quote_ident(&self.name),
                columns.join(", ")
            ));
        }
        out
    }
}

/// Create a BO table and its unique indexes if they do not exist.
pub async fn init_sql_table(conn: &dyn SqlConnector, spec: &SqlTableSpec) -> StorageResult<()> {
    for sql in spec.ddl(conn.flavor()) {
        conn.execute(&Statement::new(sql)).await?;
    }
    debug!(table = %spec.name, backend = conn.name(), "initialized sql table");
    Ok(())
}

#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> crate::error::StorageError {
    use crate::error::StorageError;
    match err {
        sqlx::Error::Database(db) => {
            if db.is_unique_violation() || db.code().as_deref() == Some("23505") {
                StorageError::DuplicateKey(db.message().to_string())
            } else {
                StorageError::InvalidRequest(db.message().to_string())
            }
        }
        sqlx::Error::Io(e) => StorageError::Io(e),
        e @ (sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed) => {
            StorageError::BackendUnavailable(e.to_string())
        }
        e @ (sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_)) => {
            StorageError::CorruptedData(e.to_string())
        }
        other => StorageError::BackendUnavailable(other.to_string()),
    }
}
