// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SQLite connector built on sqlx.
//
// Timestamps and JSON are stored as text, so values are decoded by their
// runtime storage class (INTEGER, REAL, TEXT, BLOB, NULL).

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use tracing::debug;

use crate::error::StorageResult;
use crate::sql::{
    map_sqlx_error, timestamp_text, SqlConnector, SqlFlavor, SqlParam, SqlRow, SqlTransaction,
    Statement,
};

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

fn build(stmt: &Statement) -> SqliteQuery<'_> {
    let mut q = sqlx::query(&stmt.sql);
    for p in &stmt.params {
        q = match p {
            SqlParam::Null => q.bind(None::<String>),
            SqlParam::Bool(b) => q.bind(*b),
            SqlParam::Int(i) => q.bind(*i),
            SqlParam::Float(f) => q.bind(*f),
            SqlParam::Text(s) => q.bind(s.clone()),
            SqlParam::Timestamp(t) => q.bind(timestamp_text(t)),
            SqlParam::Json(v) => q.bind(v.to_string()),
        };
    }
    q
}

fn decode_row(row: &SqliteRow) -> StorageResult<SqlRow> {
    let mut out = SqlRow::new();
    for (i, col) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(i).map_err(map_sqlx_error)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            let type_name = raw.type_info().name().to_string();
            match type_name.as_str() {
                "INTEGER" => Value::from(row.try_get_unchecked::<i64, _>(i).map_err(map_sqlx_error)?),
                "REAL" => Value::from(row.try_get_unchecked::<f64, _>(i).map_err(map_sqlx_error)?),
                "BLOB" => {
                    let bytes = row.try_get_unchecked::<Vec<u8>, _>(i).map_err(map_sqlx_error)?;
                    Value::String(String::from_utf8_lossy(&bytes).into_owned())
                }
                _ => Value::String(row.try_get_unchecked::<String, _>(i).map_err(map_sqlx_error)?),
            }
        };
        out.insert(col.name().to_string(), value);
    }
    Ok(out)
}

/// SQLite-backed [`SqlConnector`].
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    pool: SqlitePool,
}

impl SqliteConnector {
    /// Connect to a SQLite database URL (e.g. `sqlite://app.db?mode=rwc`).
    pub async fn connect(database_url: &str) -> StorageResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        debug!(url = database_url, "connected sqlite");
        Ok(Self { pool })
    }

    /// A private in-memory database.
    ///
    /// Uses a single long-lived connection; every new connection to
    /// `sqlite::memory:` would otherwise open a fresh, empty database.
    pub async fn in_memory() -> StorageResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool. The pool stays owned by the caller's
    /// initialization code; the connector never closes it.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl SqlConnector for SqliteConnector {
    fn flavor(&self) -> SqlFlavor {
        SqlFlavor::Sqlite
    }

    async fn execute(&self, stmt: &Statement) -> StorageResult<u64> {
        let done = build(stmt).execute(&self.pool).await.map_err(map_sqlx_error)?;
        Ok(done.rows_affected())
    }

    async fn fetch_all(&self, stmt: &Statement) -> StorageResult<Vec<SqlRow>> {
        let rows = build(stmt).fetch_all(&self.pool).await.map_err(map_sqlx_error)?;
        rows.iter().map(decode_row).collect()
    }

    async fn begin(&self) -> StorageResult<Box<dyn SqlTransaction>> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(Box::new(SqliteTransaction { tx }))
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

struct SqliteTransaction {
    tx: sqlx::Transaction<'static, Sqlite>,
}

#[async_trait]
impl SqlTransaction for SqliteTransaction {
    async fn execute(&mut self, stmt: &Statement) -> StorageResult<u64> {
        let done = build(stmt).execute(&mut *self.tx).await.map_err(map_sqlx_error)?;
        Ok(done.rows_affected())
    }

    async fn fetch_all(&mut self, stmt: &Statement) -> StorageResult<Vec<SqlRow>> {
        let rows = build(stmt).fetch_all(&mut *self.tx).await.map_err(map_sqlx_error)?;
        rows.iter().map(decode_row).collect()
    }

    async fn commit(self: Box<Self>) -> StorageResult<()> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }

    async fn rollback(self: Box<Self>) -> StorageResult<()> {
        self.tx.rollback().await.map_err(map_sqlx_error)
    }
}
