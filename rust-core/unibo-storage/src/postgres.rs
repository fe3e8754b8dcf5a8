// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PostgreSQL connector built on sqlx.
//
// Timestamps are bound and read as `TIMESTAMPTZ` (microsecond precision),
// the `data` column as `JSONB`. NULL parameters are bound as untyped text,
// so they can only target text-compatible columns.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions, PgRow, Postgres};
use sqlx::types::Json;
use sqlx::{Column, Row, TypeInfo, ValueRef};
use tracing::debug;

use crate::error::StorageResult;
use crate::sql::{
    map_sqlx_error, timestamp_text, SqlConnector, SqlFlavor, SqlParam, SqlRow, SqlTransaction,
    Statement,
};

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

fn build(stmt: &Statement) -> PgQuery<'_> {
    let mut q = sqlx::query(&stmt.sql);
    for p in &stmt.params {
        q = match p {
            SqlParam::Null => q.bind(None::<String>),
            SqlParam::Bool(b) => q.bind(*b),
            SqlParam::Int(i) => q.bind(*i),
            SqlParam::Float(f) => q.bind(*f),
            SqlParam::Text(s) => q.bind(s.clone()),
            SqlParam::Timestamp(t) => q.bind(*t),
            SqlParam::Json(v) => q.bind(Json(v.clone())),
        };
    }
    q
}

fn decode_row(row: &PgRow) -> StorageResult<SqlRow> {
    let mut out = SqlRow::new();
    for (i, col) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(i).map_err(map_sqlx_error)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            let type_name = raw.type_info().name().to_string();
            match type_name.as_str() {
                "INT2" => Value::from(row.try_get_unchecked::<i16, _>(i).map_err(map_sqlx_error)?),
                "INT4" => Value::from(row.try_get_unchecked::<i32, _>(i).map_err(map_sqlx_error)?),
                "INT8" => Value::from(row.try_get_unchecked::<i64, _>(i).map_err(map_sqlx_error)?),
                "FLOAT4" => Value::from(row.try_get_unchecked::<f32, _>(i).map_err(map_sqlx_error)?),
                "FLOAT8" => Value::from(row.try_get_unchecked::<f64, _>(i).map_err(map_sqlx_error)?),
                "BOOL" => Value::Bool(row.try_get_unchecked::<bool, _>(i).map_err(map_sqlx_error)?),
                "TIMESTAMPTZ" => {
                    let t = row
                        .try_get_unchecked::<DateTime<Utc>, _>(i)
                        .map_err(map_sqlx_error)?;
                    Value::String(timestamp_text(&t))
                }
                "JSON" | "JSONB" => row
                    .try_get_unchecked::<Json<Value>, _>(i)
                    .map_err(map_sqlx_error)?
                    .0,
                _ => Value::String(row.try_get_unchecked::<String, _>(i).map_err(map_sqlx_error)?),
            }
        };
        out.insert(col.name().to_string(), value);
    }
    Ok(out)
}

/// PostgreSQL-backed [`SqlConnector`].
#[derive(Debug, Clone)]
pub struct PostgresConnector {
    pool: PgPool,
}

impl PostgresConnector {
    /// Connect to PostgreSQL.
    pub async fn connect(database_url: &str) -> StorageResult<Self> {
        Self::connect_with_options(database_url, 10, 5).await
    }

    /// Connect with explicit pool parameters.
    pub async fn connect_with_options(
        database_url: &str,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> StorageResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(connect_timeout_secs))
            .connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        debug!(max_connections, "connected postgres");
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SqlConnector for PostgresConnector {
    fn flavor(&self) -> SqlFlavor {
        SqlFlavor::Postgres
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
        Ok(Box::new(PostgresTransaction { tx }))
    }

    fn name(&self) -> &str {
        "postgres"
    }
}

struct PostgresTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl SqlTransaction for PostgresTransaction {
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
