// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DAO over a relational table.
//
// Layout: `id` primary key, `data` JSON text (JSONB on PostgreSQL), `csum`,
// `tver`, `tcre`, `tupd`, plus one column per promoted extra. Uniqueness
// beyond `id` comes from unique indexes created by the table initializer;
// their violations surface as `DaoError::DuplicatedEntry`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};
use unibo_core::{
    parse_timestamp, BoOptions, UniversalBo, FIELD_DATA, FIELD_ID, FIELD_TIME_CREATED,
    FIELD_TIME_UPDATED,
};
use unibo_storage::sql::quote_ident;
use unibo_storage::{SqlConnector, SqlFlavor, SqlParam, SqlRow, SqlTransaction, Statement};

use crate::config::SqlDaoConfig;
use crate::dao::{materialize, require_id, snapshot, UniversalDao};
use crate::error::{DaoError, DaoResult};
use crate::filter::{Filter, Sort};
use crate::mapper::{ColumnKind, Row, RowMapper, UboRowMapper};

/// [`UniversalDao`] over a [`SqlConnector`].
pub struct SqlDao {
    conn: Arc<dyn SqlConnector>,
    config: SqlDaoConfig,
    mapper: UboRowMapper,
    opts: BoOptions,
}

impl SqlDao {
    pub fn new(conn: Arc<dyn SqlConnector>, config: SqlDaoConfig) -> Self {
        let mapper = UboRowMapper::sql(config.promoted_columns.clone());
        Self {
            conn,
            config,
            mapper,
            opts: BoOptions::default(),
        }
    }

    /// Options applied to BOs materialized from rows.
    pub fn with_options(mut self, opts: BoOptions) -> Self {
        self.opts = opts;
        self
    }

    pub fn config(&self) -> &SqlDaoConfig {
        &self.config
    }

    pub fn mapper(&self) -> &UboRowMapper {
        &self.mapper
    }

    fn flavor(&self) -> SqlFlavor {
        self.conn.flavor()
    }

    fn table(&self) -> String {
        quote_ident(&self.config.table)
    }

    fn id_column(&self) -> String {
        quote_ident(&self.mapper.id_column)
    }

    fn select_list(&self) -> String {
        self.mapper
            .columns(&self.config.table)
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn is_timestamp_column(&self, column: &str) -> bool {
        column == FIELD_TIME_CREATED
            || column == FIELD_TIME_UPDATED
            || self
                .mapper
                .promoted
                .iter()
                .any(|p| p.column == column && p.kind == ColumnKind::Timestamp)
    }

    /// Quoted column and timestamp flag for a BO field.
    fn column_ref(&self, field: &str) -> Option<(String, bool)> {
        let column = self.mapper.to_db_col_name(field)?;
        let is_ts = self.is_timestamp_column(&column);
        Some((quote_ident(&column), is_ts))
    }

    fn param(&self, column: &str, value: &Value) -> DaoResult<SqlParam> {
        match value {
            Value::String(s) if column == FIELD_DATA => serde_json::from_str(s)
                .map(SqlParam::Json)
                .map_err(|e| DaoError::Mapping(format!("data is not valid JSON: {e}"))),
            Value::String(s) if self.is_timestamp_column(column) => parse_timestamp(s)
                .map(SqlParam::Timestamp)
                .map_err(DaoError::from),
            other => Ok(SqlParam::from_json(other)),
        }
    }

    /// Columns and bound values of `row`, in `columns()` order.
    fn bindings(&self, row: &Row) -> DaoResult<Vec<(String, SqlParam)>> {
        self.mapper
            .columns(&self.config.table)
            .into_iter()
            .map(|c| {
                let value = row.get(&c).unwrap_or(&Value::Null);
                let param = self.param(&c, value)?;
                Ok((c, param))
            })
            .collect()
    }

    fn insert_statement(&self, row: &Row) -> DaoResult<Statement> {
        let bindings = self.bindings(row)?;
        let flavor = self.flavor();
        let columns: Vec<String> = bindings.iter().map(|(c, _)| quote_ident(c)).collect();
        let placeholders: Vec<String> = (1..=bindings.len()).map(|n| flavor.placeholder(n)).collect();
        let mut stmt = Statement::new(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table(),
            columns.join(", "),
            placeholders.join(", ")
        ));
        stmt.params = bindings.into_iter().map(|(_, p)| p).collect();
        Ok(stmt)
    }

    fn update_statement(&self, id: &str, row: &Row) -> DaoResult<Statement> {
        let flavor = self.flavor();
        let mut sets = Vec::new();
        let mut params = Vec::new();
        for (column, param) in self.bindings(row)? {
            if column == self.mapper.id_column {
                continue;
            }
            params.push(param);
            sets.push(format!("{} = {}", quote_ident(&column), flavor.placeholder(params.len())));
        }
        params.push(SqlParam::Text(id.to_string()));
        let mut stmt = Statement::new(format!(
            "UPDATE {} SET {} WHERE {} = {}",
            self.table(),
            sets.join(", "),
            self.id_column(),
            flavor.placeholder(params.len())
        ));
        stmt.params = params;
        Ok(stmt)
    }

    fn select_by_id(&self, id: &str) -> Statement {
        Statement::new(format!(
            "SELECT {} FROM {} WHERE {} = {}",
            self.select_list(),
            self.table(),
            self.id_column(),
            self.flavor().placeholder(1)
        ))
        .bind(SqlParam::Text(id.to_string()))
    }

    fn delete_by_id(&self, id: &str) -> Statement {
        Statement::new(format!(
            "DELETE FROM {} WHERE {} = {}",
            self.table(),
            self.id_column(),
            self.flavor().placeholder(1)
        ))
        .bind(SqlParam::Text(id.to_string()))
    }

    fn first_bo(&self, rows: Vec<SqlRow>) -> DaoResult<Option<UniversalBo>> {
        rows.first()
            .map(|row| materialize(&self.mapper, &self.config.table, row, self.opts))
            .transpose()
    }

    async fn save_in_transaction(
        &self,
        tx: &mut Box<dyn SqlTransaction>,
        id: &str,
        row: &Row,
    ) -> DaoResult<Option<UniversalBo>> {
        let existing = self.first_bo(tx.fetch_all(&self.select_by_id(id)).await?)?;
        if tx.execute(&self.update_statement(id, row)?).await? == 0 {
            tx.execute(&self.insert_statement(row)?).await?;
        }
        Ok(existing)
    }
}

#[async_trait]
impl UniversalDao for SqlDao {
    fn table_name(&self) -> &str {
        &self.config.table
    }

    async fn create(&self, bo: &UniversalBo) -> DaoResult<bool> {
        let gbo = snapshot(bo);
        let id = require_id(bo.id())?;
        let row = self.mapper.to_row(&self.config.table, &gbo)?;
        match self.conn.execute(&self.insert_statement(&row)?).await {
            Ok(n) => {
                debug!(table = %self.config.table, %id, "created row");
                Ok(n > 0)
            }
            Err(e) => {
                let err = DaoError::from(e);
                if err.is_duplicated_entry() {
                    debug!(table = %self.config.table, %id, "duplicate on create");
                }
                Err(err)
            }
        }
    }

    async fn get(&self, id: &str) -> DaoResult<Option<UniversalBo>> {
        let rows = self.conn.fetch_all(&self.select_by_id(id)).await?;
        self.first_bo(rows)
    }

    async fn get_n(
        &self,
        from_offset: usize,
        max_rows: usize,
        filter: Option<&Filter>,
        sort: Option<&Sort>,
    ) -> DaoResult<Vec<UniversalBo>> {
        let flavor = self.flavor();
        let mut params = Vec::new();
        let mut sql = format!("SELECT {} FROM {}", self.select_list(), self.table());
        if let Some(filter) = filter {
            let clause = filter.to_sql(flavor, &|f| self.column_ref(f), &mut params)?;
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }
        let order = match sort.filter(|s| !s.is_empty()) {
            Some(sort) => sort.resolve(&|f| self.mapper.to_db_col_name(f))?,
            None => vec![(self.mapper.id_column.clone(), false)],
        };
        let order: Vec<String> = order
            .iter()
            .map(|(c, desc)| format!("{} {}", quote_ident(c), if *desc { "DESC" } else { "ASC" }))
            .collect();
        sql.push_str(" ORDER BY ");
        sql.push_str(&order.join(", "));
        sql.push_str(&flavor.paging(from_offset, max_rows));

        let mut stmt = Statement::new(sql);
        stmt.params = params;
        let rows = self.conn.fetch_all(&stmt).await?;
        rows.iter()
            .map(|row| materialize(&self.mapper, &self.config.table, row, self.opts))
            .collect()
    }

    async fn update(&self, bo: &UniversalBo) -> DaoResult<bool> {
        let gbo = snapshot(bo);
        let id = require_id(bo.id())?;
        let row = self.mapper.to_row(&self.config.table, &gbo)?;
        let n = self.conn.execute(&self.update_statement(&id, &row)?).await?;
        debug!(table = %self.config.table, %id, updated = n > 0, "updated row");
        Ok(n > 0)
    }

    async fn save(&self, bo: &UniversalBo) -> DaoResult<(bool, Option<UniversalBo>)> {
        let gbo = snapshot(bo);
        let id = require_id(bo.id())?;
        let row = self.mapper.to_row(&self.config.table, &gbo)?;

        if self.config.tx_mode_on_write {
            let mut tx = self.conn.begin().await?;
            match self.save_in_transaction(&mut tx, &id, &row).await {
                Ok(existing) => {
                    tx.commit().await?;
                    debug!(table = %self.config.table, %id, "saved row (transactional)");
                    return Ok((true, existing));
                }
                Err(e) => {
                    if let Err(rollback) = tx.rollback().await {
                        warn!(table = %self.config.table, %id, error = %rollback, "rollback after failed save also failed");
                    }
                    return Err(e);
                }
            }
        }

        let existing = self.get(&id).await?;
        if self.conn.execute(&self.update_statement(&id, &row)?).await? == 0 {
            self.conn.execute(&self.insert_statement(&row)?).await?;
        }
        debug!(table = %self.config.table, %id, "saved row");
        Ok((true, existing))
    }

    async fn delete(&self, bo: &UniversalBo) -> DaoResult<bool> {
        let id = bo.id();
        let n = self.conn.execute(&self.delete_by_id(&id)).await?;
        debug!(table = %self.config.table, %id, deleted = n > 0, "deleted row");
        Ok(n > 0)
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::mapper::PromotedColumn;
    use unibo_storage::{init_sql_table, SqlColumnType, SqlTableSpec, SqliteConnector};

    async fn dao(tx_mode: bool) -> SqlDao {
        let conn = SqliteConnector::in_memory().await.unwrap();
        let spec = SqlTableSpec::new("users")
            .with_column("email", SqlColumnType::Text)
            .with_column("age", SqlColumnType::BigInt)
            .with_unique(&["email"]);
        init_sql_table(&conn, &spec).await.unwrap();
        let config = SqlDaoConfig::new("users")
            .with_promoted(PromotedColumn::new("email"))
            .with_promoted(PromotedColumn::new("age"))
            .with_tx_mode(tx_mode);
        SqlDao::new(Arc::new(conn), config)
    }

    fn user(id: &str, email: &str, age: i64) -> UniversalBo {
        let bo = UniversalBo::new(id, 1);
        bo.set_extra_attr("email", email);
        bo.set_extra_attr("age", age);
        bo
    }

    #[tokio::test]
    async fn test_statements_use_flavor_placeholders() {
        let dao = dao(false).await;
        let row = dao
            .mapper()
            .to_row("users", &user("1", "a@b", 3).to_generic())
            .unwrap();
        let stmt = dao.update_statement("1", &row).unwrap();
        assert!(stmt.sql.starts_with("UPDATE \"users\" SET \"data\" = ?"));
        assert!(stmt.sql.ends_with("WHERE \"id\" = ?"));
        assert_eq!(stmt.params.len(), 8);
        assert_eq!(stmt.params[7], SqlParam::Text("1".into()));
    }

    #[tokio::test]
    async fn test_save_in_transaction_mode() {
        let dao = dao(true).await;
        let bo = user("1", "a@b", 3);
        let (saved, previous) = dao.save(&bo).await.unwrap();
        assert!(saved);
        assert!(previous.is_none());

        bo.set_extra_attr("age", 4);
        let (_, previous) = dao.save(&bo).await.unwrap();
        assert_eq!(previous.unwrap().extra_attr("age"), Some(serde_json::json!(3)));

        // A unique violation rolls the transaction back.
        let other = user("2", "a@b", 5);
        assert!(dao.save(&other).await.unwrap_err().is_duplicated_entry());
        assert!(dao.get("2").await.unwrap().is_none());
        assert!(dao.get("1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_filter_on_unpromoted_field_is_rejected() {
        let dao = dao(false).await;
        let err = dao
            .get_all(Some(&Filter::eq("nickname", "x")), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DaoError::InvalidFilter(_)));
        let err = dao
            .get_all(None, Some(&Sort::by("nickname", false)))
            .await
            .unwrap_err();
        assert!(matches!(err, DaoError::InvalidFilter(_)));
    }

    #[tokio::test]
    async fn test_dropped_extras_are_not_stored() {
        let dao = dao(false).await;
        let bo = user("1", "a@b", 3);
        bo.set_extra_attr("nickname", "bob");
        assert!(dao.create(&bo).await.unwrap());
        let got = dao.get("1").await.unwrap().unwrap();
        assert_eq!(got.extra_attr("nickname"), None);
        assert_eq!(got.extra_attr("email"), Some(serde_json::json!("a@b")));
    }
}
