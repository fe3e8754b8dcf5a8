// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DAO over a partitioned document container.
//
// Every write addresses one partition, derived from the BO: either a fixed
// value for the whole DAO or the value of an extras key. Ids and unique keys
// are scoped to the partition. With an extras-derived key, `get` and `get_n`
// do not know the partition up front and need cross-partition reads enabled.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};
use unibo_core::{BoOptions, UniversalBo};
use unibo_storage::{FindQuery, PartitionedDocumentBackend};

use crate::config::{PartitionKeySource, PartitionedDocDaoConfig};
use crate::dao::{materialize, require_id, snapshot, UniversalDao};
use crate::error::{DaoError, DaoResult};
use crate::filter::{Filter, Sort};
use crate::mapper::{Row, RowMapper, UboRowMapper};

/// [`UniversalDao`] over a [`PartitionedDocumentBackend`].
pub struct PartitionedDocumentDao {
    backend: Arc<dyn PartitionedDocumentBackend>,
    config: PartitionedDocDaoConfig,
    mapper: UboRowMapper,
    opts: BoOptions,
}

impl PartitionedDocumentDao {
    /// Build the DAO; fails if the configuration does not validate.
    pub fn new(
        backend: Arc<dyn PartitionedDocumentBackend>,
        config: PartitionedDocDaoConfig,
    ) -> DaoResult<Self> {
        config.validate()?;
        Ok(Self {
            backend,
            config,
            mapper: UboRowMapper::partitioned_document(),
            opts: BoOptions::default(),
        })
    }

    /// Options applied to BOs materialized from items.
    pub fn with_options(mut self, opts: BoOptions) -> Self {
        self.opts = opts;
        self
    }

    pub fn config(&self) -> &PartitionedDocDaoConfig {
        &self.config
    }

    /// Point-read an item from a known partition.
    pub async fn get_in_partition(&self, partition: &str, id: &str) -> DaoResult<Option<UniversalBo>> {
        let found = self
            .backend
            .read_item(&self.config.container, partition, id)
            .await?;
        found.map(|doc| self.to_bo(&doc)).transpose()
    }

    fn to_bo(&self, doc: &Row) -> DaoResult<UniversalBo> {
        materialize(&self.mapper, &self.config.container, doc, self.opts)
    }

    /// Partition a BO is written to.
    fn partition_of(&self, bo: &UniversalBo) -> DaoResult<String> {
        match &self.config.partition_key {
            PartitionKeySource::Fixed(value) => Ok(value.clone()),
            PartitionKeySource::Extra(key) => match bo.extra_attr(key) {
                Some(Value::String(s)) if !s.is_empty() => Ok(s),
                Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(v.to_string()),
                _ => Err(DaoError::Configuration(format!(
                    "business object '{}' has no usable partition key '{key}'",
                    bo.id()
                ))),
            },
        }
    }

    /// Partition scope of reads: `Some(p)` for a fixed key, `None` for a
    /// cross-partition read.
    fn read_scope(&self) -> DaoResult<Option<&str>> {
        match &self.config.partition_key {
            PartitionKeySource::Fixed(value) => Ok(Some(value.as_str())),
            PartitionKeySource::Extra(key) if self.config.cross_partition => {
                debug!(container = %self.config.container, key = %key, "cross-partition read");
                Ok(None)
            }
            PartitionKeySource::Extra(key) => Err(DaoError::Configuration(format!(
                "partition key comes from extra '{key}'; enable cross-partition reads or use get_in_partition"
            ))),
        }
    }
}

#[async_trait]
impl UniversalDao for PartitionedDocumentDao {
    fn table_name(&self) -> &str {
        &self.config.container
    }

    async fn create(&self, bo: &UniversalBo) -> DaoResult<bool> {
        let gbo = snapshot(bo);
        let id = require_id(bo.id())?;
        let partition = self.partition_of(bo)?;
        let doc = self.mapper.to_row(&self.config.container, &gbo)?;
        self.backend
            .create_item(&self.config.container, &partition, doc)
            .await?;
        debug!(container = %self.config.container, %partition, %id, "created item");
        Ok(true)
    }

    async fn get(&self, id: &str) -> DaoResult<Option<UniversalBo>> {
        match self.read_scope()? {
            Some(partition) => self.get_in_partition(partition, id).await,
            None => {
                let query = FindQuery {
                    filter: Some(json!({ "id": id })),
                    limit: 2,
                    ..FindQuery::default()
                };
                let found = self
                    .backend
                    .query_items(&self.config.container, None, &query)
                    .await?;
                if found.len() > 1 {
                    warn!(container = %self.config.container, %id, "id present in several partitions, returning the first");
                }
                found.first().map(|doc| self.to_bo(doc)).transpose()
            }
        }
    }

    async fn get_n(
        &self,
        from_offset: usize,
        max_rows: usize,
        filter: Option<&Filter>,
        sort: Option<&Sort>,
    ) -> DaoResult<Vec<UniversalBo>> {
        let scope = self.read_scope()?;
        let column = |f: &str| self.mapper.to_db_col_name(f);
        let query = FindQuery {
            filter: filter.map(|f| f.to_predicate(&column)).transpose()?,
            sort: match sort.filter(|s| !s.is_empty()) {
                Some(sort) => sort.resolve(&column)?,
                None => vec![(self.mapper.id_column.clone(), false)],
            },
            skip: from_offset,
            limit: max_rows,
        };
        let docs = self
            .backend
            .query_items(&self.config.container, scope, &query)
            .await?;
        docs.iter().map(|doc| self.to_bo(doc)).collect()
    }

    async fn update(&self, bo: &UniversalBo) -> DaoResult<bool> {
        let gbo = snapshot(bo);
        let id = require_id(bo.id())?;
        let partition = self.partition_of(bo)?;
        let doc = self.mapper.to_row(&self.config.container, &gbo)?;
        let replaced = self
            .backend
            .replace_item(&self.config.container, &partition, &id, doc)
            .await?;
        debug!(container = %self.config.container, %partition, %id, replaced, "updated item");
        Ok(replaced)
    }

    async fn save(&self, bo: &UniversalBo) -> DaoResult<(bool, Option<UniversalBo>)> {
        let gbo = snapshot(bo);
        let id = require_id(bo.id())?;
        let partition = self.partition_of(bo)?;
        let doc = self.mapper.to_row(&self.config.container, &gbo)?;
        let existing = self.get_in_partition(&partition, &id).await?;
        self.backend
            .upsert_item(&self.config.container, &partition, doc)
            .await?;
        debug!(container = %self.config.container, %partition, %id, "saved item");
        Ok((true, existing))
    }

    async fn delete(&self, bo: &UniversalBo) -> DaoResult<bool> {
        let id = bo.id();
        let partition = self.partition_of(bo)?;
        Ok(self
            .backend
            .delete_item(&self.config.container, &partition, &id)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unibo_storage::InMemoryPartitionedBackend;

    async fn store() -> InMemoryPartitionedBackend {
        let store = InMemoryPartitionedBackend::new();
        store.create_container("users", &[&["email"]]).await;
        store
    }

    fn user(id: &str, tenant: &str, email: &str) -> UniversalBo {
        let bo = UniversalBo::new(id, 1);
        bo.set_extra_attr("tenant", tenant);
        bo.set_extra_attr("email", email);
        bo
    }

    #[tokio::test]
    async fn test_extra_partition_requires_cross_partition_reads() {
        let store = store().await;
        let config = PartitionedDocDaoConfig::new("users", PartitionKeySource::Extra("tenant".into()));
        let dao = PartitionedDocumentDao::new(Arc::new(store.clone()), config.clone()).unwrap();
        dao.create(&user("1", "acme", "a@b")).await.unwrap();
        assert!(matches!(dao.get("1").await, Err(DaoError::Configuration(_))));
        assert!(dao.get_in_partition("acme", "1").await.unwrap().is_some());

        let cross = PartitionedDocumentDao::new(Arc::new(store), config.with_cross_partition(true)).unwrap();
        assert_eq!(cross.get("1").await.unwrap().unwrap().id(), "1");
        assert_eq!(cross.get_all(None, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unique_keys_are_scoped_to_partition() {
        let store = store().await;
        let config = PartitionedDocDaoConfig::new("users", PartitionKeySource::Extra("tenant".into()));
        let dao = PartitionedDocumentDao::new(Arc::new(store.clone()), config).unwrap();
        dao.create(&user("1", "acme", "a@b")).await.unwrap();
        dao.create(&user("2", "globex", "a@b")).await.unwrap();
        let err = dao.create(&user("3", "acme", "a@b")).await.unwrap_err();
        assert!(err.is_duplicated_entry());
        assert_eq!(store.count("users", "acme").await, 1);
        assert_eq!(store.count("users", "globex").await, 1);
    }

    #[tokio::test]
    async fn test_write_without_partition_value() {
        let store = store().await;
        let config = PartitionedDocDaoConfig::new("users", PartitionKeySource::Extra("tenant".into()));
        let dao = PartitionedDocumentDao::new(Arc::new(store), config).unwrap();
        let bo = UniversalBo::new("1", 1);
        assert!(matches!(dao.create(&bo).await, Err(DaoError::Configuration(_))));
        bo.set_extra_attr("tenant", "");
        assert!(matches!(dao.create(&bo).await, Err(DaoError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_empty_fixed_partition_rejected() {
        let config = PartitionedDocDaoConfig::new("users", PartitionKeySource::Fixed(String::new()));
        let built = PartitionedDocumentDao::new(Arc::new(store().await), config);
        assert!(matches!(built, Err(DaoError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_fixed_partition() {
        let store = store().await;
        let config = PartitionedDocDaoConfig::new("users", PartitionKeySource::Fixed("all".into()));
        let dao = PartitionedDocumentDao::new(Arc::new(store.clone()), config).unwrap();
        let bo = user("1", "acme", "a@b");
        assert!(dao.create(&bo).await.unwrap());
        bo.set_extra_attr("email", "c@d");
        assert!(dao.update(&bo).await.unwrap());
        let got = dao.get("1").await.unwrap().unwrap();
        assert_eq!(got.extra_attr("email"), Some(json!("c@d")));
        assert_eq!(store.count("users", "all").await, 1);
        assert!(dao.delete(&bo).await.unwrap());
        assert!(!dao.delete(&bo).await.unwrap());
    }
}
