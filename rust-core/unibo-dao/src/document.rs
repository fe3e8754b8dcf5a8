// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DAO over a document collection.
//
// Documents are keyed by `_id`; `data` is stored decoded so nested fields
// can be filtered on with dotted paths, and every extra is a top-level
// field. Uniqueness comes from unique indexes on the collection.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;
use unibo_core::{BoOptions, UniversalBo};
use unibo_storage::{DocumentBackend, FindQuery};

use crate::config::DocumentDaoConfig;
use crate::dao::{materialize, require_id, snapshot, UniversalDao};
use crate::error::DaoResult;
use crate::filter::{Filter, Sort};
use crate::mapper::{RowMapper, UboRowMapper};

/// [`UniversalDao`] over a [`DocumentBackend`].
pub struct DocumentDao {
    backend: Arc<dyn DocumentBackend>,
    config: DocumentDaoConfig,
    mapper: UboRowMapper,
    opts: BoOptions,
}

impl DocumentDao {
    pub fn new(backend: Arc<dyn DocumentBackend>, config: DocumentDaoConfig) -> Self {
        Self {
            backend,
            config,
            mapper: UboRowMapper::document(),
            opts: BoOptions::default(),
        }
    }

    /// Options applied to BOs materialized from documents.
    pub fn with_options(mut self, opts: BoOptions) -> Self {
        self.opts = opts;
        self
    }

    pub fn config(&self) -> &DocumentDaoConfig {
        &self.config
    }

    fn id_filter(&self, id: &str) -> Value {
        let mut filter = Map::new();
        filter.insert(self.mapper.id_column.clone(), Value::String(id.to_string()));
        Value::Object(filter)
    }
}

#[async_trait]
impl UniversalDao for DocumentDao {
    fn table_name(&self) -> &str {
        &self.config.collection
    }

    async fn create(&self, bo: &UniversalBo) -> DaoResult<bool> {
        let gbo = snapshot(bo);
        let id = require_id(bo.id())?;
        let doc = self.mapper.to_row(&self.config.collection, &gbo)?;
        self.backend.insert_one(&self.config.collection, doc).await?;
        debug!(collection = %self.config.collection, %id, backend = self.backend.name(), "created document");
        Ok(true)
    }

    async fn get(&self, id: &str) -> DaoResult<Option<UniversalBo>> {
        let found = self
            .backend
            .find_one(&self.config.collection, &self.id_filter(id))
            .await?;
        found
            .map(|doc| materialize(&self.mapper, &self.config.collection, &doc, self.opts))
            .transpose()
    }

    async fn get_n(
        &self,
        from_offset: usize,
        max_rows: usize,
        filter: Option<&Filter>,
        sort: Option<&Sort>,
    ) -> DaoResult<Vec<UniversalBo>> {
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
        let docs = self.backend.find(&self.config.collection, &query).await?;
        docs.iter()
            .map(|doc| materialize(&self.mapper, &self.config.collection, doc, self.opts))
            .collect()
    }

    async fn update(&self, bo: &UniversalBo) -> DaoResult<bool> {
        let gbo = snapshot(bo);
        let id = require_id(bo.id())?;
        let doc = self.mapper.to_row(&self.config.collection, &gbo)?;
        let outcome = self
            .backend
            .replace_one(&self.config.collection, &self.id_filter(&id), doc, false)
            .await?;
        debug!(collection = %self.config.collection, %id, matched = outcome.matched, "updated document");
        Ok(outcome.matched > 0)
    }

    async fn save(&self, bo: &UniversalBo) -> DaoResult<(bool, Option<UniversalBo>)> {
        let gbo = snapshot(bo);
        let id = require_id(bo.id())?;
        let doc = self.mapper.to_row(&self.config.collection, &gbo)?;
        let existing = self.get(&id).await?;
        let outcome = self
            .backend
            .replace_one(&self.config.collection, &self.id_filter(&id), doc, true)
            .await?;
        debug!(
            collection = %self.config.collection,
            %id,
            upserted = outcome.upserted,
            "saved document"
        );
        Ok((true, existing))
    }

    async fn delete(&self, bo: &UniversalBo) -> DaoResult<bool> {
        let id = bo.id();
        let removed = self
            .backend
            .delete_one(&self.config.collection, &self.id_filter(&id))
            .await?;
        Ok(removed > 0)
    }
}
