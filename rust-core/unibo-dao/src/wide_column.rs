// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! DAO over a wide-column store, with emulated unique constraints.
//!
//! The store only guarantees primary-key uniqueness, so each unique group is
//! materialized as a row of a companion uidx table keyed by the group's
//! fingerprint (see [`crate::uidx`]). Every write touches the main row and the
//! affected uidx rows in one conditional transaction:
//!
//! | operation | main row                  | uidx rows                                  |
//! |-----------|---------------------------|--------------------------------------------|
//! | create    | put if absent             | put each fingerprint if absent             |
//! | update    | update if present         | for changed groups: delete old, put new    |
//! | delete    | delete if present         | delete each fingerprint of the stored row  |
//!
//! A failed main-row condition means "already exists" on create and "gone"
//! on update/delete; a failed uidx condition means a unique group is taken.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Value};
use tracing::{debug, warn};
use unibo_core::{BoOptions, UniversalBo, FIELD_ID};
use unibo_storage::{Document, ScanRequest, TransactItem, WideColumnBackend, WriteCondition};

use crate::config::WideColumnDaoConfig;
use crate::dao::{materialize, require_id, snapshot, UniversalDao};
use crate::error::{DaoError, DaoResult};
use crate::filter::{Filter, Sort};
use crate::mapper::{Row, RowMapper, UboRowMapper};
use crate::uidx::{classify_cancellation, fingerprints, Cancellation, Fingerprint};

/// Position of the main-row item in every submitted transaction.
const MAIN_ITEM: usize = 0;

/// [`UniversalDao`] over a [`WideColumnBackend`].
pub struct WideColumnDao {
    backend: Arc<dyn WideColumnBackend>,
    config: WideColumnDaoConfig,
    uidx_table: String,
    mapper: UboRowMapper,
    opts: BoOptions,
    /// Sort field -> secondary index name.
    index_map: RwLock<HashMap<String, String>>,
}

impl WideColumnDao {
    /// Build a DAO; the configuration is validated first.
    pub fn new(backend: Arc<dyn WideColumnBackend>, config: WideColumnDaoConfig) -> DaoResult<Self> {
        config.validate()?;
        Ok(Self {
            backend,
            uidx_table: config.uidx_table_name(),
            config,
            mapper: UboRowMapper::wide_column(),
            opts: BoOptions::default(),
            index_map: RwLock::new(HashMap::new()),
        })
    }

    /// Options applied to BOs materialized from items.
    pub fn with_options(mut self, opts: BoOptions) -> Self {
        self.opts = opts;
        self
    }

    pub fn config(&self) -> &WideColumnDaoConfig {
        &self.config
    }

    /// Read in `index_name` order whenever `sort_field` is the first sort key.
    pub fn map_secondary_index(&self, index_name: impl Into<String>, sort_field: impl Into<String>) {
        self.index_map
            .write()
            .insert(sort_field.into(), index_name.into());
    }

    /// Forget the index mapped to `sort_field`; returns its name.
    pub fn unmap_secondary_index(&self, sort_field: &str) -> Option<String> {
        self.index_map.write().remove(sort_field)
    }

    fn index_for(&self, sort_field: &str) -> Option<String> {
        self.index_map.read().get(sort_field).cloned()
    }

    /// Primary key of the main row of `id`.
    fn main_key(&self, id: &str) -> Document {
        let mut key = Document::new();
        if let Some(prefix) = &self.config.pk_prefix {
            key.insert(prefix.attr.clone(), Value::String(prefix.value.clone()));
        }
        key.insert(FIELD_ID.to_string(), Value::String(id.to_string()));
        key
    }

    /// Full main-row item for a BO.
    fn to_item(&self, bo: &UniversalBo) -> DaoResult<Document> {
        let gbo = snapshot(bo);
        let mut item = self.mapper.to_row(&self.config.table, &gbo)?;
        if let Some(prefix) = &self.config.pk_prefix {
            if let Some(v) = item.get(&prefix.attr).filter(|v| v.as_str() != Some(prefix.value.as_str())) {
                return Err(DaoError::Mapping(format!(
                    "extra '{}' = {v} conflicts with the partition prefix of table '{}'",
                    prefix.attr, self.config.table
                )));
            }
            item.insert(prefix.attr.clone(), Value::String(prefix.value.clone()));
        }
        Ok(item)
    }

    /// Stored item back to a BO; the prefix attribute is not an extra.
    fn to_bo(&self, mut item: Document) -> DaoResult<UniversalBo> {
        if let Some(prefix) = &self.config.pk_prefix {
            item.remove(&prefix.attr);
        }
        materialize(&self.mapper, &self.config.table, &item, self.opts)
    }

    fn fingerprints_of(&self, item: &Row) -> Vec<Fingerprint> {
        fingerprints(&self.config.uidx_attrs, item, self.config.hash1, self.config.hash2)
    }

    fn uidx_key(fp: &Fingerprint) -> Document {
        let mut key = Document::new();
        key.insert("uname".to_string(), Value::String(fp.uname.clone()));
        key.insert("uhash".to_string(), Value::String(fp.uhash.clone()));
        key
    }

    fn uidx_put(&self, fp: &Fingerprint, id: &str) -> TransactItem {
        let mut item = Self::uidx_key(fp);
        item.insert(FIELD_ID.to_string(), Value::String(id.to_string()));
        if let Some(prefix) = &self.config.pk_prefix {
            item.insert(prefix.attr.clone(), Value::String(prefix.value.clone()));
        }
        TransactItem::Put {
            table: self.uidx_table.clone(),
            item,
            condition: WriteCondition::KeyNotExists,
        }
    }

    fn uidx_delete(&self, fp: &Fingerprint) -> TransactItem {
        TransactItem::Delete {
            table: self.uidx_table.clone(),
            key: Self::uidx_key(fp),
            condition: WriteCondition::None,
        }
    }

    fn is_key_attr(&self, attr: &str) -> bool {
        attr == FIELD_ID || self.config.pk_prefix.as_ref().is_some_and(|p| p.attr == attr)
    }

    async fn fetch_item(&self, id: &str) -> DaoResult<Option<Document>> {
        Ok(self
            .backend
            .get_item(&self.config.table, &self.main_key(id))
            .await?)
    }

    /// Rewrite the stored `old` item with `bo`.
    async fn update_from(&self, old: &Document, bo: &UniversalBo) -> DaoResult<bool> {
        let id = require_id(bo.id())?;
        let new = self.to_item(bo)?;

        let set: Document = new
            .iter()
            .filter(|(k, _)| !self.is_key_attr(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let remove: Vec<String> = old
            .keys()
            .filter(|k| !self.is_key_attr(k) && !new.contains_key(*k))
            .cloned()
            .collect();

        let mut items = vec![TransactItem::Update {
            table: self.config.table.clone(),
            key: self.main_key(&id),
            set,
            remove,
            condition: WriteCondition::KeyExists,
        }];
        let mut changed = 0usize;
        for (before, after) in self.fingerprints_of(old).iter().zip(self.fingerprints_of(&new).iter()) {
            if before != after {
                items.push(self.uidx_delete(before));
                items.push(self.uidx_put(after, &id));
                changed += 1;
            }
        }

        match self.backend.transact_write(items).await {
            Ok(()) => {
                debug!(table = %self.config.table, %id, changed_groups = changed, "updated item");
                Ok(true)
            }
            Err(e) => match classify_cancellation(&e, MAIN_ITEM) {
                Cancellation::MainRowCondition => Ok(false),
                Cancellation::UniqueViolation => Err(DaoError::DuplicatedEntry(format!(
                    "a unique group of '{id}' is already taken in table '{}'",
                    self.config.table
                ))),
                Cancellation::Other => Err(DaoError::Backend(e)),
            },
        }
    }
}

#[async_trait]
impl UniversalDao for WideColumnDao {
    fn table_name(&self) -> &str {
        &self.config.table
    }

    async fn create(&self, bo: &UniversalBo) -> DaoResult<bool> {
        let id = require_id(bo.id())?;
        let item = self.to_item(bo)?;
        let fps = self.fingerprints_of(&item);

        let mut items = Vec::with_capacity(1 + fps.len());
        items.push(TransactItem::Put {
            table: self.config.table.clone(),
            item,
            condition: WriteCondition::KeyNotExists,
        });
        items.extend(fps.iter().map(|fp| self.uidx_put(fp, &id)));

        match self.backend.transact_write(items).await {
            Ok(()) => {
                debug!(table = %self.config.table, %id, backend = self.backend.name(), "created item");
                Ok(true)
            }
            Err(e) => match classify_cancellation(&e, MAIN_ITEM) {
                Cancellation::MainRowCondition => Err(DaoError::DuplicatedEntry(format!(
                    "id '{id}' already exists in table '{}'",
                    self.config.table
                ))),
                Cancellation::UniqueViolation => Err(DaoError::DuplicatedEntry(format!(
                    "a unique group of '{id}' is already taken in table '{}'",
                    self.config.table
                ))),
                Cancellation::Other => Err(DaoError::Backend(e)),
            },
        }
    }

    async fn get(&self, id: &str) -> DaoResult<Option<UniversalBo>> {
        self.fetch_item(id)
            .await?
            .map(|item| self.to_bo(item))
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
        let mut predicate = filter.map(|f| f.to_predicate(&column)).transpose()?;
        if let Some(prefix) = &self.config.pk_prefix {
            let scope = json!({ "$eq": prefix.value });
            let mut clause = serde_json::Map::new();
            clause.insert(prefix.attr.clone(), scope);
            predicate = Some(match predicate {
                Some(p) => json!({ "$and": [Value::Object(clause), p] }),
                None => Value::Object(clause),
            });
        }

        let (index, descending) = match sort.and_then(|s| s.fields().first()) {
            Some(first) => match self.index_for(&first.field) {
                Some(index) => (Some(index), first.descending),
                None => {
                    debug!(
                        table = %self.config.table,
                        field = %first.field,
                        "no secondary index mapped to sort field, result order is undefined"
                    );
                    (None, false)
                }
            },
            None => (None, false),
        };
        if sort.is_some_and(|s| s.fields().len() > 1) {
            warn!(table = %self.config.table, "only the first sort field is honored");
        }

        let items = self
            .backend
            .scan(&ScanRequest {
                table: self.config.table.clone(),
                index,
                descending,
                filter: predicate,
            })
            .await?;

        let limit = if max_rows == 0 { usize::MAX } else { max_rows };
        items
            .into_iter()
            .skip(from_offset)
            .take(limit)
            .map(|item| self.to_bo(item))
            .collect()
    }

    async fn update(&self, bo: &UniversalBo) -> DaoResult<bool> {
        let id = require_id(bo.id())?;
        match self.fetch_item(&id).await? {
            Some(old) => self.update_from(&old, bo).await,
            None => Ok(false),
        }
    }

    async fn save(&self, bo: &UniversalBo) -> DaoResult<(bool, Option<UniversalBo>)> {
        let id = require_id(bo.id())?;
        match self.fetch_item(&id).await? {
            Some(old) => {
                let previous = self.to_bo(old.clone())?;
                if self.update_from(&old, bo).await? {
                    return Ok((true, Some(previous)));
                }
                // Removed between the read and the write.
                self.create(bo).await.map(|created| (created, None))
            }
            None => self.create(bo).await.map(|created| (created, None)),
        }
    }

    async fn delete(&self, bo: &UniversalBo) -> DaoResult<bool> {
        let id = bo.id();
        let Some(stored) = self.fetch_item(&id).await? else {
            return Ok(false);
        };

        let fps = self.fingerprints_of(&stored);
        let mut items = Vec::with_capacity(1 + fps.len());
        items.push(TransactItem::Delete {
            table: self.config.table.clone(),
            key: self.main_key(&id),
            condition: WriteCondition::KeyExists,
        });
        items.extend(fps.iter().map(|fp| self.uidx_delete(fp)));

        match self.backend.transact_write(items).await {
            Ok(()) => {
                debug!(table = %self.config.table, %id, "deleted item");
                Ok(true)
            }
            Err(e) => match classify_cancellation(&e, MAIN_ITEM) {
                Cancellation::MainRowCondition => Ok(false),
                _ => Err(DaoError::Backend(e)),
            },
        }
    }
}
