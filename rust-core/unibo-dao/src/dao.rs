// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The storage-agnostic DAO contract.
//
// Every DAO presents the same operations; applications pick a backend at
// construction time and hold the DAO as `Arc<dyn UniversalDao>`. A missing
// row is reported as `None`/`false`, never as an error.

use async_trait::async_trait;
use unibo_core::{BoOptions, GenericBo, SyncOptions, UniversalBo};

use crate::error::{DaoError, DaoResult};
use crate::filter::{Filter, Sort};
use crate::mapper::{Row, RowMapper};

/// Uniform CRUD operations over universal business objects.
#[async_trait]
pub trait UniversalDao: Send + Sync {
    /// Table, collection or container this DAO writes to.
    fn table_name(&self) -> &str;

    /// Insert a new BO. A taken id or unique group is
    /// [`DaoError::DuplicatedEntry`].
    async fn create(&self, bo: &UniversalBo) -> DaoResult<bool>;

    /// Fetch a BO by id.
    async fn get(&self, id: &str) -> DaoResult<Option<UniversalBo>>;

    /// Fetch a page of BOs. `max_rows == 0` means no limit.
    async fn get_n(
        &self,
        from_offset: usize,
        max_rows: usize,
        filter: Option<&Filter>,
        sort: Option<&Sort>,
    ) -> DaoResult<Vec<UniversalBo>>;

    /// Fetch every matching BO.
    async fn get_all(&self, filter: Option<&Filter>, sort: Option<&Sort>) -> DaoResult<Vec<UniversalBo>> {
        self.get_n(0, 0, filter, sort).await
    }

    /// Overwrite an existing BO; `false` if it does not exist.
    async fn update(&self, bo: &UniversalBo) -> DaoResult<bool>;

    /// Create or update. Returns the stored value from before the save, if
    /// there was one.
    async fn save(&self, bo: &UniversalBo) -> DaoResult<(bool, Option<UniversalBo>)>;

    /// Remove a BO; `false` if it does not exist.
    async fn delete(&self, bo: &UniversalBo) -> DaoResult<bool>;
}

/// Snapshot a caller's BO for writing: clone (leaving the caller's object
/// untouched), sync the clone, flatten it.
pub(crate) fn snapshot(bo: &UniversalBo) -> GenericBo {
    let copy = bo.clone();
    copy.sync(SyncOptions::default());
    copy.to_generic()
}

/// Materialize a fetched row.
pub(crate) fn materialize(
    mapper: &dyn RowMapper,
    table: &str,
    row: &Row,
    opts: BoOptions,
) -> DaoResult<UniversalBo> {
    let gbo = mapper.to_bo(table, row)?;
    UniversalBo::from_generic(&gbo, opts)
        .ok_or_else(|| DaoError::Mapping(format!("row of table '{table}' holds invalid data JSON")))
}

/// Id of a BO as a write key; blank ids are rejected.
pub(crate) fn require_id(bo_id: String) -> DaoResult<String> {
    if bo_id.is_empty() {
        Err(DaoError::Mapping("business object id is empty".to_string()))
    } else {
        Ok(bo_id)
    }
}
