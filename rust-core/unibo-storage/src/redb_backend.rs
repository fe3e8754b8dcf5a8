// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// redb-backed persistent wide-column backend.
//
// Uses redb (pure Rust, B-tree, ACID, single-file database) to provide a
// durable wide-column store with conditional transactional writes.
//
// # Design
//
// - One redb table per wide-column table. Keys are the encoded primary key
//   (see `crate::wide_column::encode_key`), values are the item as JSON.
// - Table layouts are persisted in a metadata table and cached in memory,
//   so a reopened database keeps its key attributes and indexes.
// - `transact_write` checks every condition inside a single write
//   transaction, then applies all items and commits. Any failed check
//   aborts the transaction, so nothing is applied.
// - Secondary-index scans read the base table and sort by the index
//   attribute; redb has no native secondary indexes.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use tracing::debug;

use crate::backend::{
    Document, ScanRequest, TableSpec, TransactItem, WideColumnBackend, WriteCondition,
};
use crate::error::{CancellationReason, StorageError, StorageResult};
use crate::wide_column::{
    apply_update, check_reason, condition_holds, encode_key, scan_items, transact_item_key,
};

/// Table holding the serialized `TableSpec` of every wide-column table.
const META_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("__unibo_tables");

fn table_def(name: &str) -> TableDefinition<'_, &'static str, &'static [u8]> {
    TableDefinition::new(name)
}

fn unavailable(ctx: &str, e: impl std::fmt::Display) -> StorageError {
    StorageError::BackendUnavailable(format!("{ctx}: {e}"))
}

fn corrupted(ctx: &str, e: impl std::fmt::Display) -> StorageError {
    StorageError::CorruptedData(format!("{ctx}: {e}"))
}

fn join_error(e: tokio::task::JoinError) -> StorageError {
    StorageError::BackendUnavailable(format!("task join: {e}"))
}

type SpecCache = Arc<RwLock<HashMap<String, TableSpec>>>;

/// A persistent wide-column backend powered by redb.
///
/// Thread-safe: `Database` is `Send + Sync` and serialises write
/// transactions internally, which makes every `transact_write` atomic and
/// isolated from concurrent writers.
///
/// # Example
///
/// ```rust,no_run
/// use unibo_storage::redb_backend::RedbWideColumnBackend;
/// use unibo_storage::backend::{TableSpec, WideColumnBackend, WriteCondition};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let store = RedbWideColumnBackend::open("/tmp/unibo-test.redb").unwrap();
/// store.create_table(TableSpec::new("users", &["id"])).await.unwrap();
/// let item = json!({"id": "1", "email": "a@b"}).as_object().cloned().unwrap();
/// store.put_item("users", item, WriteCondition::KeyNotExists).await.unwrap();
/// # });
/// ```
pub struct RedbWideColumnBackend {
    db: Arc<Database>,
    specs: SpecCache,
    path: PathBuf,
}

impl RedbWideColumnBackend {
    /// Open or create a redb database at the given path.
    ///
    /// Creates parent directories if they don't exist and loads the layouts
    /// of previously created tables.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(StorageError::Io)?;
        }

        let db = Database::create(&path)
            .map_err(|e| unavailable(&format!("failed to open redb at {}", path.display()), e))?;

        let mut specs = HashMap::new();
        {
            let txn = db.begin_read().map_err(|e| unavailable("read txn", e))?;
            // The metadata table only exists once a table has been created.
            if let Ok(meta) = txn.open_table(META_TABLE) {
                for entry in meta.iter().map_err(|e| corrupted("meta scan", e))? {
                    let (_, v) = entry.map_err(|e| corrupted("meta entry", e))?;
                    let spec: TableSpec = serde_json::from_slice(v.value())?;
                    specs.insert(spec.name.clone(), spec);
                }
            }
        }

        debug!(path = %path.display(), tables = specs.len(), "opened redb wide-column backend");

        Ok(Self {
            db: Arc::new(db),
            specs: Arc::new(RwLock::new(specs)),
            path,
        })
    }

    /// Return the filesystem path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create a table (initializer helper). An existing layout is replaced,
    /// stored items are kept.
    pub async fn create_table(&self, spec: TableSpec) -> StorageResult<()> {
        let db = Arc::clone(&self.db);
        let specs = Arc::clone(&self.specs);

        tokio::task::spawn_blocking(move || -> StorageResult<()> {
            let bytes = serde_json::to_vec(&spec)?;
            let txn = db.begin_write().map_err(|e| unavailable("write txn", e))?;
            {
                let mut meta = txn
                    .open_table(META_TABLE)
                    .map_err(|e| unavailable("open table", e))?;
                meta.insert(spec.name.as_str(), bytes.as_slice())
                    .map_err(|e| corrupted("insert", e))?;
                txn.open_table(table_def(&spec.name))
                    .map_err(|e| unavailable("open table", e))?;
            }
            txn.commit().map_err(|e| corrupted("commit", e))?;
            debug!(table = %spec.name, "created wide-column table");
            specs.write().insert(spec.name.clone(), spec);
            Ok(())
        })
        .await
        .map_err(join_error)?
    }

    fn spec(&self, table: &str) -> StorageResult<TableSpec> {
        lookup_spec(&self.specs, table)
    }
}

fn lookup_spec(specs: &SpecCache, table: &str) -> StorageResult<TableSpec> {
    specs
        .read()
        .get(table)
        .cloned()
        .ok_or_else(|| StorageError::NotFound(format!("table '{table}'")))
}

fn read_in_txn(txn: &WriteTransaction, table: &str, key: &str) -> StorageResult<Option<Document>> {
    let t = txn
        .open_table(table_def(table))
        .map_err(|e| unavailable("open table", e))?;
    let found = t.get(key).map_err(|e| corrupted("get", e))?;
    match found {
        Some(v) => Ok(Some(serde_json::from_slice(v.value())?)),
        None => Ok(None),
    }
}

fn write_in_txn(txn: &WriteTransaction, table: &str, key: &str, item: &Document) -> StorageResult<()> {
    let bytes = serde_json::to_vec(item)?;
    let mut t = txn
        .open_table(table_def(table))
        .map_err(|e| unavailable("open table", e))?;
    t.insert(key, bytes.as_slice())
        .map_err(|e| corrupted("insert", e))?;
    Ok(())
}

fn remove_in_txn(txn: &WriteTransaction, table: &str, key: &str) -> StorageResult<bool> {
    let mut t = txn
        .open_table(table_def(table))
        .map_err(|e| unavailable("open table", e))?;
    let existed = t.remove(key).map_err(|e| corrupted("remove", e))?.is_some();
    Ok(existed)
}

impl std::fmt::Debug for RedbWideColumnBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbWideColumnBackend")
            .field("path", &self.path)
            .field("tables", &self.specs.read().len())
            .finish()
    }
}

#[async_trait]
impl WideColumnBackend for RedbWideColumnBackend {
    async fn get_item(&self, table: &str, key: &Document) -> StorageResult<Option<Document>> {
        let spec = self.spec(table)?;
        let k = encode_key(&spec, key)?;
        let db = Arc::clone(&self.db);

        tokio::task::spawn_blocking(move || -> StorageResult<Option<Document>> {
            let txn = db.begin_read().map_err(|e| unavailable("read txn", e))?;
            let t = match txn.open_table(table_def(&spec.name)) {
                Ok(t) => t,
                Err(_) => return Ok(None),
            };
            match t.get(k.as_str()).map_err(|e| corrupted("get", e))? {
                Some(v) => Ok(Some(serde_json::from_slice(v.value())?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(join_error)?
    }

    async fn put_item(&self, table: &str, item: Document, condition: WriteCondition) -> StorageResult<()> {
        let spec = self.spec(table)?;
        let k = encode_key(&spec, &item)?;
        let db = Arc::clone(&self.db);

        tokio::task::spawn_blocking(move || -> StorageResult<()> {
            let txn = db.begin_write().map_err(|e| unavailable("write txn", e))?;
            let exists = read_in_txn(&txn, &spec.name, &k)?.is_some();
            if !condition_holds(condition, exists) {
                txn.abort().map_err(|e| corrupted("abort", e))?;
                return Err(StorageError::ConditionalCheckFailed(format!("{}/{k}", spec.name)));
            }
            write_in_txn(&txn, &spec.name, &k, &item)?;
            txn.commit().map_err(|e| corrupted("commit", e))?;
            Ok(())
        })
        .await
        .map_err(join_error)?
    }

    async fn delete_item(&self, table: &str, key: &Document, condition: WriteCondition) -> StorageResult<bool> {
        let spec = self.spec(table)?;
        let k = encode_key(&spec, key)?;
        let db = Arc::clone(&self.db);

        tokio::task::spawn_blocking(move || -> StorageResult<bool> {
            let txn = db.begin_write().map_err(|e| unavailable("write txn", e))?;
            let exists = read_in_txn(&txn, &spec.name, &k)?.is_some();
            if !condition_holds(condition, exists) {
                txn.abort().map_err(|e| corrupted("abort", e))?;
                return Err(StorageError::ConditionalCheckFailed(format!("{}/{k}", spec.name)));
            }
            let existed = remove_in_txn(&txn, &spec.name, &k)?;
            txn.commit().map_err(|e| corrupted("commit", e))?;
            Ok(existed)
        })
        .await
        .map_err(join_error)?
    }

    async fn transact_write(&self, items: Vec<TransactItem>) -> StorageResult<()> {
        let db = Arc::clone(&self.db);
        let specs = Arc::clone(&self.specs);

        tokio::task::spawn_blocking(move || -> StorageResult<()> {
            let txn = db.begin_write().map_err(|e| unavailable("write txn", e))?;

            // Phase 1: evaluate every condition against the pre-transaction state.
            let mut reasons = Vec::with_capacity(items.len());
            let mut resolved = Vec::with_capacity(items.len());
            let mut seen = HashSet::new();
            for item in &items {
                let key = lookup_spec(&specs, item.table())
                    .and_then(|spec| transact_item_key(&spec, item).map(|k| (spec, k)));
                match key {
                    Err(e) => {
                        reasons.push(CancellationReason::ValidationError(e.to_string()));
                        resolved.push(None);
                    }
                    Ok((spec, k)) => {
                        let current = read_in_txn(&txn, &spec.name, &k)?;
                        let reason = if seen.insert((spec.name.clone(), k.clone())) {
                            check_reason(item.condition(), current.is_some())
                        } else {
                            CancellationReason::ValidationError(
                                "multiple operations on one item".to_string(),
                            )
                        };
                        reasons.push(reason);
                        resolved.push(Some((spec, k, current)));
                    }
                }
            }
            if reasons.iter().any(|r| *r != CancellationReason::None) {
                txn.abort().map_err(|e| corrupted("abort", e))?;
                debug!(?reasons, "transaction canceled");
                return Err(StorageError::TransactionCanceled { reasons });
            }

            // Phase 2: apply.
            for (item, slot) in items.into_iter().zip(resolved) {
                let Some((spec, k, current)) = slot else {
                    continue;
                };
                match item {
                    TransactItem::Put { item, .. } => write_in_txn(&txn, &spec.name, &k, &item)?,
                    TransactItem::Update { key, set, remove, .. } => {
                        let updated = apply_update(&spec, current, &key, &set, &remove);
                        write_in_txn(&txn, &spec.name, &k, &updated)?;
                    }
                    TransactItem::Delete { .. } => {
                        remove_in_txn(&txn, &spec.name, &k)?;
                    }
                }
            }
            txn.commit().map_err(|e| corrupted("commit", e))?;
            Ok(())
        })
        .await
        .map_err(join_error)?
    }

    async fn scan(&self, request: &ScanRequest) -> StorageResult<Vec<Document>> {
        let spec = self.spec(&request.table)?;
        let request = request.clone();
        let db = Arc::clone(&self.db);

        tokio::task::spawn_blocking(move || -> StorageResult<Vec<Document>> {
            let txn = db.begin_read().map_err(|e| unavailable("read txn", e))?;
            let t = match txn.open_table(table_def(&spec.name)) {
                Ok(t) => t,
                Err(_) => return Ok(Vec::new()),
            };
            let mut items = Vec::new();
            for entry in t.iter().map_err(|e| corrupted("range scan", e))? {
                let (_, v) = entry.map_err(|e| corrupted("scan entry", e))?;
                items.push(serde_json::from_slice::<Document>(v.value())?);
            }
            scan_items(&spec, items, &request)
        })
        .await
        .map_err(join_error)?
    }

    fn name(&self) -> &str {
        "redb-wide-column"
    }
}
