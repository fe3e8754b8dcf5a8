// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory reference backends.
//
// Each backend keeps its data in ordered maps wrapped in a tokio `RwLock`,
// shared through an `Arc` so clones see the same state. They honour the
// same contracts as real drivers (unique indexes, per-partition scoping,
// atomic conditional transactions) and are intended for testing,
// development, and small ephemeral datasets.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::backend::{
    DocumentBackend, Document, FindQuery, PartitionedDocumentBackend, ReplaceOutcome,
    ScanRequest, TableSpec, TransactItem, WideColumnBackend, WriteCondition, DOCUMENT_ID_FIELD,
};
use crate::error::{CancellationReason, StorageError, StorageResult};
use crate::query::{lookup, matches, matches_opt, sort_documents};
use crate::wide_column::{
    apply_update, check_reason, condition_holds, encode_key, scan_items, transact_item_key,
};

// ---------------------------------------------------------------------------
// Shared collection state
// ---------------------------------------------------------------------------

/// Documents keyed by id plus the unique indexes guarding them.
#[derive(Debug, Clone, Default)]
struct Collection {
    docs: BTreeMap<String, Document>,
    unique_indexes: Vec<Vec<String>>,
}

fn id_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn doc_id(doc: &Document, id_field: &str) -> StorageResult<String> {
    doc.get(id_field)
        .filter(|v| !v.is_null())
        .map(id_string)
        .ok_or_else(|| StorageError::InvalidRequest(format!("document has no '{id_field}' field")))
}

/// Apply sort, skip and limit of `query` to already-filtered documents.
fn page(mut docs: Vec<Document>, query: &FindQuery) -> Vec<Document> {
    sort_documents(&mut docs, &query.sort);
    let iter = docs.into_iter().skip(query.skip);
    if query.limit > 0 {
        iter.take(query.limit).collect()
    } else {
        iter.collect()
    }
}

impl Collection {
    fn with_indexes(unique_indexes: Vec<Vec<String>>) -> Self {
        Self {
            docs: BTreeMap::new(),
            unique_indexes,
        }
    }

    /// Name of the first unique index `doc` would violate, ignoring `skip_id`.
    fn unique_conflict(&self, doc: &Document, skip_id: &str) -> Option<String> {
        for fields in &self.unique_indexes {
            let wanted: Vec<Option<&Value>> = fields.iter().map(|f| lookup(doc, f)).collect();
            let clash = self.docs.iter().any(|(id, other)| {
                id != skip_id
                    && fields
                        .iter()
                        .map(|f| lookup(other, f))
                        .eq(wanted.iter().copied())
            });
            if clash {
                return Some(fields.join(","));
            }
        }
        None
    }

    fn check_unique(&self, doc: &Document, id: &str) -> StorageResult<()> {
        match self.unique_conflict(doc, id) {
            Some(index) => Err(StorageError::DuplicateKey(format!("unique index [{index}]"))),
            None => Ok(()),
        }
    }

    fn insert(&mut self, id_field: &str, doc: Document) -> StorageResult<()> {
        let id = doc_id(&doc, id_field)?;
        if self.docs.contains_key(&id) {
            return Err(StorageError::DuplicateKey(format!("{id_field}={id}")));
        }
        self.check_unique(&doc, &id)?;
        self.docs.insert(id, doc);
        Ok(())
    }

    fn replace(&mut self, id: &str, doc: Document) -> StorageResult<bool> {
        if !self.docs.contains_key(id) {
            return Ok(false);
        }
        self.check_unique(&doc, id)?;
        self.docs.insert(id.to_string(), doc);
        Ok(true)
    }

    fn upsert(&mut self, id_field: &str, doc: Document) -> StorageResult<()> {
        let id = doc_id(&doc, id_field)?;
        self.check_unique(&doc, &id)?;
        self.docs.insert(id, doc);
        Ok(())
    }

    fn first_match(&self, filter: &Value) -> StorageResult<Option<String>> {
        for (id, doc) in &self.docs {
            if matches(doc, filter)? {
                return Ok(Some(id.clone()));
            }
        }
        Ok(None)
    }

    fn matching(&self, filter: Option<&Value>) -> StorageResult<Vec<Document>> {
        let mut out = Vec::new();
        for doc in self.docs.values() {
            if matches_opt(doc, filter)? {
                out.push(doc.clone());
            }
        }
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Document collections
// ---------------------------------------------------------------------------

/// An in-memory document store with `_id` keys and unique indexes.
///
/// Collections are created on first write, like most document databases.
///
/// # Example
///
/// ```rust
/// use unibo_storage::memory::InMemoryDocumentBackend;
/// use unibo_storage::backend::DocumentBackend;
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let store = InMemoryDocumentBackend::new();
/// store.create_unique_index("users", &["email"]).await;
/// let doc = json!({"_id": "1", "email": "a@b"}).as_object().cloned().unwrap();
/// store.insert_one("users", doc).await.unwrap();
/// assert_eq!(store.count("users").await, 1);
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentBackend {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl InMemoryDocumentBackend {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unique index over `fields` (initializer helper).
    pub async fn create_unique_index(&self, collection: &str, fields: &[&str]) {
        let mut map = self.collections.write().await;
        let coll = map.entry(collection.to_string()).or_default();
        coll.unique_indexes
            .push(fields.iter().map(|f| f.to_string()).collect());
        debug!(collection, ?fields, "created unique index");
    }

    /// Number of documents in `collection`.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, |c| c.docs.len())
    }
}

#[async_trait]
impl DocumentBackend for InMemoryDocumentBackend {
    async fn insert_one(&self, collection: &str, doc: Document) -> StorageResult<()> {
        let mut map = self.collections.write().await;
        map.entry(collection.to_string())
            .or_default()
            .insert(DOCUMENT_ID_FIELD, doc)
    }

    async fn find_one(&self, collection: &str, filter: &Value) -> StorageResult<Option<Document>> {
        let map = self.collections.read().await;
        let Some(coll) = map.get(collection) else {
            return Ok(None);
        };
        Ok(coll
            .first_match(filter)?
            .and_then(|id| coll.docs.get(&id).cloned()))
    }

    async fn find(&self, collection: &str, query: &FindQuery) -> StorageResult<Vec<Document>> {
        let map = self.collections.read().await;
        let Some(coll) = map.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(page(coll.matching(query.filter.as_ref())?, query))
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: &Value,
        mut doc: Document,
        upsert: bool,
    ) -> StorageResult<ReplaceOutcome> {
        let mut map = self.collections.write().await;
        let coll = map.entry(collection.to_string()).or_default();
        match coll.first_match(filter)? {
            Some(id) => {
                match doc.get(DOCUMENT_ID_FIELD).map(id_string) {
                    Some(new_id) if new_id != id => {
                        return Err(StorageError::InvalidRequest(format!(
                            "replacement may not change {DOCUMENT_ID_FIELD} ({id} -> {new_id})"
                        )))
                    }
                    Some(_) => {}
                    None => {
                        doc.insert(DOCUMENT_ID_FIELD.to_string(), Value::String(id.clone()));
                    }
                }
                coll.replace(&id, doc)?;
                Ok(ReplaceOutcome {
                    matched: 1,
                    upserted: false,
                })
            }
            None if upsert => {
                coll.insert(DOCUMENT_ID_FIELD, doc)?;
                Ok(ReplaceOutcome {
                    matched: 0,
                    upserted: true,
                })
            }
            None => Ok(ReplaceOutcome::default()),
        }
    }

    async fn delete_one(&self, collection: &str, filter: &Value) -> StorageResult<u64> {
        let mut map = self.collections.write().await;
        let Some(coll) = map.get_mut(collection) else {
            return Ok(0);
        };
        match coll.first_match(filter)? {
            Some(id) => {
                coll.docs.remove(&id);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn name(&self) -> &str {
        "in-memory-document"
    }
}

// ---------------------------------------------------------------------------
// Partitioned containers
// ---------------------------------------------------------------------------

/// Id field of partitioned items.
pub const PARTITIONED_ID_FIELD: &str = "id";

#[derive(Debug, Clone, Default)]
struct Container {
    unique_keys: Vec<Vec<String>>,
    partitions: BTreeMap<String, Collection>,
}

impl Container {
    fn partition_mut(&mut self, partition: &str) -> &mut Collection {
        let unique_keys = &self.unique_keys;
        self.partitions
            .entry(partition.to_string())
            .or_insert_with(|| Collection::with_indexes(unique_keys.clone()))
    }
}

/// An in-memory partitioned document store.
///
/// Containers must be created up front with [`Self::create_container`];
/// ids and unique keys are scoped to a partition.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPartitionedBackend {
    containers: Arc<RwLock<HashMap<String, Container>>>,
}

impl InMemoryPartitionedBackend {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a container with the given per-partition unique keys.
    pub async fn create_container(&self, container: &str, unique_keys: &[&[&str]]) {
        let mut map = self.containers.write().await;
        map.entry(container.to_string()).or_insert_with(|| Container {
            unique_keys: unique_keys
                .iter()
                .map(|k| k.iter().map(|f| f.to_string()).collect())
                .collect(),
            partitions: BTreeMap::new(),
        });
        debug!(container, "created container");
    }

    /// Number of items in one partition.
    pub async fn count(&self, container: &str, partition: &str) -> usize {
        self.containers
            .read()
            .await
            .get(container)
            .and_then(|c| c.partitions.get(partition))
            .map_or(0, |p| p.docs.len())
    }
}

fn missing_container(container: &str) -> StorageError {
    StorageError::NotFound(format!("container '{container}'"))
}

#[async_trait]
impl PartitionedDocumentBackend for InMemoryPartitionedBackend {
    async fn create_item(&self, container: &str, partition: &str, doc: Document) -> StorageResult<()> {
        let mut map = self.containers.write().await;
        let cont = map.get_mut(container).ok_or_else(|| missing_container(container))?;
        cont.partition_mut(partition).insert(PARTITIONED_ID_FIELD, doc)
    }

    async fn read_item(&self, container: &str, partition: &str, id: &str) -> StorageResult<Option<Document>> {
        let map = self.containers.read().await;
        let cont = map.get(container).ok_or_else(|| missing_container(container))?;
        Ok(cont
            .partitions
            .get(partition)
            .and_then(|p| p.docs.get(id))
            .cloned())
    }

    async fn replace_item(
        &self,
        container: &str,
        partition: &str,
        id: &str,
        doc: Document,
    ) -> StorageResult<bool> {
        let mut map = self.containers.write().await;
        let cont = map.get_mut(container).ok_or_else(|| missing_container(container))?;
        cont.partition_mut(partition).replace(id, doc)
    }

    async fn upsert_item(&self, container: &str, partition: &str, doc: Document) -> StorageResult<()> {
        let mut map = self.containers.write().await;
        let cont = map.get_mut(container).ok_or_else(|| missing_container(container))?;
        cont.partition_mut(partition).upsert(PARTITIONED_ID_FIELD, doc)
    }

    async fn delete_item(&self, container: &str, partition: &str, id: &str) -> StorageResult<bool> {
        let mut map = self.containers.write().await;
        let cont = map.get_mut(container).ok_or_else(|| missing_container(container))?;
        Ok(cont
            .partitions
            .get_mut(partition)
            .map_or(false, |p| p.docs.remove(id).is_some()))
    }

    async fn query_items(
        &self,
        container: &str,
        partition: Option<&str>,
        query: &FindQuery,
    ) -> StorageResult<Vec<Document>> {
        let map = self.containers.read().await;
        let cont = map.get(container).ok_or_else(|| missing_container(container))?;
        let mut docs = Vec::new();
        for (name, coll) in &cont.partitions {
            if partition.map_or(true, |p| p == name) {
                docs.extend(coll.matching(query.filter.as_ref())?);
            }
        }
        Ok(page(docs, query))
    }

    fn name(&self) -> &str {
        "in-memory-partitioned"
    }
}

// ---------------------------------------------------------------------------
// Wide-column tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct WideTable {
    spec: TableSpec,
    items: BTreeMap<String, Document>,
}

/// An in-memory wide-column store with atomic conditional transactions.
///
/// All tables live behind one lock, so a transaction sees and applies a
/// consistent snapshot across tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWideColumnBackend {
    tables: Arc<RwLock<HashMap<String, WideTable>>>,
}

impl InMemoryWideColumnBackend {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table (initializer helper). Existing tables are kept.
    pub async fn create_table(&self, spec: TableSpec) {
        let mut map = self.tables.write().await;
        debug!(table = %spec.name, "created wide-column table");
        map.entry(spec.name.clone()).or_insert_with(|| WideTable {
            spec,
            items: BTreeMap::new(),
        });
    }

    /// Number of items in `table`.
    pub async fn item_count(&self, table: &str) -> usize {
        self.tables
            .read()
            .await
            .get(table)
            .map_or(0, |t| t.items.len())
    }
}

fn missing_table(table: &str) -> StorageError {
    StorageError::NotFound(format!("table '{table}'"))
}

#[async_trait]
impl WideColumnBackend for InMemoryWideColumnBackend {
    async fn get_item(&self, table: &str, key: &Document) -> StorageResult<Option<Document>> {
        let map = self.tables.read().await;
        let t = map.get(table).ok_or_else(|| missing_table(table))?;
        let k = encode_key(&t.spec, key)?;
        Ok(t.items.get(&k).cloned())
    }

    async fn put_item(&self, table: &str, item: Document, condition: WriteCondition) -> StorageResult<()> {
        let mut map = self.tables.write().await;
        let t = map.get_mut(table).ok_or_else(|| missing_table(table))?;
        let k = encode_key(&t.spec, &item)?;
        if !condition_holds(condition, t.items.contains_key(&k)) {
            return Err(StorageError::ConditionalCheckFailed(format!("{table}/{k}")));
        }
        t.items.insert(k, item);
        Ok(())
    }

    async fn delete_item(&self, table: &str, key: &Document, condition: WriteCondition) -> StorageResult<bool> {
        let mut map = self.tables.write().await;
        let t = map.get_mut(table).ok_or_else(|| missing_table(table))?;
        let k = encode_key(&t.spec, key)?;
        if !condition_holds(condition, t.items.contains_key(&k)) {
            return Err(StorageError::ConditionalCheckFailed(format!("{table}/{k}")));
        }
        Ok(t.items.remove(&k).is_some())
    }

    async fn transact_write(&self, items: Vec<TransactItem>) -> StorageResult<()> {
        let mut map = self.tables.write().await;

        // Validate every item against the current state before touching anything.
        let mut reasons = Vec::with_capacity(items.len());
        let mut keys = Vec::with_capacity(items.len());
        let mut seen = HashSet::new();
        for item in &items {
            let resolved = map
                .get(item.table())
                .ok_or_else(|| format!("unknown table '{}'", item.table()))
                .and_then(|t| {
                    transact_item_key(&t.spec, item)
                        .map(|k| (t.items.contains_key(&k), k))
                        .map_err(|e| e.to_string())
                });
            let reason = match resolved {
                Err(msg) => {
                    keys.push(String::new());
                    CancellationReason::ValidationError(msg)
                }
                Ok((exists, k)) => {
                    let reason = if seen.insert((item.table().to_string(), k.clone())) {
                        check_reason(item.condition(), exists)
                    } else {
                        CancellationReason::ValidationError(
                            "multiple operations on one item".to_string(),
                        )
                    };
                    keys.push(k);
                    reason
                }
            };
            reasons.push(reason);
        }
        if reasons.iter().any(|r| *r != CancellationReason::None) {
            debug!(?reasons, "transaction canceled");
            return Err(StorageError::TransactionCanceled { reasons });
        }

        for (item, k) in items.into_iter().zip(keys) {
            let t = map
                .get_mut(item.table())
                .ok_or_else(|| missing_table(item.table()))?;
            match item {
                TransactItem::Put { item, .. } => {
                    t.items.insert(k, item);
                }
                TransactItem::Update { key, set, remove, .. } => {
                    let current = t.items.remove(&k);
                    let updated = apply_update(&t.spec, current, &key, &set, &remove);
                    t.items.insert(k, updated);
                }
                TransactItem::Delete { .. } => {
                    t.items.remove(&k);
                }
            }
        }
        Ok(())
    }

    async fn scan(&self, request: &ScanRequest) -> StorageResult<Vec<Document>> {
        let map = self.tables.read().await;
        let t = map
            .get(&request.table)
            .ok_or_else(|| missing_table(&request.table))?;
        scan_items(&t.spec, t.items.values().cloned(), request)
    }

    fn name(&self) -> &str {
        "in-memory-wide-column"
    }
}
