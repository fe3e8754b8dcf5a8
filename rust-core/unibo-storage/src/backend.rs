// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Narrow backend interfaces consumed by the DAOs.
//
// Each trait is the smallest surface a DAO needs from its backend family:
// a document collection, a partitioned document container, and a
// wide-column store with conditional transactional writes. The relational
// interface lives in `crate::sql`. Backends are expected to be thread-safe
// (`Send + Sync`) and fully asynchronous; clients are owned by
// initialization code and shared with DAOs by reference.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StorageResult;

/// A stored document or wide-column item: a flat or nested JSON object.
pub type Document = Map<String, Value>;

/// Name of the primary-key field of document collections.
pub const DOCUMENT_ID_FIELD: &str = "_id";

/// Query parameters for multi-document reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
    /// Native predicate (see [`crate::query`]); `None` matches everything.
    pub filter: Option<Value>,
    /// Sort keys as `(field, descending)`.
    pub sort: Vec<(String, bool)>,
    /// Number of matching documents to skip.
    pub skip: usize,
    /// Maximum number of documents to return; `0` means no limit.
    pub limit: usize,
}

/// Result of a replace operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceOutcome {
    /// Number of existing documents matched by the filter.
    pub matched: u64,
    /// True if no document matched and one was inserted.
    pub upserted: bool,
}

/// A document collection keyed by `_id`.
///
/// Uniqueness beyond `_id` is enforced by unique indexes set up by the
/// initializer; violations surface as [`crate::StorageError::DuplicateKey`].
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Insert a new document. Fails with `DuplicateKey` on any unique violation.
    async fn insert_one(&self, collection: &str, doc: Document) -> StorageResult<()>;

    /// Return the first document matching `filter`.
    async fn find_one(&self, collection: &str, filter: &Value) -> StorageResult<Option<Document>>;

    /// Return matching documents, sorted and paged.
    async fn find(&self, collection: &str, query: &FindQuery) -> StorageResult<Vec<Document>>;

    /// Replace the first document matching `filter`, optionally inserting.
    async fn replace_one(
        &self,
        collection: &str,
        filter: &Value,
        doc: Document,
        upsert: bool,
    ) -> StorageResult<ReplaceOutcome>;

    /// Delete the first document matching `filter`; returns the count removed.
    async fn delete_one(&self, collection: &str, filter: &Value) -> StorageResult<u64>;

    /// A human-readable name for this backend, used in logging.
    fn name(&self) -> &str;
}

/// A document container split into logical partitions.
///
/// Every point operation addresses exactly one partition. Ids and unique
/// keys are scoped to their partition.
#[async_trait]
pub trait PartitionedDocumentBackend: Send + Sync {
    /// Insert a new item. Fails with `DuplicateKey` if the id or a unique key
    /// is taken within the partition.
    async fn create_item(&self, container: &str, partition: &str, doc: Document) -> StorageResult<()>;

    /// Point-read an item by id.
    async fn read_item(&self, container: &str, partition: &str, id: &str) -> StorageResult<Option<Document>>;

    /// Replace an existing item; returns false if it does not exist.
    async fn replace_item(
        &self,
        container: &str,
        partition: &str,
        id: &str,
        doc: Document,
    ) -> StorageResult<bool>;

    /// Insert or replace an item.
    async fn upsert_item(&self, container: &str, partition: &str, doc: Document) -> StorageResult<()>;

    /// Delete an item; returns false if it does not exist.
    async fn delete_item(&self, container: &str, partition: &str, id: &str) -> StorageResult<bool>;

    /// Query one partition, or all partitions when `partition` is `None`.
    async fn query_items(
        &self,
        container: &str,
        partition: Option<&str>,
        query: &FindQuery,
    ) -> StorageResult<Vec<Document>>;

    /// A human-readable name for this backend, used in logging.
    fn name(&self) -> &str;
}

/// A sorted secondary index of a wide-column table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Index name, used by scans.
    pub name: String,
    /// Attribute the index is sorted by. Items without it are not indexed.
    pub sort_attr: String,
}

/// Layout of a wide-column table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    /// Table name.
    pub name: String,
    /// Ordered primary-key attribute names (partition key first).
    pub key_attrs: Vec<String>,
    /// Sorted secondary indexes.
    #[serde(default)]
    pub indexes: Vec<IndexSpec>,
}

impl TableSpec {
    /// A table keyed by the given attributes with no secondary index.
    pub fn new(name: impl Into<String>, key_attrs: &[&str]) -> Self {
        Self {
            name: name.into(),
            key_attrs: key_attrs.iter().map(|s| s.to_string()).collect(),
            indexes: Vec::new(),
        }
    }

    /// Add a sorted secondary index.
    pub fn with_index(mut self, name: impl Into<String>, sort_attr: impl Into<String>) -> Self {
        self.indexes.push(IndexSpec {
            name: name.into(),
            sort_attr: sort_attr.into(),
        });
        self
    }
}

/// Precondition attached to a wide-column write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteCondition {
    /// Unconditional.
    #[default]
    None,
    /// The primary key must not exist yet.
    KeyNotExists,
    /// The primary key must already exist.
    KeyExists,
}

/// One element of an atomic wide-column write.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactItem {
    /// Store a whole item.
    Put {
        table: String,
        item: Document,
        condition: WriteCondition,
    },
    /// Set and remove non-key attributes of the item at `key`.
    Update {
        table: String,
        key: Document,
        set: Document,
        remove: Vec<String>,
        condition: WriteCondition,
    },
    /// Remove the item at `key`.
    Delete {
        table: String,
        key: Document,
        condition: WriteCondition,
    },
}

impl TransactItem {
    /// Table addressed by this item.
    pub fn table(&self) -> &str {
        match self {
            TransactItem::Put { table, .. }
            | TransactItem::Update { table, .. }
            | TransactItem::Delete { table, .. } => table,
        }
    }

    /// Condition attached to this item.
    pub fn condition(&self) -> WriteCondition {
        match self {
            TransactItem::Put { condition, .. }
            | TransactItem::Update { condition, .. }
            | TransactItem::Delete { condition, .. } => *condition,
        }
    }
}

/// Parameters of a wide-column scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanRequest {
    /// Table to scan.
    pub table: String,
    /// Secondary index to read in sort order; `None` scans the base table
    /// in unspecified order.
    pub index: Option<String>,
    /// Reverse the index order.
    pub descending: bool,
    /// Native predicate applied server-side.
    pub filter: Option<Value>,
}

/// A key-value / wide-column store without multi-column unique constraints.
#[async_trait]
pub trait WideColumnBackend: Send + Sync {
    /// Point-read by full primary key.
    async fn get_item(&self, table: &str, key: &Document) -> StorageResult<Option<Document>>;

    /// Conditional single-item put. A failed condition is
    /// `StorageError::ConditionalCheckFailed`.
    async fn put_item(&self, table: &str, item: Document, condition: WriteCondition) -> StorageResult<()>;

    /// Conditional single-item delete; returns whether an item was removed.
    async fn delete_item(&self, table: &str, key: &Document, condition: WriteCondition) -> StorageResult<bool>;

    /// Apply all items atomically. Any failed condition cancels the whole
    /// write with `StorageError::TransactionCanceled`.
    async fn transact_write(&self, items: Vec<TransactItem>) -> StorageResult<()>;

    /// Scan a table or one of its secondary indexes.
    async fn scan(&self, request: &ScanRequest) -> StorageResult<Vec<Document>>;

    /// A human-readable name for this backend, used in logging.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_spec_builder() {
        let spec = TableSpec::new("users", &["pk", "id"]).with_index("idx_email", "email");
        assert_eq!(spec.key_attrs, vec!["pk".to_string(), "id".to_string()]);
        assert_eq!(spec.indexes[0].sort_attr, "email");
    }

    #[test]
    fn test_table_spec_from_json() {
        let spec: TableSpec = serde_json::from_value(json!({
            "name": "t",
            "key_attrs": ["id"]
        }))
        .unwrap();
        assert!(spec.indexes.is_empty());
    }

    #[test]
    fn test_transact_item_accessors() {
        let item = TransactItem::Delete {
            table: "t_uidx".to_string(),
            key: Document::new(),
            condition: WriteCondition::KeyExists,
        };
        assert_eq!(item.table(), "t_uidx");
        assert_eq!(item.condition(), WriteCondition::KeyExists);
    }
}
