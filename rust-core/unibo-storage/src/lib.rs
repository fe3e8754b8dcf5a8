// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Backend interfaces for the universal BO persistence layer.
//
// Each backend family is consumed by the DAOs through the smallest interface
// it needs: execute/fetch/transaction for relational databases, find/insert/
// replace/delete for document collections, per-partition point operations
// for partitioned containers, and put/update/delete-by-key with atomic
// conditional transactions for wide-column stores. Clients are created by
// initialization code and shared with DAOs by reference.
//
// # Modules
//
// - [`backend`] -- Document, partitioned-document and wide-column traits.
// - [`sql`] -- The `SqlConnector` trait, statements, dialects and table DDL.
// - [`error`] -- The `StorageError` enum covering all backend failure modes.
// - [`query`] -- The JSON predicate language of the bundled backends.
// - [`memory`] -- In-memory reference backends for every non-relational family.
// - [`wide_column`] -- Key encoding and item helpers shared by wide-column backends.
//
// # Example
//
// ```rust
// use unibo_storage::backend::{TableSpec, WideColumnBackend, WriteCondition};
// use unibo_storage::memory::InMemoryWideColumnBackend;
//
// # tokio_test::block_on(async {
// let store = InMemoryWideColumnBackend::new();
// store.create_table(TableSpec::new("users", &["id"])).await;
//
// let item = serde_json::json!({"id": "1", "email": "a@b"});
// let item = item.as_object().cloned().unwrap();
// store.put_item("users", item, WriteCondition::KeyNotExists).await.unwrap();
// assert_eq!(store.item_count("users").await, 1);
// # });
// ```

pub mod backend;
pub mod error;
pub mod memory;
pub mod query;
pub mod sql;
pub mod wide_column;

// Optional drivers -- feature-gated to keep the default build lean.
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "redb-backend")]
pub mod redb_backend;
#[cfg(feature = "sqlite")]
pub mod sqlite;

// Re-export the most commonly used types at the crate root for convenience.
pub use backend::{
    Document, DocumentBackend, FindQuery, IndexSpec, PartitionedDocumentBackend, ReplaceOutcome,
    ScanRequest, TableSpec, TransactItem, WideColumnBackend, WriteCondition, DOCUMENT_ID_FIELD,
};
pub use error::{CancellationReason, StorageError, StorageResult};
pub use memory::{InMemoryDocumentBackend, InMemoryPartitionedBackend, InMemoryWideColumnBackend};
pub use sql::{
    init_sql_table, SqlColumnType, SqlConnector, SqlFlavor, SqlParam, SqlRow, SqlTableSpec,
    SqlTransaction, Statement,
};

#[cfg(feature = "postgres")]
pub use postgres::PostgresConnector;
#[cfg(feature = "redb-backend")]
pub use redb_backend::RedbWideColumnBackend;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteConnector;
