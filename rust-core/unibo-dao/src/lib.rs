// SPDX-License-Identifier: PMPL-1.0-or-later
//! UniBO DAO
//!
//! Storage-agnostic data access for universal business objects. Every DAO
//! implements [`UniversalDao`]; applications choose a backend when they build
//! the DAO and keep it as `Arc<dyn UniversalDao>`.
//!
//! Bundled implementations:
//! - [`SqlDao`] over a [`unibo_storage::SqlConnector`] (SQLite, PostgreSQL)
//! - [`DocumentDao`] over a [`unibo_storage::DocumentBackend`]
//! - [`PartitionedDocumentDao`] over a [`unibo_storage::PartitionedDocumentBackend`]
//! - [`WideColumnDao`] over a [`unibo_storage::WideColumnBackend`], emulating
//!   multi-field unique constraints with a uidx table
//!
//! ```rust
//! use std::sync::Arc;
//! use unibo_core::UniversalBo;
//! use unibo_dao::{UniversalDao, WideColumnDao, WideColumnDaoConfig};
//! use unibo_storage::InMemoryWideColumnBackend;
//!
//! # tokio_test::block_on(async {
//! let config = WideColumnDaoConfig::new("users").with_unique_group(&["email"]);
//! let store = InMemoryWideColumnBackend::new();
//! store.create_table(config.main_table_spec()).await;
//! store.create_table(config.uidx_table_spec()).await;
//!
//! let dao = WideColumnDao::new(Arc::new(store), config).unwrap();
//! let bo = UniversalBo::new("1", 1);
//! bo.set_extra_attr("email", "a@b");
//! assert!(dao.create(&bo).await.unwrap());
//!
//! let other = UniversalBo::new("2", 1);
//! other.set_extra_attr("email", "a@b");
//! assert!(dao.create(&other).await.unwrap_err().is_duplicated_entry());
//! # });
//! ```

pub mod config;
pub mod dao;
pub mod document;
pub mod error;
pub mod filter;
pub mod mapper;
pub mod partitioned;
pub mod sql;
pub mod uidx;
pub mod wide_column;

pub use config::{
    DocumentDaoConfig, PartitionKeySource, PartitionedDocDaoConfig, PkPrefix, SqlDaoConfig,
    WideColumnDaoConfig,
};
pub use dao::UniversalDao;
pub use document::DocumentDao;
pub use error::{DaoError, DaoResult};
pub use filter::{Filter, FilterOp, Sort, SortField};
pub use mapper::{ColumnKind, DataEncoding, PromotedColumn, Row, RowMapper, UboRowMapper};
pub use partitioned::PartitionedDocumentDao;
pub use sql::SqlDao;
pub use uidx::{Cancellation, Fingerprint, HashAlgorithm};
pub use wide_column::WideColumnDao;
