// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! DAO configuration.
//!
//! All configs deserialize from JSON, so callers can keep them next to their
//! connection settings. Defaults:
//! - SQL: no promoted columns, plain (non-transactional) save
//! - Wide-column: uidx table `<table>_uidx`, fingerprints with SHA-1 + MD5

use serde::{Deserialize, Serialize};
use unibo_storage::TableSpec;

use crate::error::{DaoError, DaoResult};
use crate::mapper::PromotedColumn;
use crate::uidx::HashAlgorithm;

/// Configuration of [`crate::SqlDao`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SqlDaoConfig {
    /// Table name.
    pub table: String,
    /// Extras stored in their own columns (for filtering and sorting).
    #[serde(default)]
    pub promoted_columns: Vec<PromotedColumn>,
    /// Run `save` as one transaction (fetch, update, insert).
    #[serde(default)]
    pub tx_mode_on_write: bool,
}

impl SqlDaoConfig {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn with_promoted(mut self, column: PromotedColumn) -> Self {
        self.promoted_columns.push(column);
        self
    }

    pub fn with_tx_mode(mut self, on: bool) -> Self {
        self.tx_mode_on_write = on;
        self
    }
}

/// Configuration of [`crate::DocumentDao`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDaoConfig {
    /// Collection name.
    pub collection: String,
}

impl DocumentDaoConfig {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
        }
    }
}

/// Where the partition-key value of a BO comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionKeySource {
    /// One partition for every BO of this DAO.
    Fixed(String),
    /// The value of an extras key of each BO.
    Extra(String),
}

impl Default for PartitionKeySource {
    fn default() -> Self {
        PartitionKeySource::Fixed(String::new())
    }
}

/// Configuration of [`crate::PartitionedDocumentDao`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionedDocDaoConfig {
    /// Container name.
    pub container: String,
    pub partition_key: PartitionKeySource,
    /// Allow reads that span partitions. Required for `get` and `get_n`
    /// when the partition key comes from an extras attribute.
    #[serde(default)]
    pub cross_partition: bool,
}

impl PartitionedDocDaoConfig {
    pub fn new(container: impl Into<String>, partition_key: PartitionKeySource) -> Self {
        Self {
            container: container.into(),
            partition_key,
            cross_partition: false,
        }
    }

    pub fn with_cross_partition(mut self, on: bool) -> Self {
        self.cross_partition = on;
        self
    }

    /// Check the configuration before building a DAO.
    pub fn validate(&self) -> DaoResult<()> {
        if self.container.trim().is_empty() {
            return Err(DaoError::Configuration("container name is empty".to_string()));
        }
        match &self.partition_key {
            PartitionKeySource::Fixed(value) if value.trim().is_empty() => Err(
                DaoError::Configuration("fixed partition key value is empty".to_string()),
            ),
            PartitionKeySource::Extra(key) if key.trim().is_empty() => Err(
                DaoError::Configuration("partition key attribute name is empty".to_string()),
            ),
            _ => Ok(()),
        }
    }
}

/// Fixed partition-key prefix of a wide-column main table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkPrefix {
    /// Key attribute name (first component of the primary key).
    pub attr: String,
    /// Value shared by every row of this DAO.
    pub value: String,
}

impl PkPrefix {
    pub fn new(attr: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attr: attr.into(),
            value: value.into(),
        }
    }
}

/// Configuration of [`crate::WideColumnDao`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WideColumnDaoConfig {
    /// Main table name.
    pub table: String,
    /// Optional partition prefix: the main table is keyed by `(attr, id)`.
    #[serde(default)]
    pub pk_prefix: Option<PkPrefix>,
    /// Unique groups: each is an ordered list of extras keys (or the prefix
    /// attribute) whose combined values must be unique.
    #[serde(default)]
    pub uidx_attrs: Vec<Vec<String>>,
    #[serde(default = "default_hash1")]
    pub hash1: HashAlgorithm,
    #[serde(default = "default_hash2")]
    pub hash2: HashAlgorithm,
    /// Uniqueness-index table; `<table>_uidx` when unset.
    #[serde(default)]
    pub uidx_table: Option<String>,
}

fn default_hash1() -> HashAlgorithm {
    HashAlgorithm::Sha1
}

fn default_hash2() -> HashAlgorithm {
    HashAlgorithm::Md5
}

impl Default for WideColumnDaoConfig {
    fn default() -> Self {
        Self {
            table: String::new(),
            pk_prefix: None,
            uidx_attrs: Vec::new(),
            hash1: default_hash1(),
            hash2: default_hash2(),
            uidx_table: None,
        }
    }
}

impl WideColumnDaoConfig {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn with_pk_prefix(mut self, attr: impl Into<String>, value: impl Into<String>) -> Self {
        self.pk_prefix = Some(PkPrefix::new(attr, value));
        self
    }

    /// Add a unique group.
    pub fn with_unique_group(mut self, fields: &[&str]) -> Self {
        self.uidx_attrs
            .push(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn with_hashes(mut self, hash1: HashAlgorithm, hash2: HashAlgorithm) -> Self {
        self.hash1 = hash1;
        self.hash2 = hash2;
        self
    }

    /// Name of the uniqueness-index table.
    pub fn uidx_table_name(&self) -> String {
        match &self.uidx_table {
            Some(name) => name.clone(),
            None => format!("{}_uidx", self.table),
        }
    }

    /// Key attributes of the main table: `(prefix attr, id)` or `(id)`.
    pub fn main_key_attrs(&self) -> Vec<String> {
        let mut attrs = Vec::with_capacity(2);
        if let Some(prefix) = &self.pk_prefix {
            attrs.push(prefix.attr.clone());
        }
        attrs.push("id".to_string());
        attrs
    }

    /// Layout of the main table, for initializers.
    pub fn main_table_spec(&self) -> TableSpec {
        TableSpec {
            name: self.table.clone(),
            key_attrs: self.main_key_attrs(),
            indexes: Vec::new(),
        }
    }

    /// Layout of the uidx table, keyed by `(uname, uhash)`.
    pub fn uidx_table_spec(&self) -> TableSpec {
        TableSpec::new(self.uidx_table_name(), &["uname", "uhash"])
    }

    /// Check the configuration before building a DAO.
    pub fn validate(&self) -> DaoResult<()> {
        if self.table.trim().is_empty() {
            return Err(DaoError::Configuration("table name is empty".to_string()));
        }
        if self.hash1 == self.hash2 {
            return Err(DaoError::Configuration(format!(
                "fingerprint hash functions must differ (both are {:?})",
                self.hash1
            )));
        }
        let uidx = self.uidx_table_name();
        if uidx.trim().is_empty() || uidx == self.table {
            return Err(DaoError::Configuration(format!(
                "uidx table name '{uidx}' is not usable"
            )));
        }
        for (i, group) in self.uidx_attrs.iter().enumerate() {
            if group.is_empty() || group.iter().any(|f| f.trim().is_empty()) {
                return Err(DaoError::Configuration(
                    "unique groups must list at least one non-empty field".to_string(),
                ));
            }
            // Equal groups would write the same uidx item twice per transaction.
            if self.uidx_attrs[..i].contains(group) {
                return Err(DaoError::Configuration(format!(
                    "unique group {group:?} is listed more than once"
                )));
            }
        }
        if let Some(prefix) = &self.pk_prefix {
            if prefix.attr.trim().is_empty() || prefix.attr == "id" {
                return Err(DaoError::Configuration(format!(
                    "invalid partition prefix attribute '{}'",
                    prefix.attr
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wide_column_defaults() {
        let config = WideColumnDaoConfig::new("users");
        assert_eq!(config.hash1, HashAlgorithm::Sha1);
        assert_eq!(config.hash2, HashAlgorithm::Md5);
        assert_eq!(config.uidx_table_name(), "users_uidx");
        assert_eq!(config.main_table_spec().key_attrs, vec!["id".to_string()]);
        assert!(config.validate().is_ok());

        let prefixed = WideColumnDaoConfig::new("users").with_pk_prefix("pk", "users");
        assert_eq!(prefixed.main_key_attrs(), vec!["pk".to_string(), "id".to_string()]);
        assert_eq!(prefixed.uidx_table_spec().key_attrs, vec!["uname".to_string(), "uhash".to_string()]);
    }

    #[test]
    fn test_wide_column_rejects_equal_hashes() {
        let config = WideColumnDaoConfig::new("users").with_hashes(HashAlgorithm::Md5, HashAlgorithm::Md5);
        assert!(matches!(config.validate(), Err(DaoError::Configuration(_))));
    }

    #[test]
    fn test_wide_column_rejects_bad_groups_and_names() {
        let config = WideColumnDaoConfig::new("users").with_unique_group(&[]);
        assert!(config.validate().is_err());
        let mut config = WideColumnDaoConfig::new("users");
        config.uidx_table = Some("users".to_string());
        assert!(config.validate().is_err());
        assert!(WideColumnDaoConfig::new(" ").validate().is_err());
        assert!(WideColumnDaoConfig::new("t").with_pk_prefix("id", "x").validate().is_err());
    }

    #[test]
    fn test_wide_column_rejects_repeated_group() {
        let config = WideColumnDaoConfig::new("users")
            .with_unique_group(&["email"])
            .with_unique_group(&["email"]);
        assert!(matches!(config.validate(), Err(DaoError::Configuration(_))));

        // Same fields in another order make a different group.
        let config = WideColumnDaoConfig::new("users")
            .with_unique_group(&["subject", "level"])
            .with_unique_group(&["level", "subject"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partitioned_rejects_empty_keys() {
        let fixed = PartitionedDocDaoConfig::new("users", PartitionKeySource::Fixed(String::new()));
        assert!(matches!(fixed.validate(), Err(DaoError::Configuration(_))));
        assert!(PartitionedDocDaoConfig::default().validate().is_err());
        let extra = PartitionedDocDaoConfig::new("users", PartitionKeySource::Extra(" ".into()));
        assert!(extra.validate().is_err());
        let unnamed = PartitionedDocDaoConfig::new("", PartitionKeySource::Fixed("all".into()));
        assert!(unnamed.validate().is_err());
        let ok = PartitionedDocDaoConfig::new("users", PartitionKeySource::Fixed("all".into()));
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_wide_column_from_json() {
        let config: WideColumnDaoConfig = serde_json::from_value(json!({
            "table": "users",
            "pk_prefix": {"attr": "pk", "value": "users"},
            "uidx_attrs": [["pk", "email"]]
        }))
        .unwrap();
        assert_eq!(config.hash1, HashAlgorithm::Sha1);
        assert_eq!(config.pk_prefix.unwrap().value, "users");
    }

    #[test]
    fn test_sql_and_partitioned_from_json() {
        let sql: SqlDaoConfig = serde_json::from_value(json!({
            "table": "users",
            "promoted_columns": [{"column": "email", "extra": "email"}]
        }))
        .unwrap();
        assert!(!sql.tx_mode_on_write);
        assert_eq!(sql.promoted_columns[0], PromotedColumn::new("email"));

        let part: PartitionedDocDaoConfig = serde_json::from_value(json!({
            "container": "users",
            "partition_key": {"extra": "tenant"}
        }))
        .unwrap();
        assert_eq!(part.partition_key, PartitionKeySource::Extra("tenant".into()));
        assert!(!part.cross_partition);
    }
}
