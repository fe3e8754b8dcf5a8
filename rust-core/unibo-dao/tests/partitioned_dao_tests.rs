// SPDX-License-Identifier: PMPL-1.0-or-later
//! PartitionedDocumentDao against the in-memory partitioned store.

mod common;

use std::sync::Arc;

use serde_json::json;
use unibo_dao::{
    DaoError, PartitionKeySource, PartitionedDocDaoConfig, PartitionedDocumentDao, UniversalDao,
};
use unibo_storage::InMemoryPartitionedBackend;

async fn store() -> InMemoryPartitionedBackend {
    common::init_tracing();
    let store = InMemoryPartitionedBackend::new();
    store.create_container("users", &[&["email"]]).await;
    store
}

async fn fixed_dao() -> PartitionedDocumentDao {
    let config = PartitionedDocDaoConfig::new("users", PartitionKeySource::Fixed("users".into()));
    PartitionedDocumentDao::new(Arc::new(store().await), config).unwrap()
}

#[tokio::test]
async fn test_create_and_get() {
    common::check_round_trip(&fixed_dao().await).await;
}

#[tokio::test]
async fn test_invalid_data_json_stored_as_null() {
    common::check_data_json_normalized(&fixed_dao().await).await;
}

#[tokio::test]
async fn test_create_duplicate_id() {
    common::check_create_duplicate(&fixed_dao().await).await;
}

#[tokio::test]
async fn test_duplicate_unique_key() {
    common::check_unique_group(&fixed_dao().await).await;
}

#[tokio::test]
async fn test_update_missing_row() {
    common::check_update_missing(&fixed_dao().await).await;
}

#[tokio::test]
async fn test_update_unique_collision() {
    common::check_update_unique_collision(&fixed_dao().await).await;
}

#[tokio::test]
async fn test_delete_twice() {
    common::check_delete_idempotent(&fixed_dao().await).await;
}

#[tokio::test]
async fn test_save_returns_previous() {
    common::check_save_returns_previous(&fixed_dao().await).await;
}

#[tokio::test]
async fn test_save_same_content_twice() {
    common::check_save_twice(&fixed_dao().await).await;
}

#[tokio::test]
async fn test_filter() {
    common::check_filter(&fixed_dao().await).await;
}

#[tokio::test]
async fn test_sort_desc() {
    common::check_sort_desc(&fixed_dao().await).await;
}

#[tokio::test]
async fn test_paging() {
    common::check_paging(&fixed_dao().await).await;
}

#[tokio::test]
async fn test_timestamps_truncated() {
    common::check_timestamps_truncated(&fixed_dao().await).await;
}

#[tokio::test]
async fn test_same_id_in_two_partitions() {
    let store = store().await;
    let config = PartitionedDocDaoConfig::new("users", PartitionKeySource::Extra("tenant".into()));
    let dao = PartitionedDocumentDao::new(Arc::new(store.clone()), config).unwrap();

    for (tenant, age) in [("acme", 1), ("globex", 2)] {
        let bo = common::user("1", "a@b", age);
        bo.set_extra_attr("tenant", tenant);
        assert!(dao.create(&bo).await.unwrap());
    }
    let acme = dao.get_in_partition("acme", "1").await.unwrap().unwrap();
    let globex = dao.get_in_partition("globex", "1").await.unwrap().unwrap();
    assert_eq!(acme.extra_attr("age"), Some(json!(1)));
    assert_eq!(globex.extra_attr("age"), Some(json!(2)));

    // Reads that do not know the partition need the opt-in.
    assert!(matches!(dao.get_all(None, None).await, Err(DaoError::Configuration(_))));

    // Writes land in the partition named by the object.
    acme.set_extra_attr("age", 10);
    assert!(dao.update(&acme).await.unwrap());
    assert_eq!(
        dao.get_in_partition("globex", "1").await.unwrap().unwrap().extra_attr("age"),
        Some(json!(2))
    );
    assert!(dao.delete(&globex).await.unwrap());
    assert_eq!(store.count("users", "globex").await, 0);
    assert_eq!(store.count("users", "acme").await, 1);
}

#[tokio::test]
async fn test_cross_partition_listing() {
    let store = store().await;
    let config = PartitionedDocDaoConfig::new("users", PartitionKeySource::Extra("tenant".into()))
        .with_cross_partition(true);
    let dao = PartitionedDocumentDao::new(Arc::new(store), config).unwrap();
    for i in 0..4 {
        let bo = common::user(&i.to_string(), &format!("{i}@d"), i);
        bo.set_extra_attr("tenant", if i % 2 == 0 { "even" } else { "odd" });
        dao.create(&bo).await.unwrap();
    }
    let all = dao.get_all(None, None).await.unwrap();
    assert_eq!(common::ids(&all), vec!["0", "1", "2", "3"]);
    assert_eq!(dao.get("3").await.unwrap().unwrap().extra_attr("tenant"), Some(json!("odd")));
}
