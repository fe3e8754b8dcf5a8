// SPDX-License-Identifier: PMPL-1.0-or-later
//! DocumentDao against the in-memory document store.

mod common;

use std::sync::Arc;

use unibo_core::{BoOptions, TimestampRounding, UniversalBo};
use unibo_dao::{DocumentDao, DocumentDaoConfig, Filter, UniversalDao};
use unibo_storage::InMemoryDocumentBackend;

async fn users_dao() -> (DocumentDao, InMemoryDocumentBackend) {
    common::init_tracing();
    let store = InMemoryDocumentBackend::new();
    store.create_unique_index("users", &["email"]).await;
    let dao = DocumentDao::new(Arc::new(store.clone()), DocumentDaoConfig::new("users"));
    (dao, store)
}

#[tokio::test]
async fn test_create_and_get() {
    common::check_round_trip(&users_dao().await.0).await;
}

#[tokio::test]
async fn test_invalid_data_json_stored_as_null() {
    common::check_data_json_normalized(&users_dao().await.0).await;
}

#[tokio::test]
async fn test_create_duplicate_id() {
    common::check_create_duplicate(&users_dao().await.0).await;
}

#[tokio::test]
async fn test_duplicate_unique_index() {
    let (dao, store) = users_dao().await;
    common::check_unique_group(&dao).await;
    assert_eq!(store.count("users").await, 1);
}

#[tokio::test]
async fn test_update_missing_row() {
    common::check_update_missing(&users_dao().await.0).await;
}

#[tokio::test]
async fn test_update_unique_collision() {
    common::check_update_unique_collision(&users_dao().await.0).await;
}

#[tokio::test]
async fn test_delete_twice() {
    common::check_delete_idempotent(&users_dao().await.0).await;
}

#[tokio::test]
async fn test_save_returns_previous() {
    common::check_save_returns_previous(&users_dao().await.0).await;
}

#[tokio::test]
async fn test_save_same_content_twice() {
    common::check_save_twice(&users_dao().await.0).await;
}

#[tokio::test]
async fn test_filter() {
    common::check_filter(&users_dao().await.0).await;
}

#[tokio::test]
async fn test_sort_desc() {
    common::check_sort_desc(&users_dao().await.0).await;
}

#[tokio::test]
async fn test_paging() {
    common::check_paging(&users_dao().await.0).await;
}

#[tokio::test]
async fn test_timestamps_truncated() {
    common::check_timestamps_truncated(&users_dao().await.0).await;
}

#[tokio::test]
async fn test_default_order_is_id() {
    let (dao, _) = users_dao().await;
    common::seed_ten(&dao).await;
    let all = dao.get_all(None, None).await.unwrap();
    assert_eq!(common::ids(&all), vec!["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"]);
}

#[tokio::test]
async fn test_raw_predicate_passes_through() {
    let (dao, _) = users_dao().await;
    common::seed_ten(&dao).await;
    let raw = Filter::raw(serde_json::json!({"age": {"$in": [1, 4, 42]}}));
    let mut found = common::ids(&dao.get_all(Some(&raw), None).await.unwrap());
    found.sort();
    assert_eq!(found, vec!["1", "4"]);
}

#[tokio::test]
async fn test_every_rounding_setting_is_honored() {
    let settings = [
        TimestampRounding::None,
        TimestampRounding::Nanosecond,
        TimestampRounding::Microsecond,
        TimestampRounding::Millisecond,
        TimestampRounding::Second,
    ];
    let now = common::fixed_instant();
    for rounding in settings {
        let opts = BoOptions {
            timestamp_rounding: rounding,
        };
        let store = InMemoryDocumentBackend::new();
        let dao = DocumentDao::new(Arc::new(store), DocumentDaoConfig::new("events")).with_options(opts);

        let bo = UniversalBo::with_options("e", 1, opts);
        bo.set_time_created(now);
        bo.set_time_updated(now);
        dao.create(&bo).await.unwrap();

        let got = dao.get("e").await.unwrap().unwrap();
        assert_eq!(got.time_created(), rounding.round(now), "{rounding:?}");
        assert_eq!(got.time_updated(), rounding.round(now), "{rounding:?}");
    }
}
