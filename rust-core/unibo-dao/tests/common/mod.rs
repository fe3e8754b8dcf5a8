// SPDX-License-Identifier: PMPL-1.0-or-later
//! Checks shared by every backend suite.
//!
//! Each check takes a freshly built, empty DAO whose store has a unique
//! group on `email`, and whose `email` and `age` extras are filterable and
//! sortable.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use tracing_subscriber::EnvFilter;
use unibo_core::{SyncOptions, TimestampRounding, UniversalBo};
use unibo_dao::{Filter, Sort, UniversalDao};

/// Order the ten seed objects are inserted in.
pub const SEED_ORDER: [u32; 10] = [7, 2, 9, 0, 5, 3, 8, 1, 6, 4];

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// The object used by the create/get scenario.
pub fn scenario_bo() -> UniversalBo {
    let bo = UniversalBo::new("id", 1357);
    bo.set_data_attr("name.first", "Thanh").unwrap();
    bo.set_data_attr("name.last", "Nguyen").unwrap();
    bo.set_extra_attr("email", "myname@mydomain.com");
    bo.set_extra_attr("age", 35);
    bo
}

pub fn user(id: &str, email: &str, age: i64) -> UniversalBo {
    let bo = UniversalBo::new(id, 1);
    bo.set_extra_attr("email", email);
    bo.set_extra_attr("age", age);
    bo
}

pub fn fixed_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap() + chrono::Duration::nanoseconds(123_456_789)
}

pub async fn count(dao: &dyn UniversalDao) -> usize {
    dao.get_all(None, None).await.unwrap().len()
}

pub fn ids(bos: &[UniversalBo]) -> Vec<String> {
    bos.iter().map(|b| b.id()).collect()
}

/// Insert `i@d` (age `i`) for i in 0..10, out of order.
pub async fn seed_ten(dao: &dyn UniversalDao) {
    for i in SEED_ORDER {
        let bo = user(&i.to_string(), &format!("{i}@d"), i64::from(i));
        assert!(dao.create(&bo).await.unwrap());
    }
}

pub async fn check_round_trip(dao: &dyn UniversalDao) {
    let bo = scenario_bo();
    assert!(dao.create(&bo).await.unwrap());

    let got = dao.get("id").await.unwrap().expect("stored object");
    assert_eq!(got.id(), "id");
    assert_eq!(got.tag_version(), 1357);
    assert_eq!(got.data_attr("name.first"), Some(json!("Thanh")));
    assert_eq!(got.data_attr("name.last"), Some(json!("Nguyen")));
    assert_eq!(got.extra_attr("email"), Some(json!("myname@mydomain.com")));
    assert_eq!(got.extra_attr("age"), Some(json!(35)));

    bo.sync(SyncOptions::default());
    assert_eq!(got.time_created(), bo.time_created());
    assert_eq!(got.checksum(), bo.checksum());
    assert!(dao.get("missing").await.unwrap().is_none());
}

/// `data` text that does not decode is persisted as `null`, and loosely
/// formatted JSON comes back re-serialized.
pub async fn check_data_json_normalized(dao: &dyn UniversalDao) {
    let broken = user("broken", "broken@d", 1);
    broken.set_data_json("{oops");
    assert!(dao.create(&broken).await.unwrap());
    let got = dao.get("broken").await.unwrap().expect("stored object");
    assert_eq!(got.data_json(), "null");
    assert_eq!(got.data_tree(), serde_json::Value::Null);
    broken.sync(SyncOptions::default());
    assert_eq!(got.checksum(), broken.checksum());

    let loose = user("loose", "loose@d", 2);
    loose.set_data_json(r#"{ "a" :  [1, 2] }"#);
    assert!(dao.create(&loose).await.unwrap());
    let got = dao.get("loose").await.unwrap().expect("stored object");
    assert_eq!(got.data_json(), r#"{"a":[1,2]}"#);
    assert_eq!(got.data_attr("a[1]"), Some(json!(2)));
}

pub async fn check_create_duplicate(dao: &dyn UniversalDao) {
    let bo = user("1", "a@b", 1);
    assert!(dao.create(&bo).await.unwrap());
    let err = dao.create(&bo).await.unwrap_err();
    assert!(err.is_duplicated_entry(), "unexpected error: {err}");
    assert_eq!(count(dao).await, 1);
}

pub async fn check_unique_group(dao: &dyn UniversalDao) {
    let bo = user("id", "x@y", 1);
    assert!(dao.create(&bo).await.unwrap());
    bo.set_id("id2");
    let err = dao.create(&bo).await.unwrap_err();
    assert!(err.is_duplicated_entry(), "unexpected error: {err}");
    assert_eq!(count(dao).await, 1);
    assert!(dao.get("id2").await.unwrap().is_none());
}

pub async fn check_update_missing(dao: &dyn UniversalDao) {
    let bo = user("ghost", "g@h", 1);
    assert!(!dao.update(&bo).await.unwrap());
    assert_eq!(count(dao).await, 0);
}

pub async fn check_update_unique_collision(dao: &dyn UniversalDao) {
    dao.create(&user("1", "1@x", 1)).await.unwrap();
    let second = user("2", "2@x", 2);
    dao.create(&second).await.unwrap();

    second.set_extra_attr("email", "1@x");
    assert!(dao.update(&second).await.unwrap_err().is_duplicated_entry());
    let stored = dao.get("2").await.unwrap().unwrap();
    assert_eq!(stored.extra_attr("email"), Some(json!("2@x")));

    second.set_extra_attr("email", "3@x");
    assert!(dao.update(&second).await.unwrap());
    assert_eq!(
        dao.get("2").await.unwrap().unwrap().extra_attr("email"),
        Some(json!("3@x"))
    );
}

pub async fn check_delete_idempotent(dao: &dyn UniversalDao) {
    let bo = user("1", "a@b", 1);
    dao.create(&bo).await.unwrap();
    assert!(dao.delete(&bo).await.unwrap());
    assert!(!dao.delete(&bo).await.unwrap());
    assert!(dao.get("1").await.unwrap().is_none());
}

pub async fn check_save_returns_previous(dao: &dyn UniversalDao) {
    let bo = user("1", "a@b", 35);
    assert!(dao.create(&bo).await.unwrap());

    bo.set_extra_attr("age", 37);
    let (saved, previous) = dao.save(&bo).await.unwrap();
    assert!(saved);
    assert_eq!(previous.expect("previous value").extra_attr("age"), Some(json!(35)));
    assert_eq!(
        dao.get("1").await.unwrap().unwrap().extra_attr("age"),
        Some(json!(37))
    );
}

pub async fn check_save_twice(dao: &dyn UniversalDao) {
    let bo = user("1", "a@b", 35);
    let (saved, previous) = dao.save(&bo).await.unwrap();
    assert!(saved);
    assert!(previous.is_none());
    let first = dao.get("1").await.unwrap().unwrap();

    let (saved, previous) = dao.save(&bo).await.unwrap();
    assert!(saved);
    assert!(previous.unwrap().same_content(&first));

    let second = dao.get("1").await.unwrap().unwrap();
    assert_eq!(second.time_updated(), first.time_updated());
    assert_eq!(second.checksum(), first.checksum());
    assert_eq!(count(dao).await, 1);
}

pub async fn check_filter(dao: &dyn UniversalDao) {
    seed_ten(dao).await;
    let found = dao
        .get_all(Some(&Filter::ge("age", 3)), Some(&Sort::by("age", false)))
        .await
        .unwrap();
    assert_eq!(found.len(), 7);
    for bo in &found {
        assert!(bo.extra_attr_as::<i64>("age").unwrap().unwrap() >= 3);
    }

    let either = Filter::or(vec![Filter::eq("email", "1@d"), Filter::lt("age", 1)]);
    let mut found = ids(&dao.get_all(Some(&either), None).await.unwrap());
    found.sort();
    assert_eq!(found, vec!["0", "1"]);
}

pub async fn check_sort_desc(dao: &dyn UniversalDao) {
    seed_ten(dao).await;
    let sorted = dao
        .get_all(None, Some(&Sort::by("email", true)))
        .await
        .unwrap();
    assert_eq!(ids(&sorted), vec!["9", "8", "7", "6", "5", "4", "3", "2", "1", "0"]);
}

pub async fn check_paging(dao: &dyn UniversalDao) {
    seed_ten(dao).await;
    let page = dao
        .get_n(3, 4, None, Some(&Sort::by("email", true)))
        .await
        .unwrap();
    assert_eq!(ids(&page), vec!["6", "5", "4", "3"]);

    let tail = dao
        .get_n(8, 0, None, Some(&Sort::by("email", true)))
        .await
        .unwrap();
    assert_eq!(ids(&tail), vec!["1", "0"]);
}

/// Stored timestamps come back truncated to whole seconds.
pub async fn check_timestamps_truncated(dao: &dyn UniversalDao) {
    let now = fixed_instant();
    let bo = user("1", "a@b", 1);
    bo.set_timestamp_rounding(TimestampRounding::Second);
    bo.set_time_created(now);
    bo.set_time_updated(now);
    bo.set_extra_attr("t", now);

    bo.sync(SyncOptions::default());
    let csum = bo.checksum();
    bo.sync(SyncOptions::default());
    assert_eq!(bo.checksum(), csum);

    dao.create(&bo).await.unwrap();
    let got = dao.get("1").await.unwrap().unwrap();
    let expected = TimestampRounding::Second.round(now);
    assert_eq!(got.time_created(), expected);
    assert_eq!(got.time_updated(), expected);
    assert_eq!(got.extra_attr_as::<DateTime<Utc>>("t").unwrap(), Some(expected));
}
