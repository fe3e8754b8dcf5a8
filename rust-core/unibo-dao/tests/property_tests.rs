// SPDX-License-Identifier: PMPL-1.0-or-later
//! Property-based tests for fingerprints, filters and paging

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::{json, Value};
use unibo_core::UniversalBo;
use unibo_dao::uidx::fingerprint;
use unibo_dao::{DocumentDao, DocumentDaoConfig, Filter, HashAlgorithm, Sort, UniversalDao};
use unibo_storage::{Document, InMemoryDocumentBackend};

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[A-Za-z0-9@.]{0,16}".prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        Just(Value::Null),
    ]
}

fn arb_group() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::btree_set("[a-z]{1,6}", 1..4).prop_map(|s| s.into_iter().collect())
}

fn row_of(group: &[String], values: &[Value]) -> Document {
    group.iter().cloned().zip(values.iter().cloned()).collect()
}

fn dao_with(ages: &[i64]) -> DocumentDao {
    tokio_test::block_on(async {
        let store = InMemoryDocumentBackend::new();
        let dao = DocumentDao::new(Arc::new(store), DocumentDaoConfig::new("users"));
        for (i, age) in ages.iter().enumerate() {
            let bo = UniversalBo::new(i.to_string(), 1);
            bo.set_extra_attr("email", format!("{i:02}@p"));
            bo.set_extra_attr("age", *age);
            assert!(dao.create(&bo).await.unwrap());
        }
        dao
    })
}

fn ages_of(bos: &[UniversalBo]) -> Vec<i64> {
    bos.iter()
        .map(|b| b.extra_attr_as::<i64>("age").unwrap().unwrap())
        .collect()
}

proptest! {
    #[test]
    fn test_fingerprint_ignores_fields_outside_group(
        group in arb_group(),
        values in proptest::collection::vec(arb_value(), 3),
        noise in arb_value()
    ) {
        let row = row_of(&group, &values);
        let mut noisy = row.clone();
        noisy.insert("zz_unrelated".to_string(), noise);
        let a = fingerprint(&group, &row, HashAlgorithm::Sha1, HashAlgorithm::Md5);
        let b = fingerprint(&group, &noisy, HashAlgorithm::Sha1, HashAlgorithm::Md5);
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.uname, group.join("|"));
    }

    #[test]
    fn test_fingerprint_separates_values(
        group in arb_group(),
        left in "[a-z0-9]{1,12}",
        right in "[a-z0-9]{1,12}"
    ) {
        prop_assume!(left != right);
        let mut a = row_of(&group, &[]);
        let mut b = row_of(&group, &[]);
        a.insert(group[0].clone(), json!(left));
        b.insert(group[0].clone(), json!(right));
        let fa = fingerprint(&group, &a, HashAlgorithm::Sha1, HashAlgorithm::Md5);
        let fb = fingerprint(&group, &b, HashAlgorithm::Sha1, HashAlgorithm::Md5);
        prop_assert_eq!(&fa.uname, &fb.uname);
        prop_assert_ne!(fa.uhash, fb.uhash);
    }

    #[test]
    fn test_filter_returns_exactly_matching_rows(
        ages in proptest::collection::vec(0i64..50, 1..12),
        threshold in 0i64..50
    ) {
        let dao = dao_with(&ages);
        let found = tokio_test::block_on(dao.get_all(Some(&Filter::ge("age", threshold)), None)).unwrap();
        let expected = ages.iter().filter(|a| **a >= threshold).count();
        prop_assert_eq!(found.len(), expected);
        prop_assert!(ages_of(&found).iter().all(|a| *a >= threshold));
    }

    #[test]
    fn test_sort_desc_is_non_increasing(ages in proptest::collection::vec(0i64..50, 1..12)) {
        let dao = dao_with(&ages);
        let found = tokio_test::block_on(dao.get_all(None, Some(&Sort::by("age", true)))).unwrap();
        let got = ages_of(&found);
        prop_assert_eq!(got.len(), ages.len());
        prop_assert!(got.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_page_is_slice_of_full_ordering(
        n in 1usize..12,
        skip in 0usize..14,
        take in 0usize..6
    ) {
        let dao = dao_with(&vec![1; n]);
        let sort = Sort::by("email", false);
        let page = tokio_test::block_on(dao.get_n(skip, take, None, Some(&sort))).unwrap();
        let all: Vec<String> = (0..n).map(|i| i.to_string()).collect();
        let limit = if take == 0 { usize::MAX } else { take };
        let expected: Vec<String> = all.into_iter().skip(skip).take(limit).collect();
        let got: Vec<String> = page.iter().map(|b| b.id()).collect();
        prop_assert_eq!(got, expected);
    }
}
