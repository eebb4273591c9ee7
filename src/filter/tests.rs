#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::NaiveDate;

use super::*;
use crate::entry::LogEntry;

fn sample() -> HistoryTree {
    let entries = [
        LogEntry::new("r.info map=elevation").with_timestamp("2024-06-01T10:00:00"),
        LogEntry::new("v.info map=roads")
            .with_timestamp("2024-06-01T11:00:00")
            .with_status("failed"),
        LogEntry::new("r.slope.aspect elevation=elevation").with_timestamp("2024-05-31"),
        LogEntry::new("g.region -p"),
    ];
    let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    HistoryTree::build(&entries, today)
}

fn texts(tree: &HistoryTree) -> Vec<String> {
    tree.buckets()
        .iter()
        .flat_map(|b| b.children().iter().map(|c| c.command_text.clone()))
        .collect()
}

// --- pattern ---

#[test]
fn empty_pattern_is_identity() {
    let tree = sample();
    let p = Predicate::pattern("").unwrap();
    assert!(p.is_none());
    assert_eq!(view(&tree, p.as_ref()), tree);
}

#[test]
fn whitespace_pattern_is_a_real_filter() {
    let entries = [LogEntry::new("g.region"), LogEntry::new("r.info map=a")];
    let tree = HistoryTree::build(&entries, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    let p = Predicate::pattern(" ").unwrap().unwrap();
    assert_eq!(texts(&p.apply(&tree)), vec!["r.info map=a"]);
}

#[test]
fn pattern_matching_nothing_yields_empty_tree() {
    let tree = sample();
    let p = Predicate::pattern("^d\\.").unwrap().unwrap();
    let filtered = p.apply(&tree);
    assert!(filtered.is_empty());
    assert_eq!(tree.command_count(), 4, "base tree untouched");
}

#[test]
fn pattern_is_a_search_not_a_full_match() {
    let p = Predicate::pattern("info").unwrap().unwrap();
    assert_eq!(
        texts(&p.apply(&sample())),
        vec!["r.info map=elevation", "v.info map=roads"]
    );
}

#[test]
fn pattern_is_case_sensitive() {
    let p = Predicate::pattern("INFO").unwrap().unwrap();
    assert!(p.apply(&sample()).is_empty());
    let p = Predicate::pattern("(?i)INFO").unwrap().unwrap();
    assert_eq!(p.apply(&sample()).command_count(), 2);
}

#[test]
fn pattern_drops_buckets_without_matches() {
    let p = Predicate::pattern("elevation").unwrap().unwrap();
    let filtered = p.apply(&sample());
    let ids: Vec<BucketId> = filtered.buckets().iter().map(|b| b.bucket_id()).collect();
    assert_eq!(ids, vec![BucketId::Today, BucketId::Yesterday]);
}

#[test]
fn pattern_restricted_to_bucket() {
    let p = Predicate::pattern("elevation")
        .unwrap()
        .unwrap()
        .in_bucket(BucketId::Yesterday);
    assert_eq!(
        texts(&p.apply(&sample())),
        vec!["r.slope.aspect elevation=elevation"]
    );
}

#[test]
fn invalid_pattern_reports_error() {
    let err = Predicate::pattern("r.info(").unwrap_err();
    assert!(matches!(err, HistoryError::InvalidFilterPattern(_)));
    assert!(!err.is_user_facing());
}

// --- exact ---

#[test]
fn exact_query_requires_all_fields() {
    let q = ExactQuery {
        command: Some("v.info map=roads".to_owned()),
        status: Some("failed".to_owned()),
        ..ExactQuery::default()
    };
    assert_eq!(texts(&Predicate::Exact(q).apply(&sample())), vec!["v.info map=roads"]);

    let q = ExactQuery {
        command: Some("v.info map=roads".to_owned()),
        status: Some("finished".to_owned()),
        ..ExactQuery::default()
    };
    assert!(Predicate::Exact(q).apply(&sample()).is_empty());
}

#[test]
fn exact_query_by_bucket() {
    let q = ExactQuery {
        bucket: Some(BucketId::Unknown),
        ..ExactQuery::default()
    };
    assert_eq!(texts(&Predicate::Exact(q).apply(&sample())), vec!["g.region -p"]);
}

#[test]
fn empty_exact_query_matches_nothing() {
    assert!(ExactQuery::default().is_empty());
    assert!(
        Predicate::Exact(ExactQuery::default())
            .apply(&sample())
            .is_empty()
    );
}

#[test]
fn closure_filter() {
    let filtered = filter(&sample(), |_, c| c.timestamp.is_none());
    assert_eq!(texts(&filtered), vec!["g.region -p"]);
}
