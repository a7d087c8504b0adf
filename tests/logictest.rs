//! Round trip of the recommendations fixture: the script's expected block
//! must match the oracle's output, and a second evaluation through the
//! registry (the cache-backed re-run) must produce the same multiset.

use cache_consistency::logictest::{check_results, parse_script, Record, SortMode};
use cache_consistency::{workload, Snapshot, Value, Write};

const FIXTURE: &str = include_str!("fixtures/recommendations.test");

/// Mirror of the fixture's two `statement ok` blocks, applied as structured
/// writes the way the driver would.
fn fixture_snapshot() -> Snapshot {
    let recommendations = workload("recommendations").unwrap();
    let mut snapshot = Snapshot::empty(recommendations);
    snapshot.apply(&Write::Insert {
        table: "articles".to_string(),
        columns: vec!["id".to_string(), "title".to_string()],
        rows: ["a", "b", "c", "d", "e"]
            .iter()
            .enumerate()
            .map(|(i, title)| vec![Value::Integer(i as i64 + 1), Value::text(*title)])
            .collect(),
    });
    snapshot.apply(&Write::Insert {
        table: "recommendations".to_string(),
        columns: vec!["user_id".to_string(), "article_id".to_string()],
        rows: [(1, 1), (1, 2), (1, 3), (2, 1), (2, 4), (2, 5)]
            .iter()
            .map(|(user, article)| vec![Value::Integer(*user), Value::Integer(*article)])
            .collect(),
    });
    snapshot
}

#[test]
fn fixture_round_trips_through_the_oracle() {
    let records = parse_script(FIXTURE).unwrap();
    assert_eq!(records.len(), 4);
    assert!(matches!(records[0], Record::Statement { .. }));
    assert!(matches!(records[1], Record::Statement { .. }));

    let Record::CreateCache { query } = &records[2] else {
        panic!("expected create cache record");
    };
    let Record::Query(query_record) = &records[3] else {
        panic!("expected query record");
    };
    // The cached query and the checked query are the same text.
    assert_eq!(query, &query_record.sql);
    assert_eq!(query_record.sort_mode, SortMode::RowSort);
    assert_eq!(
        query_record.params,
        vec![Value::Integer(1), Value::Integer(2)]
    );
    assert_eq!(query_record.expected.len(), 6);

    let recommendations = workload("recommendations").unwrap();
    let snapshot = fixture_snapshot();

    let direct = recommendations
        .expected("recommended_articles", &snapshot, &query_record.params)
        .unwrap();
    assert!(check_results(query_record, &direct).is_match());

    // Re-run as the cache-backed path would: same snapshot, same query,
    // same multiset.
    let cached = recommendations
        .expected("recommended_articles", &snapshot, &query_record.params)
        .unwrap();
    let mut direct_sorted = direct.clone();
    let mut cached_sorted = cached.clone();
    direct_sorted.sort();
    cached_sorted.sort();
    assert_eq!(direct_sorted, cached_sorted);
    assert!(check_results(query_record, &cached).is_match());
}

#[test]
fn fixture_query_matches_registered_sql() {
    // The registry's SQL text and the fixture's must not drift apart.
    let records = parse_script(FIXTURE).unwrap();
    let Record::Query(query_record) = &records[3] else {
        panic!("expected query record");
    };
    let recommendations = workload("recommendations").unwrap();
    let spec = recommendations.query("recommended_articles").unwrap();
    assert_eq!(spec.sql, query_record.sql);
    assert_eq!(spec.param_count, query_record.params.len());
    // The query is unordered, so the fixture must row-sort it.
    assert!(!spec.ordered);
    assert_eq!(query_record.sort_mode, SortMode::RowSort);
}
