//! The line-oriented `.test` script surface.
//!
//! A script is a sequence of records: `statement ok` blocks that seed data,
//! `create cache from <query>` directives, and `query` records whose
//! `----`-delimited expected block the runner diffs live output against.
//! The full runner (executing SQL against a live database and its cache)
//! lives outside this crate; here we model the records, parse them, and
//! implement the pass criterion: actual rows, after applying the record's
//! sort mode, must exactly match the expected block.

use itertools::Itertools;
use similar::{ChangeTag, TextDiff};

use crate::model::{ColumnType, ResultSet, Value};

mod parser;

pub use parser::{parse_script, ScriptError};

/// One record of a `.test` script.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// `statement ok` followed by a SQL statement expected to succeed.
    Statement { sql: String },
    /// `create cache from <query>`: tells the system under test to start
    /// answering this query from its cache.
    CreateCache { query: String },
    /// A checked query with bound parameters and an expected block.
    Query(QueryRecord),
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryRecord {
    /// Column types of the result, one per projected column.
    pub types: Vec<ColumnType>,
    pub sort_mode: SortMode,
    pub sql: String,
    /// `? = <value>` bindings, in placeholder order.
    pub params: Vec<Value>,
    pub expected: Vec<Vec<Value>>,
}

/// How actual rows are arranged before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    /// Preserve the order the system under test returned.
    NoSort,
    /// Sort rows on both sides first; comparison is by multiset.
    RowSort,
}

/// Result of diffing actual output against a record's expected block.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    Match,
    Mismatch { reason: String },
}

impl Comparison {
    pub fn is_match(&self) -> bool {
        matches!(self, Comparison::Match)
    }
}

/// Check actual rows against a query record's expected block.
///
/// `rowsort` sorts both sides, so duplicate rows still have to appear the
/// same number of times on each side.
pub fn check_results(record: &QueryRecord, actual: &ResultSet) -> Comparison {
    let mut actual = actual.clone();
    let mut expected = record.expected.clone();
    if record.sort_mode == SortMode::RowSort {
        actual.sort();
        expected.sort();
    }

    if actual == expected {
        return Comparison::Match;
    }

    let expected_text = format_rows(&expected);
    let actual_text = format_rows(&actual);
    let diff = TextDiff::from_lines(&expected_text, &actual_text);
    let mut reason = String::from("--- expected\n+++ actual\n");
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
        };
        reason.push_str(&format!("{sign}{change}"));
    }
    Comparison::Mismatch { reason }
}

fn format_rows(rows: &[Vec<Value>]) -> String {
    rows.iter()
        .map(|row| row.iter().map(format_value).join("|"))
        .join("\n")
        + "\n"
}

/// Script-block rendering of a value: bare tokens, no SQL quoting.
fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(r) => r.to_string(),
        Value::Text(s) => s.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sort_mode: SortMode, expected: Vec<Vec<Value>>) -> QueryRecord {
        QueryRecord {
            types: vec![ColumnType::Integer, ColumnType::Text],
            sort_mode,
            sql: "SELECT id, title FROM articles".to_string(),
            params: vec![],
            expected,
        }
    }

    #[test]
    fn test_nosort_respects_order() {
        let r = record(
            SortMode::NoSort,
            vec![
                vec![Value::Integer(1), Value::text("a")],
                vec![Value::Integer(2), Value::text("b")],
            ],
        );
        let reversed = vec![
            vec![Value::Integer(2), Value::text("b")],
            vec![Value::Integer(1), Value::text("a")],
        ];
        assert!(!check_results(&r, &reversed).is_match());
    }

    #[test]
    fn test_rowsort_ignores_order() {
        let r = record(
            SortMode::RowSort,
            vec![
                vec![Value::Integer(1), Value::text("a")],
                vec![Value::Integer(2), Value::text("b")],
            ],
        );
        let reversed = vec![
            vec![Value::Integer(2), Value::text("b")],
            vec![Value::Integer(1), Value::text("a")],
        ];
        assert!(check_results(&r, &reversed).is_match());
    }

    #[test]
    fn test_rowsort_is_multiset_not_set() {
        // A duplicated row on one side only must not compare equal.
        let r = record(
            SortMode::RowSort,
            vec![
                vec![Value::Integer(1), Value::text("a")],
                vec![Value::Integer(1), Value::text("a")],
            ],
        );
        let deduplicated = vec![vec![Value::Integer(1), Value::text("a")]];
        assert!(!check_results(&r, &deduplicated).is_match());
    }

    #[test]
    fn test_mismatch_reason_is_a_diff() {
        let r = record(SortMode::NoSort, vec![vec![Value::Integer(1), Value::text("a")]]);
        let actual = vec![vec![Value::Integer(2), Value::text("a")]];
        match check_results(&r, &actual) {
            Comparison::Mismatch { reason } => {
                assert!(reason.contains("-1|a"));
                assert!(reason.contains("+2|a"));
            }
            Comparison::Match => panic!("expected mismatch"),
        }
    }
}
