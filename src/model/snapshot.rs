//! Point-in-time mirror of all table contents.
//!
//! The driver owns the authoritative mirror and hands the core a snapshot on
//! every call; the core never retains state across calls.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::write::Write;
use crate::model::{Row, Value};
use crate::workload::Workload;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    tables: IndexMap<String, Vec<Row>>,
}

impl Snapshot {
    /// An empty snapshot with one (empty) entry per table in the workload.
    pub fn empty(workload: &Workload) -> Self {
        Self {
            tables: workload
                .tables
                .iter()
                .map(|t| (t.name.clone(), Vec::new()))
                .collect(),
        }
    }

    pub fn from_tables(tables: IndexMap<String, Vec<Row>>) -> Self {
        Self { tables }
    }

    /// Rows of a table, in insertion order. Unknown tables read as empty.
    pub fn rows(&self, table: &str) -> &[Row] {
        self.tables.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn table_is_empty(&self, table: &str) -> bool {
        self.rows(table).is_empty()
    }

    /// Every value a column currently holds, in row order. Duplicates are
    /// kept so a uniform draw matches the column's value distribution.
    pub fn column_values(&self, table: &str, column: &str) -> Vec<&Value> {
        self.rows(table)
            .iter()
            .filter_map(|row| row.get(column))
            .collect()
    }

    /// Apply a generated write to this mirror. This is the reference
    /// mirror-maintenance routine the driver mirrors on its side.
    pub fn apply(&mut self, write: &Write) {
        match write {
            Write::Insert {
                table,
                columns,
                rows,
            } => {
                let mirrored = self.tables.entry(table.clone()).or_default();
                for values in rows {
                    let row: Row = columns
                        .iter()
                        .cloned()
                        .zip(values.iter().cloned())
                        .collect();
                    mirrored.push(row);
                }
            }
            Write::Delete { table, predicate } => {
                if let Some(mirrored) = self.tables.get_mut(table) {
                    mirrored.retain(|row| !predicate.matches(row));
                }
            }
        }
    }

    pub fn total_rows(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::row;
    use crate::model::write::Predicate;

    fn votes_snapshot() -> Snapshot {
        let mut snapshot = Snapshot::default();
        snapshot.apply(&Write::Insert {
            table: "votes".to_string(),
            columns: vec!["story_id".to_string(), "user_id".to_string()],
            rows: vec![
                vec![Value::Integer(1), Value::Integer(1)],
                vec![Value::Integer(1), Value::Integer(2)],
            ],
        });
        snapshot
    }

    #[test]
    fn test_apply_insert() {
        let snapshot = votes_snapshot();
        assert_eq!(snapshot.rows("votes").len(), 2);
        assert_eq!(
            snapshot.rows("votes")[0],
            row([("story_id", Value::Integer(1)), ("user_id", Value::Integer(1))])
        );
    }

    #[test]
    fn test_apply_delete_removes_exactly_matched_rows() {
        let mut snapshot = votes_snapshot();
        snapshot.apply(&Write::Delete {
            table: "votes".to_string(),
            predicate: Predicate::Equals(vec![
                ("story_id".to_string(), Value::Integer(1)),
                ("user_id".to_string(), Value::Integer(1)),
            ]),
        });
        assert_eq!(
            snapshot.rows("votes"),
            &[row([("story_id", Value::Integer(1)), ("user_id", Value::Integer(2))])]
        );
    }

    #[test]
    fn test_column_values_keep_duplicates() {
        let snapshot = votes_snapshot();
        let values = snapshot.column_values("votes", "story_id");
        assert_eq!(values, vec![&Value::Integer(1), &Value::Integer(1)]);
    }

    #[test]
    fn test_unknown_table_reads_empty() {
        let snapshot = Snapshot::default();
        assert!(snapshot.table_is_empty("stories"));
        assert!(snapshot.rows("stories").is_empty());
    }
}
