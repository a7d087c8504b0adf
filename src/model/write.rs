//! Generated write operations and their delete predicates.
//!
//! A [`Write`] is pure data: the driver renders it with `Display` to execute
//! it against the system under test, and feeds it to [`Snapshot::apply`] to
//! keep its own mirror current.
//!
//! [`Snapshot::apply`]: crate::model::Snapshot::apply

use std::fmt::Display;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::model::{Row, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Write {
    Insert {
        table: String,
        columns: Vec<String>,
        /// One value per column, one inner vec per inserted row.
        rows: Vec<Vec<Value>>,
    },
    Delete {
        table: String,
        predicate: Predicate,
    },
}

impl Write {
    pub fn table(&self) -> &str {
        match self {
            Write::Insert { table, .. } | Write::Delete { table, .. } => table,
        }
    }
}

impl Display for Write {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Write::Insert {
                table,
                columns,
                rows,
            } => {
                write!(f, "INSERT INTO {table} ({}) VALUES ", columns.iter().join(", "))?;
                for (i, row) in rows.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "({})", row.iter().join(", "))?;
                }
                Ok(())
            }
            Write::Delete { table, predicate } => {
                write!(f, "DELETE FROM {table} WHERE {predicate}")
            }
        }
    }
}

/// A delete predicate over a table's key columns. Matches the selected rows
/// exactly: equality per column for a single row, tuple set-membership for a
/// batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// `col1 = v1 AND col2 = v2 AND ...`
    Equals(Vec<(String, Value)>),
    /// `(col1, col2) IN ((a1, a2), (b1, b2), ...)`
    InSet {
        columns: Vec<String>,
        tuples: Vec<Vec<Value>>,
    },
}

impl Predicate {
    /// Whether a mirrored row satisfies this predicate. Columns absent from
    /// the row never match.
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Predicate::Equals(pairs) => pairs
                .iter()
                .all(|(column, value)| row.get(column) == Some(value)),
            Predicate::InSet { columns, tuples } => {
                let Some(key) = columns
                    .iter()
                    .map(|c| row.get(c))
                    .collect::<Option<Vec<&Value>>>()
                else {
                    return false;
                };
                tuples
                    .iter()
                    .any(|tuple| tuple.iter().zip(&key).all(|(t, k)| t == *k))
            }
        }
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Predicate::Equals(pairs) => {
                let clauses = pairs
                    .iter()
                    .map(|(column, value)| format!("{column} = {value}"))
                    .join(" AND ");
                write!(f, "{clauses}")
            }
            Predicate::InSet { columns, tuples } => {
                let tuples = tuples
                    .iter()
                    .map(|tuple| format!("({})", tuple.iter().join(", ")))
                    .join(", ");
                write!(f, "({}) IN ({tuples})", columns.iter().join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::row;

    #[test]
    fn test_insert_display() {
        let write = Write::Insert {
            table: "stories".to_string(),
            columns: vec!["id".to_string(), "title".to_string()],
            rows: vec![
                vec![Value::Integer(1), Value::text("a")],
                vec![Value::Integer(2), Value::text("b")],
            ],
        };
        assert_eq!(
            write.to_string(),
            "INSERT INTO stories (id, title) VALUES (1, 'a'), (2, 'b')"
        );
    }

    #[test]
    fn test_delete_display_single() {
        let write = Write::Delete {
            table: "votes".to_string(),
            predicate: Predicate::Equals(vec![
                ("story_id".to_string(), Value::Integer(1)),
                ("user_id".to_string(), Value::Integer(1)),
            ]),
        };
        assert_eq!(
            write.to_string(),
            "DELETE FROM votes WHERE story_id = 1 AND user_id = 1"
        );
    }

    #[test]
    fn test_delete_display_batch() {
        let write = Write::Delete {
            table: "stories".to_string(),
            predicate: Predicate::InSet {
                columns: vec!["id".to_string()],
                tuples: vec![vec![Value::Integer(1)], vec![Value::Integer(3)]],
            },
        };
        assert_eq!(
            write.to_string(),
            "DELETE FROM stories WHERE (id) IN ((1), (3))"
        );
    }

    #[test]
    fn test_predicate_matches() {
        let p = Predicate::Equals(vec![
            ("story_id".to_string(), Value::Integer(1)),
            ("user_id".to_string(), Value::Integer(1)),
        ]);
        assert!(p.matches(&row([
            ("story_id", Value::Integer(1)),
            ("user_id", Value::Integer(1)),
        ])));
        assert!(!p.matches(&row([
            ("story_id", Value::Integer(1)),
            ("user_id", Value::Integer(2)),
        ])));

        let p = Predicate::InSet {
            columns: vec!["id".to_string()],
            tuples: vec![vec![Value::Integer(1)], vec![Value::Integer(3)]],
        };
        assert!(p.matches(&row([("id", Value::Integer(3)), ("title", Value::text("c"))])));
        assert!(!p.matches(&row([("id", Value::Integer(2)), ("title", Value::text("b"))])));
    }
}
