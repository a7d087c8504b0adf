//! Data model shared by the generator and the oracle: literal values,
//! rows, table schemas and snapshots.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub mod snapshot;
pub mod table;
pub mod write;

pub use snapshot::Snapshot;
pub use table::{Column, ColumnKind, ColumnType, DeletePolicy, TableSchema};
pub use write::{Predicate, Write};

/// A row as the driver mirrors it: column name to value, in schema order.
pub type Row = IndexMap<String, Value>;

/// An ordered query result as the oracle computes it. Column order follows
/// the query's projection, row order its declared ordering (if any).
pub type ResultSet = Vec<Vec<Value>>;

/// A SQL literal value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Rank used for the total order across variants.
    fn type_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Integer(_) | Value::Real(_) => 1,
            Value::Text(_) => 2,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a.total_cmp(b) == Ordering::Equal,
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_rank().hash(state);
        match self {
            Value::Null => {}
            Value::Integer(i) => i.hash(state),
            Value::Real(r) => r.to_bits().hash(state),
            Value::Text(s) => s.hash(state),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Total order: NULL, then numerics (integers and reals compared
/// numerically), then text. Used by the row-sorted comparison mode.
impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Real(a), Value::Real(b)) => a.total_cmp(b),
            (Value::Integer(a), Value::Real(b)) => (*a as f64).total_cmp(b),
            (Value::Real(a), Value::Integer(b)) => a.total_cmp(&(*b as f64)),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

/// Build a row from column/value pairs, preserving order.
pub fn row<const N: usize>(columns: [(&str, Value); N]) -> Row {
    columns
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Integer(42).to_string(), "42");
        assert_eq!(Value::Real(3.5).to_string(), "3.5");
        assert_eq!(Value::text("hello").to_string(), "'hello'");
        assert_eq!(Value::text("it's").to_string(), "'it''s'");
        assert_eq!(Value::Null.to_string(), "NULL");
    }

    #[test]
    fn test_value_ordering() {
        let mut values = vec![
            Value::text("b"),
            Value::Integer(2),
            Value::Null,
            Value::Real(1.5),
            Value::text("a"),
            Value::Integer(1),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Integer(1),
                Value::Real(1.5),
                Value::Integer(2),
                Value::text("a"),
                Value::text("b"),
            ]
        );
    }

    #[test]
    fn test_row_preserves_order() {
        let r = row([("id", Value::Integer(1)), ("title", Value::text("a"))]);
        let columns: Vec<_> = r.keys().cloned().collect();
        assert_eq!(columns, vec!["id", "title"]);
    }
}
