//! Table schemas as a workload declares them. Immutable once defined.

use std::fmt::Display;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<Column>,
    /// Columns a delete predicate keys on. Empty means the whole row is the
    /// key (tables like votes that carry no declared primary key).
    pub primary_key: Vec<String>,
    pub delete_policy: DeletePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub kind: ColumnKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

/// How the generator synthesizes values for a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    /// An identifier drawn from the configured id domain. Collisions are
    /// rare but possible; resolving them is the system under test's job.
    Key,
    /// Drawn uniformly from the referenced column's values in the snapshot.
    ForeignKey { table: String, column: String },
    /// Ordinary payload data.
    Payload,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
            primary_key: Vec::new(),
            delete_policy: DeletePolicy::Batch,
        }
    }

    pub fn primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn delete_policy(mut self, policy: DeletePolicy) -> Self {
        self.delete_policy = policy;
        self
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Columns a delete predicate matches on.
    pub fn key_columns(&self) -> Vec<String> {
        if self.primary_key.is_empty() {
            self.column_names()
        } else {
            self.primary_key.clone()
        }
    }

    /// Tables this schema references through foreign-key columns.
    pub fn referenced_tables(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().filter_map(|c| match &c.kind {
            ColumnKind::ForeignKey { table, .. } => Some(table.as_str()),
            _ => None,
        })
    }
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            kind: ColumnKind::Payload,
        }
    }

    pub fn key(mut self) -> Self {
        self.kind = ColumnKind::Key;
        self
    }

    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.kind = ColumnKind::ForeignKey {
            table: table.into(),
            column: column.into(),
        };
        self
    }
}

/// How many rows a generated delete removes from a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeletePolicy {
    /// A random non-empty subset, up to the generator's batch bound.
    Batch,
    /// Exactly one row per delete.
    SingleRow,
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "INTEGER"),
            ColumnType::Real => write!(f, "REAL"),
            ColumnType::Text => write!(f, "TEXT"),
        }
    }
}

impl Display for TableSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.column_type))
            .join(", ");
        write!(f, "CREATE TABLE {} ({columns}", self.name)?;
        if !self.primary_key.is_empty() {
            write!(f, ", PRIMARY KEY ({})", self.primary_key.iter().join(", "))?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stories() -> TableSchema {
        TableSchema::new(
            "stories",
            vec![
                Column::new("id", ColumnType::Integer).key(),
                Column::new("title", ColumnType::Text),
            ],
        )
        .primary_key(&["id"])
    }

    #[test]
    fn test_key_columns_default_to_all() {
        let votes = TableSchema::new(
            "votes",
            vec![
                Column::new("story_id", ColumnType::Integer).references("stories", "id"),
                Column::new("user_id", ColumnType::Integer).key(),
            ],
        );
        assert_eq!(votes.key_columns(), vec!["story_id", "user_id"]);
        assert_eq!(stories().key_columns(), vec!["id"]);
    }

    #[test]
    fn test_create_table_display() {
        assert_eq!(
            stories().to_string(),
            "CREATE TABLE stories (id INTEGER, title TEXT, PRIMARY KEY (id))"
        );
    }

    #[test]
    fn test_referenced_tables() {
        let votes = TableSchema::new(
            "votes",
            vec![Column::new("story_id", ColumnType::Integer).references("stories", "id")],
        );
        assert_eq!(votes.referenced_tables().collect::<Vec<_>>(), vec!["stories"]);
        assert_eq!(stories().referenced_tables().count(), 0);
    }
}
