//! Random write generation.
//!
//! The generator is a pure function of its snapshot argument plus an RNG the
//! caller owns: enumerate the candidate operations the snapshot currently
//! permits, choose one uniformly, then synthesize the rows or the delete
//! predicate. It performs no I/O and never looks at the system under test.

use fake::Fake;
use fake::faker::lorem::en::Word;
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::errors::{Error, Result};
use crate::model::{
    Column, ColumnKind, ColumnType, DeletePolicy, Predicate, Row, Snapshot, TableSchema, Value,
    Write,
};
use crate::workload::Workload;

/// Bounds for synthesized writes.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorOpts {
    /// Inserts and batch deletes touch 1..=this many rows.
    pub max_batch_rows: usize,
    /// Synthesized key values are drawn from `1..=id_domain`. Large enough
    /// to make collisions rare, small enough to make collision-rate tests
    /// deterministic.
    pub id_domain: i64,
}

impl Default for GeneratorOpts {
    fn default() -> Self {
        Self {
            max_batch_rows: 5,
            id_domain: 1_000_000,
        }
    }
}

/// Candidate operations enumerated from a snapshot's emptiness state. The
/// precondition check lives here, before any random choice is made.
#[derive(Debug, Clone, Copy)]
enum Candidate<'a> {
    Insert(&'a TableSchema),
    Delete(&'a TableSchema),
}

pub struct WriteGenerator<'a> {
    workload: &'a Workload,
    opts: GeneratorOpts,
}

impl<'a> WriteGenerator<'a> {
    pub fn new(workload: &'a Workload) -> Self {
        Self {
            workload,
            opts: GeneratorOpts::default(),
        }
    }

    pub fn with_opts(workload: &'a Workload, opts: GeneratorOpts) -> Self {
        Self { workload, opts }
    }

    /// Generate one valid write for the given snapshot.
    ///
    /// Fails with [`Error::NoCandidateWrites`] if the snapshot admits no
    /// operation at all; silently skipping a step would skew the workload
    /// density the driver assumes.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R, snapshot: &Snapshot) -> Result<Write> {
        let candidates = self.candidates(snapshot);
        if candidates.is_empty() {
            return Err(Error::NoCandidateWrites(self.workload.name.clone()));
        }

        let candidate = candidates[rng.random_range(0..candidates.len())];
        let write = match candidate {
            Candidate::Insert(table) => self.insert(rng, snapshot, table),
            Candidate::Delete(table) => self.delete(rng, snapshot, table),
        };
        tracing::debug!(
            candidates = candidates.len(),
            write = %write,
            "generated write"
        );
        Ok(write)
    }

    /// An insert into a table is available once every table it references is
    /// non-empty; a delete once the table holds at least one deletable row.
    fn candidates(&self, snapshot: &Snapshot) -> Vec<Candidate<'a>> {
        let mut candidates = Vec::new();
        for table in &self.workload.tables {
            if table
                .referenced_tables()
                .all(|referenced| !snapshot.table_is_empty(referenced))
            {
                candidates.push(Candidate::Insert(table));
            }
            if !self.deletable_rows(snapshot, table).is_empty() {
                candidates.push(Candidate::Delete(table));
            }
        }
        candidates
    }

    /// Rows that can be deleted without orphaning a foreign key elsewhere in
    /// the snapshot. The oracle hard-asserts referential integrity, so the
    /// generator never removes a row another table still points at.
    fn deletable_rows<'s>(&self, snapshot: &'s Snapshot, table: &TableSchema) -> Vec<&'s Row> {
        let mut pinned: Vec<(&str, Vec<&Value>)> = Vec::new();
        for dependent in &self.workload.tables {
            for column in &dependent.columns {
                if let ColumnKind::ForeignKey {
                    table: referenced,
                    column: referenced_column,
                } = &column.kind
                {
                    if *referenced == table.name {
                        pinned.push((
                            referenced_column.as_str(),
                            snapshot.column_values(&dependent.name, &column.name),
                        ));
                    }
                }
            }
        }

        snapshot
            .rows(&table.name)
            .iter()
            .filter(|row| {
                pinned.iter().all(|(column, values)| {
                    row.get(*column)
                        .map(|v| !values.contains(&v))
                        .unwrap_or(true)
                })
            })
            .collect()
    }

    fn insert<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        snapshot: &Snapshot,
        table: &TableSchema,
    ) -> Write {
        let row_count = rng.random_range(1..=self.opts.max_batch_rows);
        let rows = (0..row_count)
            .map(|_| {
                table
                    .columns
                    .iter()
                    .map(|column| self.value_for(rng, snapshot, column))
                    .collect()
            })
            .collect();
        Write::Insert {
            table: table.name.clone(),
            columns: table.column_names(),
            rows,
        }
    }

    fn value_for<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        snapshot: &Snapshot,
        column: &Column,
    ) -> Value {
        match &column.kind {
            ColumnKind::Key => Value::Integer(rng.random_range(1..=self.opts.id_domain)),
            ColumnKind::ForeignKey { table, column } => {
                let known = snapshot.column_values(table, column);
                // The candidate gate only offers this insert when the
                // referenced table is non-empty.
                assert!(
                    !known.is_empty(),
                    "insert offered with no known values for {table}.{column}"
                );
                (*known[rng.random_range(0..known.len())]).clone()
            }
            ColumnKind::Payload => match column.column_type {
                ColumnType::Integer => Value::Integer(rng.random_range(1..=self.opts.id_domain)),
                ColumnType::Real => Value::Real(rng.random_range(-1000.0..1000.0)),
                ColumnType::Text => Value::Text(Word().fake_with_rng(rng)),
            },
        }
    }

    fn delete<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        snapshot: &Snapshot,
        table: &TableSchema,
    ) -> Write {
        let rows = self.deletable_rows(snapshot, table);
        let selected: Vec<&Row> = match table.delete_policy {
            DeletePolicy::SingleRow => vec![rows[rng.random_range(0..rows.len())]],
            DeletePolicy::Batch => {
                let amount = rng.random_range(1..=self.opts.max_batch_rows.min(rows.len()));
                rows.choose_multiple(rng, amount).copied().collect()
            }
        };

        let key_columns = table.key_columns();
        let key_of = |row: &Row| -> Vec<Value> {
            key_columns
                .iter()
                .map(|column| row.get(column).cloned().unwrap_or(Value::Null))
                .collect()
        };

        let predicate = if let [row] = selected.as_slice() {
            Predicate::Equals(key_columns.iter().cloned().zip(key_of(row)).collect())
        } else {
            Predicate::InSet {
                columns: key_columns.clone(),
                tuples: selected.iter().map(|row| key_of(row)).collect(),
            }
        };
        Write::Delete {
            table: table.name.clone(),
            predicate,
        }
    }
}
