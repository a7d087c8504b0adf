//! Consistency-testing core for a caching layer in front of a SQL database.
//!
//! Two cooperating, stateless-between-calls components, composed by an
//! external test driver that owns all accumulated row state:
//!
//! - [`generation::WriteGenerator`] picks a valid random mutation (insert or
//!   delete) for the driver to apply to both the system under test and its
//!   own mirror;
//! - the oracle side of a [`workload::Workload`] computes the exact expected
//!   result of a named query from a [`model::Snapshot`], for the driver to
//!   diff against live output.
//!
//! Workloads bundle a schema with query/oracle pairs and are resolved by
//! name through [`workload::workload`]. The [`logictest`] module models the
//! `.test` script surface an external logic-test runner consumes.

pub mod errors;
pub mod generation;
pub mod logictest;
pub mod model;
pub mod oracle;
pub mod workload;

pub use errors::{Error, Result};
pub use generation::{GeneratorOpts, WriteGenerator};
pub use model::{Predicate, ResultSet, Row, Snapshot, Value, Write};
pub use workload::{workload, workloads, QuerySpec, Workload};
