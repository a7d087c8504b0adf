//! Error types for workload lookup and write generation.

/// Errors the core reports to its driver.
///
/// Lookup failures are recoverable by the caller; generator exhaustion is
/// fatal to the driver iteration that hit it.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// No workload registered under this name.
    #[error("workload not found: {0:?}")]
    WorkloadNotFound(String),
    /// The workload exists but has no query with this name.
    #[error("no query {query:?} in workload {workload:?}")]
    QueryNotFound { workload: String, query: String },
    /// Every insert is blocked on an empty referenced table and every table
    /// is empty, so no valid write exists. Indicates a misconfigured schema;
    /// a well-formed workload has at least one independent table.
    #[error("no candidate writes for workload {0:?}")]
    NoCandidateWrites(String),
    /// A query was invoked with the wrong number of parameters.
    #[error("query {query:?} takes {expected} parameter(s), got {got}")]
    ParameterCount {
        query: String,
        expected: usize,
        got: usize,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
