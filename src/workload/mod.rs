//! Workload definitions and the static registry that resolves them.
//!
//! A workload bundles a schema with its named queries, each query carrying
//! both its SQL text and the pure oracle function that computes its expected
//! result. The pairing is a single registry entry resolved at startup, so a
//! query can never be looked up without its oracle (or vice versa).

use std::sync::LazyLock;

use indexmap::IndexMap;

use crate::errors::{Error, Result};
use crate::model::{
    Column, ColumnType, DeletePolicy, ResultSet, Snapshot, TableSchema, Value,
};
use crate::oracle::{self, OracleFn};

/// A named read query plus its oracle. The SQL text is what a driver
/// executes against the system under test; the oracle is what it diffs the
/// live output against. Keeping both here is what keeps them synchronized.
#[derive(Clone)]
pub struct QuerySpec {
    pub name: String,
    /// Parameterized SQL with `?` placeholders.
    pub sql: String,
    /// Projected column names, in output order.
    pub columns: Vec<String>,
    pub param_count: usize,
    /// Whether the query declares an ordering. Unordered queries have fixed
    /// content but unspecified row order; consumers row-sort before diffing.
    pub ordered: bool,
    pub oracle: OracleFn,
}

impl std::fmt::Debug for QuerySpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuerySpec")
            .field("name", &self.name)
            .field("sql", &self.sql)
            .field("columns", &self.columns)
            .field("param_count", &self.param_count)
            .field("ordered", &self.ordered)
            .finish_non_exhaustive()
    }
}

/// A named bundle of schema and query/oracle pairs.
#[derive(Debug, Clone)]
pub struct Workload {
    pub name: String,
    pub tables: Vec<TableSchema>,
    pub queries: Vec<QuerySpec>,
}

impl Workload {
    pub fn new(
        name: impl Into<String>,
        tables: Vec<TableSchema>,
        queries: Vec<QuerySpec>,
    ) -> Self {
        Self {
            name: name.into(),
            tables,
            queries,
        }
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn query(&self, name: &str) -> Result<&QuerySpec> {
        self.queries
            .iter()
            .find(|q| q.name == name)
            .ok_or_else(|| Error::QueryNotFound {
                workload: self.name.clone(),
                query: name.to_string(),
            })
    }

    /// Compute the expected result of a named query over a snapshot.
    pub fn expected(&self, query: &str, snapshot: &Snapshot, params: &[Value]) -> Result<ResultSet> {
        let spec = self.query(query)?;
        if params.len() != spec.param_count {
            return Err(Error::ParameterCount {
                query: spec.name.clone(),
                expected: spec.param_count,
                got: params.len(),
            });
        }
        Ok((spec.oracle)(snapshot, params))
    }
}

static WORKLOADS: LazyLock<IndexMap<String, Workload>> = LazyLock::new(|| {
    [votes_workload(), recommendations_workload()]
        .into_iter()
        .map(|w| (w.name.clone(), w))
        .collect()
});

/// Look up a registered workload by name.
pub fn workload(name: &str) -> Result<&'static Workload> {
    WORKLOADS
        .get(name)
        .ok_or_else(|| Error::WorkloadNotFound(name.to_string()))
}

/// All registered workloads, in registration order.
pub fn workloads() -> impl Iterator<Item = &'static Workload> {
    WORKLOADS.values()
}

/// Stories with per-story vote counts. Votes reference stories, so vote
/// inserts only become available once a story exists; deleting votes removes
/// exactly one row while deleting stories removes a random batch.
fn votes_workload() -> Workload {
    Workload::new(
        "votes",
        vec![
            TableSchema::new(
                "stories",
                vec![
                    Column::new("id", ColumnType::Integer).key(),
                    Column::new("title", ColumnType::Text),
                ],
            )
            .primary_key(&["id"]),
            TableSchema::new(
                "votes",
                vec![
                    Column::new("story_id", ColumnType::Integer).references("stories", "id"),
                    Column::new("user_id", ColumnType::Integer).key(),
                ],
            )
            .delete_policy(DeletePolicy::SingleRow),
        ],
        vec![QuerySpec {
            name: "vote_count".to_string(),
            sql: "SELECT stories.id, stories.title, vcount.votes AS vcount \
                  FROM stories \
                  LEFT JOIN (SELECT story_id, COUNT(*) AS votes FROM votes GROUP BY story_id) \
                  AS vcount ON (stories.id = vcount.story_id) \
                  ORDER BY stories.id"
                .to_string(),
            columns: vec!["id".to_string(), "title".to_string(), "vcount".to_string()],
            param_count: 0,
            ordered: true,
            oracle: oracle::vote_count,
        }],
    )
}

/// The logic-test fixture workload: articles joined to per-user
/// recommendations, filtered by a user-id range.
fn recommendations_workload() -> Workload {
    Workload::new(
        "recommendations",
        vec![
            TableSchema::new(
                "articles",
                vec![
                    Column::new("id", ColumnType::Integer).key(),
                    Column::new("title", ColumnType::Text),
                ],
            )
            .primary_key(&["id"]),
            TableSchema::new(
                "recommendations",
                vec![
                    Column::new("user_id", ColumnType::Integer).key(),
                    Column::new("article_id", ColumnType::Integer).references("articles", "id"),
                ],
            )
            .delete_policy(DeletePolicy::SingleRow),
        ],
        vec![QuerySpec {
            name: "recommended_articles".to_string(),
            sql: "SELECT articles.id, articles.title \
                  FROM articles \
                  JOIN recommendations ON (articles.id = recommendations.article_id) \
                  WHERE recommendations.user_id BETWEEN ? AND ?"
                .to_string(),
            columns: vec!["id".to_string(), "title".to_string()],
            param_count: 2,
            ordered: false,
            oracle: oracle::recommended_articles,
        }],
    )
}
