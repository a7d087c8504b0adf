//! Ground-truth oracles: pure functions computing a query's expected result
//! directly from a snapshot, independent of the system under test.
//!
//! An oracle assumes its snapshot is internally consistent; the generator
//! enforces that. A dangling foreign key here is an upstream bug, so it
//! panics rather than being papered over.

use indexmap::{IndexMap, IndexSet};

use crate::model::{ResultSet, Snapshot, Value};

/// The oracle half of a query definition. Paired with the query's SQL text
/// inside a [`QuerySpec`](crate::workload::QuerySpec) so the two cannot
/// drift apart silently.
pub type OracleFn = fn(&Snapshot, &[Value]) -> ResultSet;

/// Expected result of the votes workload's `vote_count` query:
///
/// count votes per story, left-outer-join onto stories so voteless stories
/// still appear (with a NULL count), order by story id.
pub fn vote_count(snapshot: &Snapshot, params: &[Value]) -> ResultSet {
    assert!(params.is_empty(), "vote_count takes no parameters");

    let story_ids: IndexSet<i64> = snapshot
        .rows("stories")
        .iter()
        .filter_map(|row| row.get("id").and_then(Value::as_integer))
        .collect();

    let mut counts: IndexMap<i64, i64> = IndexMap::new();
    for vote in snapshot.rows("votes") {
        let story_id = vote
            .get("story_id")
            .and_then(Value::as_integer)
            .expect("votes row without integer story_id");
        assert!(
            story_ids.contains(&story_id),
            "dangling story_id {story_id} in votes"
        );
        *counts.entry(story_id).or_insert(0) += 1;
    }

    let mut result: ResultSet = snapshot
        .rows("stories")
        .iter()
        .map(|story| {
            let id = story
                .get("id")
                .and_then(Value::as_integer)
                .expect("stories row without integer id");
            let title = story.get("title").cloned().unwrap_or(Value::Null);
            let vcount = match counts.get(&id) {
                Some(n) => Value::Integer(*n),
                None => Value::Null,
            };
            vec![Value::Integer(id), title, vcount]
        })
        .collect();
    result.sort_by_key(|row| row[0].as_integer());
    result
}

/// Expected result of the recommendations workload's `recommended_articles`
/// query: articles joined to recommendations on article id, filtered to
/// `user_id BETWEEN lo AND hi`, projected to `(id, title)`. One output row
/// per matching recommendation; unordered (consumers row-sort).
pub fn recommended_articles(snapshot: &Snapshot, params: &[Value]) -> ResultSet {
    let [lo, hi] = params else {
        panic!("recommended_articles takes (lo, hi) parameters, got {params:?}");
    };
    let (lo, hi) = (
        lo.as_integer().expect("lo must be an integer"),
        hi.as_integer().expect("hi must be an integer"),
    );

    let articles: IndexMap<i64, &Value> = snapshot
        .rows("articles")
        .iter()
        .filter_map(|row| {
            let id = row.get("id").and_then(Value::as_integer)?;
            Some((id, row.get("title").unwrap_or(&Value::Null)))
        })
        .collect();

    let mut result = ResultSet::new();
    for recommendation in snapshot.rows("recommendations") {
        let user_id = recommendation
            .get("user_id")
            .and_then(Value::as_integer)
            .expect("recommendations row without integer user_id");
        if !(lo..=hi).contains(&user_id) {
            continue;
        }
        let article_id = recommendation
            .get("article_id")
            .and_then(Value::as_integer)
            .expect("recommendations row without integer article_id");
        let title = *articles
            .get(&article_id)
            .unwrap_or_else(|| panic!("dangling article_id {article_id} in recommendations"));
        result.push(vec![Value::Integer(article_id), title.clone()]);
    }
    result
}
