//! Parser for the `.test` script format.

use crate::model::{ColumnType, Value};

use super::{QueryRecord, Record, SortMode};

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScriptError {
    #[error("line {line}: unknown directive {directive:?}")]
    UnknownDirective { line: usize, directive: String },
    #[error("line {line}: unknown result type {type_char:?} (expected I, R or T)")]
    UnknownResultType { line: usize, type_char: char },
    #[error("line {line}: unknown sort mode {mode:?} (expected nosort or rowsort)")]
    UnknownSortMode { line: usize, mode: String },
    #[error("line {line}: directive {directive:?} has no SQL body")]
    MissingSql { line: usize, directive: String },
    #[error("line {line}: query record has no `----` expected block")]
    MissingExpectedBlock { line: usize },
    #[error("line {line}: expected {expected} value(s) per row, found {got}")]
    ColumnCount {
        line: usize,
        expected: usize,
        got: usize,
    },
    #[error("line {line}: {token:?} is not a valid {column_type} value")]
    BadValue {
        line: usize,
        token: String,
        column_type: ColumnType,
    },
}

/// Parse a whole script into records. Blank lines separate records; `#`
/// starts a comment line.
pub fn parse_script(input: &str) -> Result<Vec<Record>, ScriptError> {
    let mut lines = input
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l))
        .peekable();
    let mut records = Vec::new();

    while let Some(&(line_no, line)) = lines.peek() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            lines.next();
            continue;
        }

        if trimmed == "statement ok" {
            lines.next();
            let sql = take_sql(&mut lines, |l| l.trim().is_empty());
            if sql.is_empty() {
                return Err(ScriptError::MissingSql {
                    line: line_no,
                    directive: "statement ok".to_string(),
                });
            }
            records.push(Record::Statement { sql });
        } else if let Some(query) = trimmed.strip_prefix("create cache from ") {
            lines.next();
            records.push(Record::CreateCache {
                query: query.trim().to_string(),
            });
        } else if let Some(rest) = trimmed.strip_prefix("query") {
            lines.next();
            records.push(Record::Query(parse_query(line_no, rest, &mut lines)?));
        } else {
            return Err(ScriptError::UnknownDirective {
                line: line_no,
                directive: trimmed.to_string(),
            });
        }
    }

    Ok(records)
}

fn parse_query<'a, I>(
    directive_line: usize,
    rest: &str,
    lines: &mut std::iter::Peekable<I>,
) -> Result<QueryRecord, ScriptError>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    let mut words = rest.split_whitespace();
    let types = words
        .next()
        .map(|spec| parse_types(directive_line, spec))
        .transpose()?
        .unwrap_or_default();
    let sort_mode = match words.next() {
        None => SortMode::NoSort,
        Some("nosort") => SortMode::NoSort,
        Some("rowsort") => SortMode::RowSort,
        Some(mode) => {
            return Err(ScriptError::UnknownSortMode {
                line: directive_line,
                mode: mode.to_string(),
            });
        }
    };

    // SQL lines run until the first parameter binding or the `----`.
    let sql = take_sql(lines, |l| {
        let t = l.trim();
        t.is_empty() || t.starts_with("? =") || t == "----"
    });
    if sql.is_empty() {
        return Err(ScriptError::MissingSql {
            line: directive_line,
            directive: "query".to_string(),
        });
    }

    let mut params = Vec::new();
    let mut saw_delimiter = false;
    let mut last_line = directive_line;
    for (line_no, line) in lines.by_ref() {
        last_line = line_no;
        let trimmed = line.trim();
        if trimmed == "----" {
            saw_delimiter = true;
            break;
        }
        if let Some(value) = trimmed.strip_prefix("? =") {
            params.push(parse_untyped(value.trim()));
        } else {
            return Err(ScriptError::MissingExpectedBlock { line: line_no });
        }
    }
    if !saw_delimiter {
        return Err(ScriptError::MissingExpectedBlock { line: last_line });
    }

    let mut expected = Vec::new();
    while let Some(&(line_no, line)) = lines.peek() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            break;
        }
        lines.next();
        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        if tokens.len() != types.len() {
            return Err(ScriptError::ColumnCount {
                line: line_no,
                expected: types.len(),
                got: tokens.len(),
            });
        }
        let row = tokens
            .iter()
            .zip(&types)
            .map(|(token, column_type)| parse_typed(line_no, token, *column_type))
            .collect::<Result<Vec<Value>, ScriptError>>()?;
        expected.push(row);
    }

    Ok(QueryRecord {
        types,
        sort_mode,
        sql,
        params,
        expected,
    })
}

fn parse_types(line: usize, spec: &str) -> Result<Vec<ColumnType>, ScriptError> {
    spec.chars()
        .map(|c| match c {
            'I' => Ok(ColumnType::Integer),
            'R' => Ok(ColumnType::Real),
            'T' => Ok(ColumnType::Text),
            type_char => Err(ScriptError::UnknownResultType { line, type_char }),
        })
        .collect()
}

/// Collect SQL lines until `stop` matches, joining with newlines. The
/// stopping line is left in the iterator.
fn take_sql<'a, I>(lines: &mut std::iter::Peekable<I>, stop: impl Fn(&str) -> bool) -> String
where
    I: Iterator<Item = (usize, &'a str)>,
{
    let mut sql = Vec::new();
    while let Some(&(_, line)) = lines.peek() {
        if stop(line) {
            break;
        }
        sql.push(line.trim().to_string());
        lines.next();
    }
    sql.join("\n")
}

/// Parameter bindings carry no type annotation; infer from the literal.
fn parse_untyped(token: &str) -> Value {
    if token.eq_ignore_ascii_case("NULL") {
        Value::Null
    } else if let Ok(i) = token.parse::<i64>() {
        Value::Integer(i)
    } else if let Ok(r) = token.parse::<f64>() {
        Value::Real(r)
    } else {
        Value::Text(token.trim_matches('"').to_string())
    }
}

fn parse_typed(line: usize, token: &str, column_type: ColumnType) -> Result<Value, ScriptError> {
    if token.eq_ignore_ascii_case("NULL") {
        return Ok(Value::Null);
    }
    let parsed = match column_type {
        ColumnType::Integer => token.parse::<i64>().ok().map(Value::Integer),
        ColumnType::Real => token.parse::<f64>().ok().map(Value::Real),
        ColumnType::Text => Some(Value::Text(token.trim_matches('"').to_string())),
    };
    parsed.ok_or_else(|| ScriptError::BadValue {
        line,
        token: token.to_string(),
        column_type,
    })
}
