use crate::memory::types::{MetadataFilter, Partition};
use crate::memory::vector;
use anyhow::Context;
use serde_json::Value;
use sqlx::SqlitePool;
use sqlx::sqlite::{Sqlite, SqliteArguments};

type BoundQuery<'q, O> = sqlx::query::QueryAs<'q, Sqlite, O, SqliteArguments<'q>>;

/// Metadata keys are spliced into JSON paths, so only plain identifiers pass.
fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// SQL fragment (`AND json_extract(...) = ?` per clause) for `filter`.
pub(super) fn filter_sql(filter: Option<&MetadataFilter>) -> anyhow::Result<String> {
    let Some(filter) = filter else {
        return Ok(String::new());
    };
    let mut sql = String::new();
    for (key, value) in filter.clauses() {
        anyhow::ensure!(is_valid_key(key), "invalid metadata filter key: {key:?}");
        anyhow::ensure!(
            matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_)),
            "unsupported metadata filter value for {key}: {value}"
        );
        sql.push_str(" AND json_extract(d.metadata, '$.");
        sql.push_str(key);
        sql.push_str("') = ?");
    }
    Ok(sql)
}

/// Bind the values matching [`filter_sql`], in clause order.
pub(super) fn bind_filter<'q, O>(
    mut query: BoundQuery<'q, O>,
    filter: Option<&'q MetadataFilter>,
) -> BoundQuery<'q, O> {
    let Some(filter) = filter else {
        return query;
    };
    for (_, value) in filter.clauses() {
        query = match value {
            Value::String(s) => query.bind(s.as_str()),
            Value::Bool(b) => query.bind(i64::from(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => query.bind(i),
                None => query.bind(n.as_f64().unwrap_or_default()),
            },
            // rejected by filter_sql
            _ => query,
        };
    }
    query
}

/// Quote every word so FTS5 operators in user text are inert.
pub(super) fn fts_query(text: &str) -> String {
    text.split_whitespace()
        .map(|w| w.replace('"', ""))
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .map(|w| format!("\"{w}\""))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// FTS5 search within one partition.
///
/// Returns `(id, bm25_score)` pairs, best first.
pub(super) async fn fts5_search(
    pool: &SqlitePool,
    partition: Partition,
    query: &str,
    filter: Option<&MetadataFilter>,
    limit: usize,
) -> anyhow::Result<Vec<(String, f32)>> {
    let fts = fts_query(query);
    if fts.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT d.id, bm25(documents_fts) AS score
         FROM documents_fts f
         JOIN documents d ON d.rowid = f.rowid
         WHERE documents_fts MATCH ? AND d.partition = ?{}
         ORDER BY score
         LIMIT ?",
        filter_sql(filter)?
    );

    #[allow(clippy::cast_possible_wrap)]
    let limit_i64 = limit as i64;

    let query = sqlx::query_as::<_, (String, f64)>(&sql)
        .bind(fts)
        .bind(partition.as_ref());
    let rows = bind_filter(query, filter)
        .bind(limit_i64)
        .fetch_all(pool)
        .await
        .context("FTS5 search query")?;

    #[allow(clippy::cast_possible_truncation)]
    let results = rows
        .into_iter()
        .map(|(id, score)| (id, (-score) as f32))
        .collect();
    Ok(results)
}

/// Brute-force cosine search within one partition.
///
/// Returns `(id, similarity)` pairs, best first.
pub(super) async fn vector_search(
    pool: &SqlitePool,
    partition: Partition,
    query_embedding: &[f32],
    filter: Option<&MetadataFilter>,
    limit: usize,
) -> anyhow::Result<Vec<(String, f32)>> {
    let sql = format!(
        "SELECT d.id, d.embedding FROM documents d
         WHERE d.embedding IS NOT NULL AND d.partition = ?{}",
        filter_sql(filter)?
    );
    let query = sqlx::query_as::<_, (String, Vec<u8>)>(&sql).bind(partition.as_ref());
    let rows = bind_filter(query, filter)
        .fetch_all(pool)
        .await
        .context("vector search query")?;

    let mut scored: Vec<(String, f32)> = rows
        .iter()
        .filter_map(|(id, blob)| {
            let sim = vector::cosine_similarity(query_embedding, &vector::bytes_to_vec(blob));
            (sim > 0.0).then(|| (id.clone(), sim))
        })
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    Ok(scored)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fts_query_quotes_and_strips() {
        assert_eq!(fts_query("team \"meeting\" -- notes"), "\"team\" OR \"meeting\" OR \"notes\"");
        assert_eq!(fts_query("   "), "");
        assert_eq!(fts_query("?? !!"), "");
    }

    #[test]
    fn filter_sql_rejects_injection_keys() {
        let bad = MetadataFilter::new().eq("x') OR 1=1 --", "a");
        assert!(filter_sql(Some(&bad)).is_err());

        let nested = MetadataFilter::new().eq("tags", serde_json::json!(["a"]));
        assert!(filter_sql(Some(&nested)).is_err());
    }

    #[test]
    fn filter_sql_emits_one_clause_per_key() {
        let filter = MetadataFilter::new().eq("category", "work").eq("status", "pending");
        let sql = filter_sql(Some(&filter)).unwrap();
        assert_eq!(sql.matches("json_extract").count(), 2);
        assert!(filter_sql(None).unwrap().is_empty());
    }
}
