//! Helpers shared by the adapters: row collection and error mapping.

use chatdb_agent::DataSourceError;
use futures_util::{Stream, TryStreamExt};

/// Size limits applied by an adapter.
#[derive(Debug, Clone, Copy)]
pub struct SourceLimits {
    /// Rows fetched per query before the result is marked truncated.
    pub row_limit: usize,
    /// Example rows per table in the schema description.
    pub sample_rows: usize,
}

impl Default for SourceLimits {
    fn default() -> Self {
        Self {
            row_limit: 5,
            sample_rows: 3,
        }
    }
}

/// Pull at most `limit` decoded rows from `stream`. The flag reports
/// whether more rows were available.
pub(crate) async fn collect_rows<R, S, F>(
    mut stream: S,
    limit: usize,
    decode: F,
) -> Result<(Vec<Vec<serde_json::Value>>, bool), sqlx::Error>
where
    S: Stream<Item = Result<R, sqlx::Error>> + Unpin,
    F: Fn(&R) -> Result<Vec<serde_json::Value>, sqlx::Error>,
{
    let mut rows = Vec::new();
    while let Some(row) = stream.try_next().await? {
        if rows.len() == limit {
            return Ok((rows, true));
        }
        rows.push(decode(&row)?);
    }
    Ok((rows, false))
}

/// Connection-level failures end the turn; everything else is a query
/// error the model can react to.
pub(crate) fn classify(err: sqlx::Error) -> DataSourceError {
    match err {
        sqlx::Error::Database(db) => DataSourceError::Query(db.message().to_string()),
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Configuration(_) => DataSourceError::Unavailable(err.to_string()),
        other => DataSourceError::Query(other.to_string()),
    }
}

/// Double-quote an identifier for interpolation into SQL.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Sample rows in the comment block appended after each table definition.
pub(crate) fn render_sample(
    table: &str,
    columns: &[String],
    rows: &[Vec<serde_json::Value>],
) -> String {
    let mut out = format!("/*\n{} rows from {table} table:\n{}", rows.len(), columns.join("\t"));
    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .map(|cell| match cell {
                serde_json::Value::Null => "None".to_string(),
                serde_json::Value::String(s) => truncate_cell(s),
                other => other.to_string(),
            })
            .collect();
        out.push('\n');
        out.push_str(&cells.join("\t"));
    }
    out.push_str("\n*/");
    out
}

fn truncate_cell(s: &str) -> String {
    const MAX: usize = 100;
    if s.chars().count() > MAX {
        let cut: String = s.chars().take(MAX).collect();
        format!("{cut}...")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("orders"), "\"orders\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn sample_block_layout() {
        let block = render_sample(
            "orders",
            &["id".into(), "note".into()],
            &[vec![json!(1), json!("first")], vec![json!(2), json!(null)]],
        );
        assert_eq!(
            block,
            "/*\n2 rows from orders table:\nid\tnote\n1\tfirst\n2\tNone\n*/"
        );
    }

    #[test]
    fn long_text_cells_are_shortened() {
        let long = "x".repeat(150);
        let block = render_sample("t", &["c".into()], &[vec![json!(long)]]);
        assert!(block.contains(&format!("{}...", "x".repeat(100))));
    }

    #[test]
    fn pool_errors_mean_unavailable() {
        assert!(matches!(
            classify(sqlx::Error::PoolTimedOut),
            DataSourceError::Unavailable(_)
        ));
        assert!(matches!(
            classify(sqlx::Error::RowNotFound),
            DataSourceError::Query(_)
        ));
    }
}
