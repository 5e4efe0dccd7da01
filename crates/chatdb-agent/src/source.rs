//! The data-source seam: anything that can run a read-only query and
//! describe its schema.

use async_trait::async_trait;

use crate::DataSourceError;

/// A queryable relational source, opened by the caller.
///
/// The agent only ever reads through this trait; implementations should
/// additionally refuse writes at the connection level where the engine
/// allows it.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// SQL dialect name used in the prompt, e.g. "SQLite".
    fn dialect(&self) -> &str;

    async fn execute_read_only_query(&self, sql: &str) -> Result<QueryRows, DataSourceError>;

    /// Table definitions (and optionally sample rows) as prompt text.
    async fn describe_schema(&self) -> Result<String, DataSourceError>;
}

/// Result set of one query. Cells are JSON values so every engine maps
/// into the same shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
    /// More rows existed than are held here.
    pub truncated: bool,
}

impl QueryRows {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<serde_json::Value>>) -> Self {
        Self {
            columns,
            rows,
            truncated: false,
        }
    }

    /// Keep at most `max_rows` rows, marking the set truncated if any were dropped.
    pub fn cap(&mut self, max_rows: usize) {
        if self.rows.len() > max_rows {
            self.rows.truncate(max_rows);
            self.truncated = true;
        }
    }

    /// Render as `Columns: ...` followed by a list of tuples, e.g. `[(42,)]`.
    pub fn render(&self) -> String {
        let tuples: Vec<String> = self
            .rows
            .iter()
            .map(|row| {
                let cells: Vec<String> = row.iter().map(render_cell).collect();
                if cells.len() == 1 {
                    format!("({},)", cells[0])
                } else {
                    format!("({})", cells.join(", "))
                }
            })
            .collect();

        let mut out = format!(
            "Columns: {}\n[{}]",
            self.columns.join(", "),
            tuples.join(", ")
        );
        if self.truncated {
            out.push_str(&format!(
                "\n(only the first {} rows are shown; more rows matched)",
                self.rows.len()
            ));
        }
        out
    }
}

fn render_cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "NULL".to_string(),
        serde_json::Value::String(s) => format!("'{}'", s.replace('\'', "\\'")),
        other => other.to_string(),
    }
}
