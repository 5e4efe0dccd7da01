//! SQLite adapter.

use std::path::Path;

use async_trait::async_trait;
use chatdb_agent::{DataSource, DataSourceError, QueryRows};
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Executor, Row, Statement, TypeInfo, ValueRef};
use tracing::debug;

use crate::rows::{classify, collect_rows, quote_ident, render_sample, SourceLimits};

/// A SQLite database file opened read-only.
pub struct SqliteSource {
    pool: SqlitePool,
    limits: SourceLimits,
}

impl SqliteSource {
    /// Open an existing database file. The file is never created or written.
    pub async fn open(path: impl AsRef<Path>, limits: SourceLimits) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .read_only(true)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await?;

        debug!(path = %path.as_ref().display(), "Opened SQLite database read-only");
        Ok(Self { pool, limits })
    }

    async fn fetch(&self, sql: &str, limit: usize) -> Result<QueryRows, sqlx::Error> {
        let statement = (&self.pool).prepare(sql).await?;
        let columns: Vec<String> = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let stream = statement.query().fetch(&self.pool);
        let (rows, truncated) = collect_rows(stream, limit, decode_row).await?;
        Ok(QueryRows {
            columns,
            rows,
            truncated,
        })
    }

    async fn table_definitions(&self) -> Result<Vec<(String, String)>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT name, sql FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' AND sql IS NOT NULL \
             ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<(String, String), sqlx::Error> {
                Ok((row.try_get("name")?, row.try_get("sql")?))
            })
            .collect()
    }
}

#[async_trait]
impl DataSource for SqliteSource {
    fn dialect(&self) -> &str {
        "SQLite"
    }

    async fn execute_read_only_query(&self, sql: &str) -> Result<QueryRows, DataSourceError> {
        self.fetch(sql, self.limits.row_limit).await.map_err(classify)
    }

    async fn describe_schema(&self) -> Result<String, DataSourceError> {
        let tables = self.table_definitions().await.map_err(classify)?;
        let mut sections = Vec::with_capacity(tables.len());

        for (name, create) in tables {
            let mut section = create.trim().to_string();
            if self.limits.sample_rows > 0 {
                let sample_sql = format!(
                    "SELECT * FROM {} LIMIT {}",
                    quote_ident(&name),
                    self.limits.sample_rows
                );
                let sample = self
                    .fetch(&sample_sql, self.limits.sample_rows)
                    .await
                    .map_err(classify)?;
                section.push_str("\n\n");
                section.push_str(&render_sample(&name, &sample.columns, &sample.rows));
            }
            sections.push(section);
        }

        Ok(sections.join("\n\n"))
    }
}

/// Decode by the storage class of each value, not the declared column type.
fn decode_row(row: &SqliteRow) -> Result<Vec<Value>, sqlx::Error> {
    (0..row.len()).map(|i| decode_cell(row, i)).collect()
}

fn decode_cell(row: &SqliteRow, i: usize) -> Result<Value, sqlx::Error> {
    let raw = row.try_get_raw(i)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let storage = raw.type_info().name().to_ascii_uppercase();

    Ok(match storage.as_str() {
        "INTEGER" => json!(row.try_get::<i64, _>(i)?),
        "REAL" => json!(row.try_get::<f64, _>(i)?),
        "BLOB" => json!(format!("<{} bytes>", row.try_get::<Vec<u8>, _>(i)?.len())),
        _ => json!(row.try_get::<String, _>(i)?),
    })
}
