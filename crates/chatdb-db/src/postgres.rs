//! PostgreSQL adapter.

use std::time::Duration;

use async_trait::async_trait;
use chatdb_agent::{DataSource, DataSourceError, QueryRows};
use serde_json::{json, Value};
use sqlx::postgres::{PgConnectOptions, PgConnection, PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Executor, Postgres, Row, Statement, Transaction, TypeInfo, ValueRef};
use tracing::debug;

use crate::rows::{classify, collect_rows, quote_ident, render_sample, SourceLimits};

const CATALOG_SQL: &str = "\
    SELECT table_schema::text, table_name::text, column_name::text, data_type::text, is_nullable::text \
    FROM information_schema.columns \
    WHERE table_schema NOT IN ('pg_catalog', 'information_schema') \
    ORDER BY table_schema, table_name, ordinal_position";

/// A PostgreSQL database. Every statement runs in its own read-only
/// transaction, which is rolled back whether or not it succeeded.
pub struct PostgresSource {
    pool: PgPool,
    limits: SourceLimits,
}

impl PostgresSource {
    pub async fn connect(options: PgConnectOptions, limits: SourceLimits) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;
        Ok(Self { pool, limits })
    }

    async fn begin_read_only(&self) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        (&mut *tx).execute("SET TRANSACTION READ ONLY").await?;
        Ok(tx)
    }

    async fn fetch(&self, sql: &str, limit: usize) -> Result<QueryRows, sqlx::Error> {
        let mut tx = self.begin_read_only().await?;
        let result = fetch_in(&mut tx, sql, limit).await;
        let rolled_back = tx.rollback().await;
        let rows = result?;
        rolled_back?;
        Ok(rows)
    }

    /// `(schema, table, column, type, nullable)` for every user column.
    async fn catalog(&self) -> Result<Vec<[String; 5]>, sqlx::Error> {
        let mut tx = self.begin_read_only().await?;
        let rows = sqlx::query(CATALOG_SQL).fetch_all(&mut *tx).await;
        let rolled_back = tx.rollback().await;
        let rows = rows?;
        rolled_back?;

        rows.iter()
            .map(|row| -> Result<[String; 5], sqlx::Error> {
                Ok([
                    row.try_get(0)?,
                    row.try_get(1)?,
                    row.try_get(2)?,
                    row.try_get(3)?,
                    row.try_get(4)?,
                ])
            })
            .collect()
    }
}

async fn fetch_in(conn: &mut PgConnection, sql: &str, limit: usize) -> Result<QueryRows, sqlx::Error> {
    let statement = (&mut *conn).prepare(sql).await?;
    let columns: Vec<String> = statement
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();

    let stream = statement.query().fetch(&mut *conn);
    let (rows, truncated) = collect_rows(stream, limit, decode_row).await?;
    Ok(QueryRows {
        columns,
        rows,
        truncated,
    })
}

#[async_trait]
impl DataSource for PostgresSource {
    fn dialect(&self) -> &str {
        "PostgreSQL"
    }

    async fn execute_read_only_query(&self, sql: &str) -> Result<QueryRows, DataSourceError> {
        self.fetch(sql, self.limits.row_limit).await.map_err(classify)
    }

    async fn describe_schema(&self) -> Result<String, DataSourceError> {
        let catalog = self.catalog().await.map_err(classify)?;
        let tables = group_tables(catalog);
        debug!(tables = tables.len(), "Read PostgreSQL catalog");

        let mut sections = Vec::with_capacity(tables.len());
        for table in &tables {
            let mut section = table.create_statement();
            if self.limits.sample_rows > 0 {
                let sample_sql = format!(
                    "SELECT * FROM {}.{} LIMIT {}",
                    quote_ident(&table.schema),
                    quote_ident(&table.name),
                    self.limits.sample_rows
                );
                let sample = self
                    .fetch(&sample_sql, self.limits.sample_rows)
                    .await
                    .map_err(classify)?;
                section.push_str("\n\n");
                section.push_str(&render_sample(
                    &table.display_name(),
                    &sample.columns,
                    &sample.rows,
                ));
            }
            sections.push(section);
        }

        Ok(sections.join("\n\n"))
    }
}

struct TableInfo {
    schema: String,
    name: String,
    /// `name type [NOT NULL]` per column, in ordinal order.
    columns: Vec<String>,
}

impl TableInfo {
    fn display_name(&self) -> String {
        if self.schema == "public" {
            self.name.clone()
        } else {
            format!("{}.{}", self.schema, self.name)
        }
    }

    fn create_statement(&self) -> String {
        format!(
            "CREATE TABLE {} (\n\t{}\n)",
            self.display_name(),
            self.columns.join(",\n\t")
        )
    }
}

/// Fold catalog rows (already ordered by schema and table) into tables.
fn group_tables(catalog: Vec<[String; 5]>) -> Vec<TableInfo> {
    let mut tables: Vec<TableInfo> = Vec::new();
    for [schema, table, column, data_type, nullable] in catalog {
        let definition = if nullable == "NO" {
            format!("{column} {data_type} NOT NULL")
        } else {
            format!("{column} {data_type}")
        };
        match tables.last_mut() {
            Some(last) if last.schema == schema && last.name == table => {
                last.columns.push(definition)
            }
            _ => tables.push(TableInfo {
                schema,
                name: table,
                columns: vec![definition],
            }),
        }
    }
    tables
}

fn decode_row(row: &PgRow) -> Result<Vec<Value>, sqlx::Error> {
    (0..row.len()).map(|i| decode_cell(row, i)).collect()
}

/// Types without a plain Rust mapping come back as a hint to cast them.
fn decode_cell(row: &PgRow, i: usize) -> Result<Value, sqlx::Error> {
    let raw = row.try_get_raw(i)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_string();

    Ok(match type_name.as_str() {
        "INT2" => json!(row.try_get::<i16, _>(i)?),
        "INT4" => json!(row.try_get::<i32, _>(i)?),
        "INT8" => json!(row.try_get::<i64, _>(i)?),
        "FLOAT4" => json!(row.try_get::<f32, _>(i)?),
        "FLOAT8" => json!(row.try_get::<f64, _>(i)?),
        "BOOL" => json!(row.try_get::<bool, _>(i)?),
        "TEXT" | "VARCHAR" | "CHAR" | "NAME" | "CITEXT" | "UNKNOWN" => {
            json!(row.try_get::<String, _>(i)?)
        }
        "BYTEA" => json!(format!("<{} bytes>", row.try_get::<Vec<u8>, _>(i)?.len())),
        other => json!(format!(
            "<{} value; cast it to text to read it>",
            other.to_ascii_lowercase()
        )),
    })
}
