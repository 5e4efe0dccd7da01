//! Named connections from the config file.

use std::path::PathBuf;

use chatdb_agent::DataSource;
use chatdb_config::schema::{ChatDbConfig, ConnectionConfig, ConnectionKind};
use sqlx::postgres::PgConnectOptions;
use tracing::info;

use crate::error::DbError;
use crate::postgres::PostgresSource;
use crate::rows::SourceLimits;
use crate::sqlite::SqliteSource;

const DEFAULT_PG_PORT: u16 = 5432;

/// Resolves connection names into open, read-only data sources.
pub struct ConnectionRegistry {
    connections: Vec<ConnectionConfig>,
    limits: SourceLimits,
}

impl ConnectionRegistry {
    pub fn new(connections: Vec<ConnectionConfig>, limits: SourceLimits) -> Self {
        Self {
            connections,
            limits,
        }
    }

    pub fn from_config(config: &ChatDbConfig) -> Self {
        let limits = SourceLimits {
            row_limit: config.agent.max_rows as usize,
            sample_rows: config.agent.sample_rows as usize,
        };
        Self::new(config.connections.clone(), limits)
    }

    /// Registered connections in config order.
    pub fn list(&self) -> &[ConnectionConfig] {
        &self.connections
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn get(&self, name: &str) -> Result<&ConnectionConfig, DbError> {
        self.connections
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| DbError::UnknownConnection(name.to_string()))
    }

    /// Open the named connection.
    pub async fn resolve(&self, name: &str) -> Result<Box<dyn DataSource>, DbError> {
        let conn = self.get(name)?;
        info!(connection = %conn.name, kind = %conn.kind, "Opening connection");

        let connect_err = |source| DbError::Connect {
            name: conn.name.clone(),
            source,
        };

        match conn.kind {
            ConnectionKind::Sqlite => {
                let path = sqlite_path(conn)?;
                let source = SqliteSource::open(&path, self.limits)
                    .await
                    .map_err(connect_err)?;
                Ok(Box::new(source))
            }
            ConnectionKind::Postgresql => {
                let options = pg_options(conn)?;
                let source = PostgresSource::connect(options, self.limits)
                    .await
                    .map_err(connect_err)?;
                Ok(Box::new(source))
            }
        }
    }
}

fn required<'a>(conn: &ConnectionConfig, value: Option<&'a str>, field: &str) -> Result<&'a str, DbError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| DbError::InvalidConnection {
            name: conn.name.clone(),
            reason: format!("missing '{field}'"),
        })
}

/// The configured path, with a leading `~/` expanded to the home directory.
fn sqlite_path(conn: &ConnectionConfig) -> Result<PathBuf, DbError> {
    let raw = required(conn, conn.path.as_deref(), "path")?;
    match (raw.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => Ok(home.join(rest)),
        _ => Ok(PathBuf::from(raw)),
    }
}

fn pg_options(conn: &ConnectionConfig) -> Result<PgConnectOptions, DbError> {
    let host = required(conn, conn.host.as_deref(), "host")?;
    let user = required(conn, conn.user.as_deref(), "user")?;
    let database = required(conn, conn.database.as_deref(), "database")?;

    let mut options = PgConnectOptions::new()
        .host(host)
        .port(conn.port.unwrap_or(DEFAULT_PG_PORT))
        .username(user)
        .database(database);

    match conn.resolved_password() {
        Some(password) => options = options.password(&password),
        None if conn.password_env.is_some() => {
            return Err(DbError::InvalidConnection {
                name: conn.name.clone(),
                reason: format!(
                    "environment variable {} is not set",
                    conn.password_env.as_deref().unwrap_or_default()
                ),
            });
        }
        None => {}
    }
    Ok(options)
}
