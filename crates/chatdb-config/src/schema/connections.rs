//! Named database connections (`[[connections]]`).

use serde::{Deserialize, Serialize};

/// Database engine of a connection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    Sqlite,
    Postgresql,
}

impl std::fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionKind::Sqlite => write!(f, "sqlite"),
            ConnectionKind::Postgresql => write!(f, "postgresql"),
        }
    }
}

/// One registered connection.
///
/// SQLite uses `path`; PostgreSQL uses the network fields. The password may
/// be given inline or through the environment variable named by
/// `password_env`.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub name: String,
    pub kind: ConnectionKind,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password_env: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
}

impl ConnectionConfig {
    pub fn sqlite(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ConnectionKind::Sqlite,
            path: Some(path.into()),
            host: None,
            port: None,
            user: None,
            password: None,
            password_env: None,
            database: None,
        }
    }

    /// Where the connection points, without credentials.
    pub fn target(&self) -> String {
        match self.kind {
            ConnectionKind::Sqlite => self.path.clone().unwrap_or_default(),
            ConnectionKind::Postgresql => format!(
                "{}@{}:{}/{}",
                self.user.as_deref().unwrap_or(""),
                self.host.as_deref().unwrap_or(""),
                self.port.unwrap_or(5432),
                self.database.as_deref().unwrap_or("")
            ),
        }
    }

    /// Inline password, else the value of `password_env`.
    pub fn resolved_password(&self) -> Option<String> {
        if let Some(ref password) = self.password {
            return Some(password.clone());
        }
        self.password_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("path", &self.path)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("password_env", &self.password_env)
            .field("database", &self.database)
            .finish()
    }
}
