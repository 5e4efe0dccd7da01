/// Failures resolving a named connection into a live data source.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("no connection named '{0}'")]
    UnknownConnection(String),

    #[error("connection '{name}' is misconfigured: {reason}")]
    InvalidConnection { name: String, reason: String },

    #[error("could not connect to '{name}': {source}")]
    Connect {
        name: String,
        #[source]
        source: sqlx::Error,
    },
}
