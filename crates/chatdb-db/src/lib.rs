//! Read-only database adapters and the named connection registry.
//!
//! Each adapter implements [`chatdb_agent::DataSource`] on top of a small
//! sqlx pool:
//! - [`SqliteSource`] opens the file in read-only mode.
//! - [`PostgresSource`] runs every statement inside a `READ ONLY`
//!   transaction that is rolled back afterwards.

mod error;
mod postgres;
mod registry;
mod rows;
mod sqlite;

pub use error::DbError;
pub use postgres::PostgresSource;
pub use registry::ConnectionRegistry;
pub use rows::SourceLimits;
pub use sqlite::SqliteSource;
