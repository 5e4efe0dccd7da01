//! chatdb configuration system.
//!
//! TOML-based configuration with validation. All sections use sensible
//! defaults so partial configs work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! let config = chatdb_config::load_config(None).expect("failed to load config");
//! println!("{} connections", config.connections.len());
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{ChatDbConfig, CONFIG_SCHEMA_VERSION};

use std::path::Path;

use chatdb_common::ConfigError;

/// Load config from `path`, or from the platform default path when `None`.
///
/// The default path gets a commented template when missing; an explicit
/// path must exist.
pub fn load_config(path: Option<&Path>) -> Result<ChatDbConfig, ConfigError> {
    match path {
        Some(path) => toml_loader::load_from_path(path),
        None => toml_loader::load_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_schema_version_is_1() {
        assert_eq!(CONFIG_SCHEMA_VERSION, 1);
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = load_config(Some(Path::new("/tmp/chatdb_missing_config.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}
