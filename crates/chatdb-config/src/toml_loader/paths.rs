//! Where the config file lives and how the starter file is written.

use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chatdb_common::ConfigError;
use tracing::{debug, info};

use super::template::default_config_toml;

/// Environment variable that overrides the default config location.
pub const CONFIG_PATH_ENV: &str = "CHATDB_CONFIG";

/// `$CHATDB_CONFIG` when set, else `<config dir>/chatdb/config.toml`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    resolve_config_path(std::env::var_os(CONFIG_PATH_ENV), dirs::config_dir())
}

fn resolve_config_path(
    env_override: Option<OsString>,
    config_dir: Option<PathBuf>,
) -> Result<PathBuf, ConfigError> {
    if let Some(path) = env_override.filter(|p| !p.is_empty()) {
        debug!(env = CONFIG_PATH_ENV, "config path taken from environment");
        return Ok(PathBuf::from(path));
    }
    config_dir
        .map(|dir| dir.join("chatdb").join("config.toml"))
        .ok_or_else(|| {
            ConfigError::MissingSetting(format!(
                "no config directory on this platform; set {CONFIG_PATH_ENV}"
            ))
        })
}

/// Write the commented starter config to `path`. An existing file is left
/// untouched.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    let write_failed =
        |e: std::io::Error| ConfigError::ParseError(format!("cannot write {}: {e}", path.display()));

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_failed)?;
    }

    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => {
            file.write_all(default_config_toml().as_bytes())
                .map_err(write_failed)?;
            info!("created starter config at {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            debug!("config already exists at {}", path.display());
            Ok(())
        }
        Err(e) => Err(write_failed(e)),
    }
}
