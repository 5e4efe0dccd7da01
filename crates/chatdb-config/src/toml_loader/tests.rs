//! Tests for TOML config loading, creation, and path resolution.

use super::*;
use std::path::Path;

#[test]
fn load_from_nonexistent_returns_file_not_found() {
    let result = load_from_path(Path::new("/tmp/nonexistent_chatdb_config.toml"));
    assert!(matches!(
        result.unwrap_err(),
        chatdb_common::ConfigError::FileNotFound(_)
    ));
}

#[test]
fn load_valid_partial_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[llm]
provider = "local"

[local]
base_url = "http://127.0.0.1:8080/v1"

[[connections]]
name = "chinook"
kind = "sqlite"
path = "/tmp/chinook.db"
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.local.base_url, "http://127.0.0.1:8080/v1");
    assert_eq!(config.connections.len(), 1);
    assert_eq!(config.connections[0].name, "chinook");
    // Defaults preserved
    assert_eq!(config.agent.max_rows, 5);
    assert_eq!(config.app.name, "Chat with DB");
}

#[test]
fn load_invalid_toml_returns_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "this is not valid toml {{{").unwrap();

    let err = load_from_path(&path).unwrap_err();
    assert!(matches!(err, chatdb_common::ConfigError::ParseError(_)));
}

#[test]
fn connection_without_kind_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[[connections]]\nname = \"x\"\n").unwrap();

    let err = load_from_path(&path).unwrap_err();
    assert!(matches!(err, chatdb_common::ConfigError::ParseError(_)));
}

#[test]
fn invalid_values_are_kept_with_warning() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[agent]\nmax_rows = 0\n").unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.agent.max_rows, 0);
}

#[test]
fn create_and_load_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chatdb").join("config.toml");

    create_default_config(&path).unwrap();
    assert!(path.exists());

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.agent.tool_call_budget, 10);
    assert!(config.connections.is_empty());
}

#[test]
fn default_config_toml_is_valid() {
    use super::template::default_config_toml;
    use crate::schema::ChatDbConfig;

    let config: ChatDbConfig = toml::from_str(&default_config_toml()).unwrap();
    assert_eq!(config.app.name, "Chat with DB");
    assert!(crate::validation::validate(&config).is_ok());
}

#[test]
fn default_config_path_is_reasonable() {
    if let Ok(path) = default_config_path() {
        let path_str = path.to_string_lossy();
        assert!(path_str.contains("chatdb"));
        assert!(path_str.ends_with("config.toml"));
    }
}
