//! Validation for `[[connections]]`: unique names and per-kind required fields.

use std::collections::HashSet;

use crate::schema::{ChatDbConfig, ConnectionKind};

use super::helpers::require;

pub(crate) fn validate_connections(errors: &mut Vec<String>, config: &ChatDbConfig) {
    let mut seen = HashSet::new();

    for conn in &config.connections {
        if conn.name.trim().is_empty() {
            errors.push("connections: name is required".into());
            continue;
        }
        if !seen.insert(conn.name.as_str()) {
            errors.push(format!("connections: duplicate name '{}'", conn.name));
        }

        let prefix = format!("connections.{}", conn.name);
        match conn.kind {
            ConnectionKind::Sqlite => {
                require(errors, &format!("{prefix}.path"), conn.path.as_deref());
            }
            ConnectionKind::Postgresql => {
                require(errors, &format!("{prefix}.host"), conn.host.as_deref());
                require(errors, &format!("{prefix}.user"), conn.user.as_deref());
                require(errors, &format!("{prefix}.database"), conn.database.as_deref());
                if conn.password.is_none() && conn.password_env.is_none() {
                    errors.push(format!("{prefix}: password or password_env is required"));
                }
            }
        }
    }
}
