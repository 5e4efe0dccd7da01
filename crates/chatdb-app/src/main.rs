mod cli;
mod llm;
mod repl;

use std::process::ExitCode;
use std::time::Duration;

use chatdb_agent::{AgentSettings, QueryAgent};
use chatdb_common::{ChatDbError, ConfigError};
use chatdb_config::schema::{ChatDbConfig, LogLevel};
use chatdb_db::ConnectionRegistry;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use crate::repl::Repl;

/// Crates whose logs a bare `--log-level` applies to. The binary itself
/// logs under `chatdb`.
const LOG_TARGETS: &[&str] = &[
    "chatdb",
    "chatdb_agent",
    "chatdb_ai",
    "chatdb_config",
    "chatdb_db",
];

/// Load environment variables from a .env file (KEY=VALUE lines).
/// Variables already set in the environment win.
fn load_dotenv() {
    let manifest_dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let candidates = [
        std::path::PathBuf::from(".env"),
        // Workspace root, two levels up from crates/chatdb-app/
        manifest_dir.join("..").join("..").join(".env"),
    ];

    for path in &candidates {
        if let Ok(contents) = std::fs::read_to_string(path) {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                let line = line.strip_prefix("export ").unwrap_or(line);
                if let Some((key, value)) = line.split_once('=') {
                    let key = key.trim();
                    let value = value.trim().trim_matches('"').trim_matches('\'');
                    if std::env::var(key).is_err() {
                        std::env::set_var(key, value);
                    }
                }
            }
            return;
        }
    }
}

/// A bare level becomes one directive per workspace crate; anything with
/// `=` or `,` is taken as a filter directive already.
fn filter_directives(level_or_directive: &str) -> String {
    let value = level_or_directive.trim();
    if value.contains('=') || value.contains(',') {
        return value.to_string();
    }
    LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={value}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// `RUST_LOG` wins, then `--log-level`, then `[logging] level`.
fn init_logging(cli_level: Option<&str>, config_level: LogLevel) {
    let directives = filter_directives(cli_level.unwrap_or(config_level.filter_level()));
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&directives))
        .unwrap_or_else(|_| EnvFilter::new(filter_directives("info")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    // Before the runtime starts any threads.
    load_dotenv();

    let args = cli::parse();

    let config = match chatdb_config::load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("chatdb: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(args.log_level.as_deref(), config.logging.level);
    tracing::info!("chatdb v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Err(e) = chatdb_config::validation::validate(&config) {
        tracing::warn!("{e}");
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("chatdb: failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(args, config)) {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("chatdb: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: cli::Args, config: ChatDbConfig) -> chatdb_common::Result<()> {
    let client = llm::build_client(&config).map_err(|e| ChatDbError::Ai(e.to_string()))?;

    let registry = ConnectionRegistry::from_config(&config);
    let start = args
        .connection
        .clone()
        .or_else(|| registry.list().first().map(|c| c.name.clone()))
        .ok_or_else(|| {
            ConfigError::MissingSetting(
                "no database connections; add a [[connections]] entry to the config".into(),
            )
        })?;

    let agent = QueryAgent::new(client).with_settings(AgentSettings {
        max_rows: config.agent.max_rows as usize,
        query_timeout: Duration::from_secs(u64::from(config.agent.query_timeout_secs)),
    });
    let budget = args.budget.unwrap_or(config.agent.tool_call_budget);
    tracing::info!(budget, connection = %start, "Starting chat");

    let mut repl = Repl::new(agent, registry, budget, &config.app.icon, std::io::stdout());
    repl.connect(&start)
        .await
        .map_err(|e| ChatDbError::Database(e.to_string()))?;
    repl.greet(&config.app.name)?;
    repl.run(BufReader::new(tokio::io::stdin())).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_level_expands_per_crate() {
        let directives = filter_directives("debug");
        assert!(directives.contains("chatdb_agent=debug"));
        assert!(directives.contains("chatdb_db=debug"));
        assert_eq!(directives.split(',').count(), LOG_TARGETS.len());
    }

    #[test]
    fn full_directive_passes_through() {
        assert_eq!(
            filter_directives("chatdb_agent=trace,sqlx=warn"),
            "chatdb_agent=trace,sqlx=warn"
        );
    }

    #[test]
    fn expanded_directives_parse() {
        assert!(EnvFilter::try_new(filter_directives("warn")).is_ok());
    }
}
