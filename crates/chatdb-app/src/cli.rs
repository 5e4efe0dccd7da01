use std::path::PathBuf;

use clap::Parser;

/// chatdb: ask questions about a database in plain language.
#[derive(Parser, Debug)]
#[command(name = "chatdb", version, about)]
pub struct Args {
    /// Config file path; defaults to `$CHATDB_CONFIG`, then the platform config dir.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (debug, info, warn, error) or a full tracing filter directive.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Connection to start with; defaults to the first configured one.
    #[arg(short = 'c', long)]
    pub connection: Option<String>,

    /// SQL queries allowed per question; overrides `agent.tool_call_budget`.
    #[arg(short = 'b', long)]
    pub budget: Option<u32>,
}

pub fn parse() -> Args {
    Args::parse()
}
