//! Interactive chat loop.

use std::io::{self, Write};

use chatdb_agent::{DataSource, QueryAgent, Session, TurnRole};
use chatdb_db::{ConnectionRegistry, DbError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};

const HELP: &str = "\
Commands:
  /new              start a new chat
  /use <name>       switch to another connection (starts a new chat)
  /connections      list configured connections
  /history          show this chat so far
  /usage            show token usage
  /help             show this help
  /quit             exit
Anything else is a question about the current database.";

/// One line of user input.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Command<'a> {
    Empty,
    Ask(&'a str),
    New,
    Use(&'a str),
    Connections,
    History,
    Usage,
    Help,
    Quit,
    Unknown(&'a str),
}

pub(crate) fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Ask(line);
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    match name {
        "new" | "reset" => Command::New,
        "use" if !arg.is_empty() => Command::Use(arg),
        "connections" | "list" => Command::Connections,
        "history" => Command::History,
        "usage" => Command::Usage,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ => Command::Unknown(line),
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Chat state for one terminal session.
pub struct Repl<W: Write> {
    agent: QueryAgent,
    registry: ConnectionRegistry,
    session: Session,
    source: Option<Box<dyn DataSource>>,
    budget: u32,
    icon: String,
    out: W,
}

impl<W: Write> Repl<W> {
    pub fn new(
        agent: QueryAgent,
        registry: ConnectionRegistry,
        budget: u32,
        icon: impl Into<String>,
        out: W,
    ) -> Self {
        Self {
            agent,
            registry,
            session: Session::new(),
            source: None,
            budget,
            icon: icon.into(),
            out,
        }
    }

    /// Open `name` and make it the current data source. On failure the
    /// previous connection stays active.
    pub async fn connect(&mut self, name: &str) -> Result<(), DbError> {
        let source = self.registry.resolve(name).await?;
        self.source = Some(source);
        self.session.select_data_source(name);
        Ok(())
    }

    pub fn greet(&mut self, app_name: &str) -> io::Result<()> {
        let current = self.session.data_source().unwrap_or_default();
        writeln!(
            self.out,
            "{} {app_name}: connected to '{current}' via {}. Type /help for commands.",
            self.icon,
            self.agent.provider()
        )
    }

    /// Read lines from `input` until EOF or `/quit`.
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, input: R) -> io::Result<()> {
        let mut lines = input.lines();
        self.prompt()?;
        while let Some(line) = lines.next_line().await? {
            if self.handle(&line).await? == Flow::Quit {
                return Ok(());
            }
            self.prompt()?;
        }
        writeln!(self.out)
    }

    fn prompt(&mut self) -> io::Result<()> {
        write!(self.out, "> ")?;
        self.out.flush()
    }

    pub async fn handle(&mut self, line: &str) -> io::Result<Flow> {
        match parse_command(line) {
            Command::Empty => {}
            Command::Ask(question) => self.ask(question).await?,
            Command::New => {
                self.session.reset();
                writeln!(self.out, "Started a new chat.")?;
            }
            Command::Use(name) => match self.connect(name).await {
                Ok(()) => writeln!(self.out, "Now using '{name}'. Started a new chat.")?,
                Err(e) => {
                    warn!(connection = name, error = %e, "Could not switch connection");
                    writeln!(self.out, "Could not switch: {e}")?;
                }
            },
            Command::Connections => self.list_connections()?,
            Command::History => self.history()?,
            Command::Usage => {
                let report = self.agent.usage();
                writeln!(
                    self.out,
                    "{} questions, {} model calls, {} input and {} output tokens",
                    report.questions,
                    report.model_calls,
                    report.total.input_tokens,
                    report.total.output_tokens
                )?;
                if report.questions > 0 {
                    writeln!(
                        self.out,
                        "last question: {} tokens; average {} per question",
                        report.last_question.total_tokens(),
                        report.tokens_per_question()
                    )?;
                }
            }
            Command::Help => writeln!(self.out, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
            Command::Unknown(input) => {
                writeln!(self.out, "Unknown command: {input}. Type /help for commands.")?
            }
        }
        Ok(Flow::Continue)
    }

    async fn ask(&mut self, question: &str) -> io::Result<()> {
        let Some(source) = self.source.as_deref() else {
            return writeln!(
                self.out,
                "No connection selected. Use /use <name>; /connections lists them."
            );
        };

        match self
            .session
            .ask(&self.agent, source, question, self.budget)
            .await
        {
            Ok(result) => {
                info!(used = result.tool_calls_used, "Turn complete");
                writeln!(self.out, "{} {}", self.icon, result.text)
            }
            Err(e) => writeln!(self.out, "Error: {e}"),
        }
    }

    fn list_connections(&mut self) -> io::Result<()> {
        let current = self.session.data_source();
        if self.registry.is_empty() {
            return writeln!(self.out, "No connections configured.");
        }
        for conn in self.registry.list() {
            let marker = if current.as_deref() == Some(conn.name.as_str()) {
                "*"
            } else {
                " "
            };
            writeln!(
                self.out,
                "{marker} {} ({}: {})",
                conn.name,
                conn.kind,
                conn.target()
            )?;
        }
        Ok(())
    }

    fn history(&mut self) -> io::Result<()> {
        let transcript = self.session.snapshot();
        if transcript.is_empty() {
            return writeln!(self.out, "No messages yet.");
        }
        for turn in &transcript {
            let time = turn
                .timestamp()
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_default();
            let who = match turn.role() {
                TurnRole::User => "you",
                TurnRole::Assistant => self.icon.as_str(),
            };
            writeln!(self.out, "[{time}] {who}: {}", turn.text())?;
        }
        Ok(())
    }
}
