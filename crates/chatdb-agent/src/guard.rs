//! Pre-execution statement guard.
//!
//! Every statement the model proposes passes through [`validate_statement`]
//! before it reaches a data source. Only a single retrieval statement is
//! accepted; anything that could change schema, data or session state is
//! rejected. Comments, string literals and quoted identifiers are blanked
//! out first so keywords inside them neither trigger nor hide a rejection.
//! PostgreSQL and SQLite quote differently, so the text is read once per
//! engine and has to pass both times.

use std::sync::LazyLock;

use regex::Regex;

/// Keywords a statement may start with.
const ALLOWED_LEADING: &[&str] = &["SELECT", "WITH", "EXPLAIN", "VALUES", "SHOW", "TABLE"];

/// Keywords that must not appear anywhere in the statement.
const BLOCKED_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "MERGE", "UPSERT", "DROP", "CREATE", "ALTER", "TRUNCATE",
    "RENAME", "GRANT", "REVOKE", "ATTACH", "DETACH", "VACUUM", "REINDEX", "COPY", "CALL", "EXEC",
    "EXECUTE", "PRAGMA", "INTO",
];

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_$]*").unwrap());

/// Why a statement was refused. The display text is fed back to the model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatementRejected {
    #[error("the statement is empty")]
    Empty,

    #[error("unterminated {0}")]
    Unterminated(&'static str),

    #[error("only one statement may be executed at a time")]
    MultipleStatements,

    #[error("statements starting with {0} are not read-only queries")]
    NotRetrieval(String),

    #[error("the keyword {0} is not allowed in a read-only query")]
    BlockedKeyword(String),

    #[error("a dollar quote directly after a number is ambiguous; add a space before it")]
    AmbiguousDollarQuote,
}

/// How quotes and comments are recognised. The same text can split into
/// different tokens depending on the engine, so a statement must pass
/// under every reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lexing {
    /// Dollar quotes, `E'...'` backslash escapes, nested block comments.
    Postgres,
    /// `[...]` identifiers; `$` is only ever part of a name.
    Sqlite,
}

const LEXINGS: [Lexing; 2] = [Lexing::Postgres, Lexing::Sqlite];

/// Accept `sql` only if it is a single read-only retrieval statement.
pub fn validate_statement(sql: &str) -> Result<(), StatementRejected> {
    for lexing in LEXINGS {
        check_stripped(&strip_literals_and_comments(sql, lexing)?)?;
    }
    Ok(())
}

fn check_stripped(stripped: &str) -> Result<(), StatementRejected> {
    let body = stripped.trim().trim_end_matches(|c: char| c == ';' || c.is_whitespace());

    if body.is_empty() {
        return Err(StatementRejected::Empty);
    }
    if body.contains(';') {
        return Err(StatementRejected::MultipleStatements);
    }

    let mut words = WORD_RE.find_iter(body);
    let leading = words
        .next()
        .map(|m| m.as_str().to_ascii_uppercase())
        .ok_or(StatementRejected::Empty)?;
    if !ALLOWED_LEADING.contains(&leading.as_str()) {
        return Err(StatementRejected::NotRetrieval(leading));
    }

    for word in WORD_RE.find_iter(body) {
        let upper = word.as_str().to_ascii_uppercase();
        if BLOCKED_KEYWORDS.contains(&upper.as_str()) {
            return Err(StatementRejected::BlockedKeyword(upper));
        }
        // REPLACE(...) is a string function; bare REPLACE is the SQLite insert form.
        if upper == "REPLACE" && !body[word.end()..].trim_start().starts_with('(') {
            return Err(StatementRejected::BlockedKeyword(upper));
        }
    }

    Ok(())
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Replace comments, string literals, quoted identifiers and dollar-quoted
/// bodies with a single space each.
fn strip_literals_and_comments(sql: &str, lexing: Lexing) -> Result<String, StatementRejected> {
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len());
    let mut i = 0;
    // First char and length of the name or number being scanned.
    let mut run_start: Option<char> = None;
    let mut run_len = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        let before = i.checked_sub(1).map(|p| chars[p]);

        let skipped_to = match (c, next) {
            ('-', Some('-')) => {
                let mut end = i;
                while end < chars.len() && chars[end] != '\n' {
                    end += 1;
                }
                Some(end)
            }
            ('/', Some('*')) => Some(skip_block_comment(&chars, i, lexing == Lexing::Postgres)?),
            ('\'', _) => {
                // E'...' unless the E is the tail of a name. After a number
                // the E is a prefix too.
                let in_name = run_start.is_some_and(|first| first.is_alphabetic() || first == '_')
                    && run_len > 1;
                let escaped =
                    lexing == Lexing::Postgres && matches!(before, Some('e' | 'E')) && !in_name;
                Some(if escaped {
                    skip_escape_string(&chars, i)?
                } else {
                    skip_quoted(&chars, i, '\'', '\'')?
                })
            }
            ('"', _) | ('`', _) => Some(skip_quoted(&chars, i, c, c)?),
            ('[', _) if lexing == Lexing::Sqlite => Some(skip_quoted(&chars, i, '[', ']')?),
            ('$', _) if lexing == Lexing::Postgres => match run_start {
                // Inside a name, `$` is just another identifier char.
                Some(first) if first.is_alphabetic() || first == '_' => None,
                // After a number the tokenisation differs between server versions.
                Some(first) if first.is_numeric() && dollar_tag(&chars, i).is_some() => {
                    return Err(StatementRejected::AmbiguousDollarQuote);
                }
                _ => match dollar_tag(&chars, i) {
                    Some(tag) => Some(skip_dollar_quoted(&chars, i, &tag)?),
                    None => None,
                },
            },
            _ => None,
        };

        match skipped_to {
            Some(end) => {
                out.push(' ');
                i = end;
                run_start = None;
                run_len = 0;
            }
            None => {
                out.push(c);
                i += 1;
                if !is_ident_char(c) {
                    run_start = None;
                    run_len = 0;
                } else {
                    run_start = run_start.or(Some(c));
                    run_len += 1;
                }
            }
        }
    }

    Ok(out)
}

/// Skip a `/* ... */` comment starting at `start`. PostgreSQL nests them.
fn skip_block_comment(chars: &[char], start: usize, nested: bool) -> Result<usize, StatementRejected> {
    let mut depth = 1;
    let mut i = start + 2;
    while i + 1 < chars.len() {
        match (chars[i], chars[i + 1]) {
            ('*', '/') => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    return Ok(i);
                }
            }
            ('/', '*') if nested => {
                depth += 1;
                i += 2;
            }
            _ => i += 1,
        }
    }
    Err(StatementRejected::Unterminated("block comment"))
}

/// Skip a run opened by `open` at `start` and closed by `close`; a doubled
/// closer is an escape. Returns the index just past the closer.
fn skip_quoted(
    chars: &[char],
    start: usize,
    open: char,
    close: char,
) -> Result<usize, StatementRejected> {
    let mut i = start + 1;
    while i < chars.len() {
        if chars[i] == close {
            if open != '[' && chars.get(i + 1) == Some(&close) {
                i += 2;
                continue;
            }
            return Ok(i + 1);
        }
        i += 1;
    }
    Err(StatementRejected::Unterminated(if open == '\'' {
        "string literal"
    } else {
        "quoted identifier"
    }))
}

/// Skip a PostgreSQL `E'...'` body, where a backslash escapes the next char.
fn skip_escape_string(chars: &[char], start: usize) -> Result<usize, StatementRejected> {
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            '\'' if chars.get(i + 1) == Some(&'\'') => i += 2,
            '\'' => return Ok(i + 1),
            _ => i += 1,
        }
    }
    Err(StatementRejected::Unterminated("string literal"))
}

/// A PostgreSQL dollar-quote opener (`$$` or `$tag$`) at `start`, if any.
/// `$1` style parameters are not openers.
fn dollar_tag(chars: &[char], start: usize) -> Option<String> {
    let mut i = start + 1;
    if chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
        return None;
    }
    while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
        i += 1;
    }
    if chars.get(i) == Some(&'$') {
        Some(chars[start..=i].iter().collect())
    } else {
        None
    }
}

fn skip_dollar_quoted(chars: &[char], start: usize, tag: &str) -> Result<usize, StatementRejected> {
    let tag: Vec<char> = tag.chars().collect();
    let mut i = start + tag.len();
    while i + tag.len() <= chars.len() {
        if chars[i..i + tag.len()] == tag[..] {
            return Ok(i + tag.len());
        }
        i += 1;
    }
    Err(StatementRejected::Unterminated("dollar-quoted string"))
}
