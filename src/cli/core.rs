use std::{collections::HashMap, io};

use chrono::NaiveDate;
use thiserror::Error;

use crate::core::services::ServiceError;
use crate::errors::{CliError, DuebookError, LedgerError};
use crate::ledger::Money;

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("No business open. Use `business open <number|name>` first.")]
    BusinessNotOpen,
    #[error("No class selected. Use `class use <number>` first.")]
    ClassNotSelected,
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Core(#[from] DuebookError),
    #[error("exit requested")]
    ExitRequested,
}

impl From<ServiceError> for CommandError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Ledger(inner) => CommandError::Core(DuebookError::Ledger(inner)),
            ServiceError::NotFound(message) => CommandError::Message(message),
            ServiceError::Invalid(message) => CommandError::InvalidArguments(message),
        }
    }
}

impl From<LedgerError> for CommandError {
    fn from(err: LedgerError) -> Self {
        CommandError::Core(DuebookError::Ledger(err))
    }
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Core(inner) => CliError::Core(inner),
            CommandError::InvalidArguments(message) => CliError::Input(message),
            other => CliError::Command(other.to_string()),
        }
    }
}

impl From<rustyline::error::ReadlineError> for CliError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        CliError::Command(err.to_string())
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::Core(DuebookError::from(err))
    }
}

/// Positional arguments plus `--flag value` options. A flag followed by another
/// flag or by nothing is recorded as a switch.
#[derive(Debug, Default)]
pub struct ParsedArgs<'a> {
    positional: Vec<&'a str>,
    options: HashMap<String, Option<&'a str>>,
}

impl<'a> ParsedArgs<'a> {
    pub fn parse(args: &[&'a str]) -> Self {
        let mut parsed = ParsedArgs::default();
        let mut iter = args.iter().copied().peekable();
        while let Some(arg) = iter.next() {
            if let Some(name) = arg.strip_prefix("--").filter(|name| !name.is_empty()) {
                let value = match iter.peek() {
                    Some(next) if !next.starts_with("--") => iter.next(),
                    _ => None,
                };
                parsed.options.insert(name.to_ascii_lowercase(), value);
            } else {
                parsed.positional.push(arg);
            }
        }
        parsed
    }

    pub fn positional(&self, index: usize) -> Option<&'a str> {
        self.positional.get(index).copied()
    }

    pub fn require(&self, index: usize, usage: &str) -> Result<&'a str, CommandError> {
        self.positional(index)
            .ok_or_else(|| CommandError::InvalidArguments(format!("usage: {usage}")))
    }

    /// Positional arguments from `index` on, joined by spaces.
    pub fn rest(&self, index: usize) -> Option<String> {
        let rest = self.positional.get(index..)?;
        (!rest.is_empty()).then(|| rest.join(" "))
    }

    pub fn option(&self, name: &str) -> Option<&'a str> {
        self.options.get(name).copied().flatten()
    }

    pub fn switch(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }
}

pub fn parse_money(value: &str, field: &str) -> Result<Money, CommandError> {
    let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();
    cleaned
        .parse::<Money>()
        .map_err(|_| CommandError::InvalidArguments(format!("{field} must be a whole amount, got `{value}`")))
}

pub fn parse_count(value: &str, field: &str) -> Result<u32, CommandError> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| CommandError::InvalidArguments(format!("{field} must be a whole number, got `{value}`")))
}

pub fn parse_date(value: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| CommandError::InvalidArguments(format!("Invalid date `{value}` (use YYYY-MM-DD)")))
}

/// One-based list position to a zero-based index.
pub fn parse_index(value: &str, len: usize, what: &str) -> Result<usize, CommandError> {
    let position: usize = value
        .trim()
        .parse()
        .map_err(|_| CommandError::InvalidArguments(format!("{what} number expected, got `{value}`")))?;
    if position == 0 || position > len {
        return Err(CommandError::InvalidArguments(format!(
            "{what} {position} does not exist ({len} listed)"
        )));
    }
    Ok(position - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsed_args_split_flags_and_positionals() {
        let args = ["10", "500", "--total", "5500", "--even", "--batch", "Morning"];
        let parsed = ParsedArgs::parse(&args);
        assert_eq!(parsed.positional(0), Some("10"));
        assert_eq!(parsed.positional(1), Some("500"));
        assert_eq!(parsed.option("total"), Some("5500"));
        assert!(parsed.switch("even"));
        assert_eq!(parsed.option("even"), None);
        assert_eq!(parsed.option("batch"), Some("Morning"));
        assert!(parsed.positional(2).is_none());
    }

    #[test]
    fn rest_joins_trailing_words() {
        let args = ["1", "200", "Books", "and", "pens"];
        let parsed = ParsedArgs::parse(&args);
        assert_eq!(parsed.rest(2).as_deref(), Some("Books and pens"));
        assert_eq!(parsed.rest(5), None);
    }

    #[test]
    fn index_and_amount_parsing() {
        assert_eq!(parse_index("2", 3, "Class").unwrap(), 1);
        assert!(parse_index("0", 3, "Class").is_err());
        assert!(parse_index("4", 3, "Class").is_err());
        assert_eq!(parse_money("1,500", "Amount").unwrap(), 1500);
        assert!(parse_money("12.5", "Amount").is_err());
        assert!(parse_date("2024-02-30").is_err());
    }
}
