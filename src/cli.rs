//! Command-line surface: argument parsing, the usage string, and printing of
//! resolved configuration values.

use std::fmt;
use std::io::Write;

use crate::{
    bail,
    config::{ConfigKey, InterpreterConfig},
    errors::{Context, Result},
};

/// The whole argument list was invalid; the caller prints the usage message.
///
/// Carries no detail: every rejected invocation gets the same usage text, and
/// no configuration values may have been printed before it.
#[derive(Debug, PartialEq, Eq)]
pub struct UsageError;

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid usage")
    }
}

impl std::error::Error for UsageError {}

/// A validated request for configuration values.
#[derive(Debug, PartialEq, Eq)]
pub enum Invocation {
    /// `--all`: every key with its name, in canonical order.
    All,
    /// One flag per requested key, printed value-only in the order given.
    /// Repeats are honoured.
    Selected(Vec<ConfigKey>),
}

impl Invocation {
    /// Parses the argument list (without the program name).
    ///
    /// The full list is validated before any value is resolved, so a bad
    /// trailing flag rejects the invocation outright instead of after
    /// partial output. `--all` only parses as the sole argument.
    pub fn from_args(args: &[String]) -> Result<Invocation, UsageError> {
        match args {
            [] => Err(UsageError),
            [all] if all.as_str() == "--all" => Ok(Invocation::All),
            _ => {
                let mut keys = Vec::with_capacity(args.len());
                for arg in args {
                    let name = arg.strip_prefix("--").ok_or(UsageError)?;
                    let key = ConfigKey::from_name(name).ok_or(UsageError)?;
                    keys.push(key);
                }
                Ok(Invocation::Selected(keys))
            }
        }
    }
}

/// Builds the usage message shown for any [`UsageError`].
pub fn usage(prog: &str) -> String {
    let mut text = format!("Usage: {} --all", prog);
    for key in ConfigKey::ALL {
        text.push_str(" | --");
        text.push_str(key.name());
    }
    text
}

/// Writes the requested values to `writer`, one per line.
///
/// Resolution stops at the first key the configuration has no value for;
/// lines already written stay written, and the error names the offending
/// key.
pub fn print_values(
    invocation: &Invocation,
    config: &InterpreterConfig,
    writer: &mut impl Write,
) -> Result<()> {
    match invocation {
        Invocation::All => {
            for key in ConfigKey::ALL {
                let value = resolve(config, key)?;
                writeln!(writer, "{} {}", key, value).context("failed to write value")?;
            }
        }
        Invocation::Selected(keys) => {
            for &key in keys {
                let value = resolve(config, key)?;
                writeln!(writer, "{}", value).context("failed to write value")?;
            }
        }
    }
    Ok(())
}

fn resolve(config: &InterpreterConfig, key: ConfigKey) -> Result<String> {
    match config.value(key) {
        Some(value) => Ok(value),
        None => bail!("missing config value for \"{}\"", key),
    }
}
