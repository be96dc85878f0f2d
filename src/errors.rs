//! Error plumbing for configuration lookups.
//!
//! An error is a message plus an optional chain of causes; the binary
//! renders the chain once via [`Error::report`] and exits.

use std::error::Error as StdError;
use std::fmt;

/// Returns early with a formatted [`Error`]. Resembles `anyhow::bail`.
#[macro_export]
macro_rules! bail {
    ($($args:tt)+) => {
        return Err($crate::errors::Error::from(format!($($args)+)))
    };
}

/// Returns early with an error when a condition does not hold. Resembles
/// `anyhow::ensure`.
#[macro_export]
macro_rules! ensure {
    ($condition:expr, $($args:tt)+) => {
        if !($condition) {
            $crate::bail!($($args)+)
        }
    };
}

/// Prints a warning to stderr; stdout is reserved for values and usage
/// output.
#[macro_export]
macro_rules! warn {
    ($($args:tt)+) => {
        eprintln!("warning: {}", format_args!($($args)+))
    };
}

/// Result type used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A lookup failure, with the chain of underlying causes if any.
#[derive(Debug)]
pub struct Error {
    value: String,
    source: Option<Box<dyn StdError + 'static>>,
}

impl Error {
    /// Renders this error and every cause beneath it, one line per cause.
    pub fn report(&self) -> impl fmt::Display + '_ {
        Report(self)
    }
}

struct Report<'a>(&'a Error);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(cause) = source {
            write!(f, "\ncaused by: {}", cause)?;
            source = cause.source();
        }
        Ok(())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_deref()
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error {
            value,
            source: None,
        }
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        value.to_string().into()
    }
}

/// Adds context to an error, keeping the original as the cause.
pub trait Context<T> {
    /// Wraps any error with `message`.
    fn context(self, message: impl Into<String>) -> Result<T>;
    /// Wraps any error with the message built by `message`.
    fn with_context(self, message: impl FnOnce() -> String) -> Result<T>;
}

impl<T, E: StdError + 'static> Context<T> for Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|error| Error {
            value: message.into(),
            source: Some(Box::new(error)),
        })
    }

    fn with_context(self, message: impl FnOnce() -> String) -> Result<T> {
        self.map_err(|error| Error {
            value: message(),
            source: Some(Box::new(error)),
        })
    }
}
