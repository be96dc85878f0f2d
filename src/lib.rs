//! Report a Python installation's build configuration for embedding.
//!
//! The binary answers one-shot queries such as `--include-dir` or `--all`
//! by asking the local interpreter for its `sysconfig` metadata and
//! printing the values a build system needs to compile and link against
//! that installation.
//!
//! The configuration normally comes from running the discovered
//! interpreter; setting `PYTHON_CONFIG_FILE` reads a previously written
//! config file instead, for hosts where the target interpreter cannot be
//! executed.

#![warn(elided_lifetimes_in_paths, unused_lifetimes)]

pub mod cli;
pub mod config;
mod errors;

pub use cli::{usage, Invocation, UsageError};
pub use config::{find_interpreter, ConfigKey, InterpreterConfig, PythonVersion};
pub use errors::{Error, Result};

/// Obtains the configuration to answer queries from.
///
/// With `PYTHON_CONFIG_FILE` set, the named file is parsed instead of
/// probing an interpreter. Nothing is cached: every invocation observes
/// the environment as it currently is.
pub fn load() -> Result<InterpreterConfig> {
    if let Some(path) = config::env_var("PYTHON_CONFIG_FILE") {
        InterpreterConfig::from_path(path)
    } else {
        InterpreterConfig::from_interpreter(find_interpreter()?)
    }
}
