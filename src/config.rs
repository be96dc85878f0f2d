//! Interpreter build-configuration model: the fixed set of queryable keys,
//! the metadata snapshot they resolve against, and the two ways to obtain a
//! snapshot (probing a live interpreter, or reading a config file).

use std::collections::HashMap;
use std::env;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;

use crate::{
    bail, ensure,
    errors::{Context, Result},
    warn,
};

/// Gets an environment variable used to steer the lookup.
pub(crate) fn env_var(var: &str) -> Option<OsString> {
    env::var_os(var)
}

/// Python `X.Y` version, e.g. `3.11`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PythonVersion {
    pub major: u8,
    pub minor: u8,
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for PythonVersion {
    type Err = crate::errors::Error;

    fn from_str(value: &str) -> Result<Self> {
        let mut split = value.splitn(2, '.');
        let (major, minor) = (
            split
                .next()
                .expect("first splitn value should always be present"),
            split.next().ok_or("expected a major.minor version")?,
        );
        Ok(Self {
            major: major.parse().context("failed to parse major version")?,
            minor: minor.parse().context("failed to parse minor version")?,
        })
    }
}

/// The configuration values this tool can report.
///
/// The set is closed; [`ConfigKey::ALL`] fixes the order `--all` prints in.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConfigKey {
    /// Directory containing the interpreter's public headers.
    IncludeDir,
    /// Directory containing the interpreter's library.
    LibDir,
    /// Filename of the interpreter's dynamic library artifact.
    LibName,
    /// Dotted `major.minor` version.
    Version,
    /// Major component of the version.
    VersionMajor,
    /// Minor component of the version.
    VersionMinor,
    /// ABI flag suffix, e.g. `""` or `"m"`.
    VersionSuffix,
}

impl ConfigKey {
    /// Every key, in canonical output order.
    pub const ALL: [ConfigKey; 7] = [
        ConfigKey::IncludeDir,
        ConfigKey::LibDir,
        ConfigKey::LibName,
        ConfigKey::Version,
        ConfigKey::VersionMajor,
        ConfigKey::VersionMinor,
        ConfigKey::VersionSuffix,
    ];

    /// The name used on the command line (without the `--` prefix) and in
    /// `--all` output.
    pub fn name(self) -> &'static str {
        match self {
            ConfigKey::IncludeDir => "include-dir",
            ConfigKey::LibDir => "lib-dir",
            ConfigKey::LibName => "lib-name",
            ConfigKey::Version => "version",
            ConfigKey::VersionMajor => "version-major",
            ConfigKey::VersionMinor => "version-minor",
            ConfigKey::VersionSuffix => "version-suffix",
        }
    }

    /// Looks a key up by its command-line name.
    pub fn from_name(name: &str) -> Option<ConfigKey> {
        ConfigKey::ALL.iter().copied().find(|key| key.name() == name)
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Build configuration of one Python installation.
///
/// Usually queried from the interpreter itself; a config file named by the
/// `PYTHON_CONFIG_FILE` environment variable can stand in for environments
/// where running an interpreter is not possible.
///
/// `None` in an optional field means the installation's metadata had no
/// value at all; an empty string is a present value. The distinction decides
/// whether a query fails or prints an empty line.
#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct InterpreterConfig {
    /// Python `X.Y` version.
    pub version: PythonVersion,

    /// Path of the interpreter's public header directory.
    pub include_dir: Option<String>,

    /// Directory containing the interpreter's shared or static library.
    pub lib_dir: Option<String>,

    /// Filename of the interpreter's dynamic library, e.g.
    /// `libpython3.11.so`.
    pub lib_name: Option<String>,

    /// ABI flag suffix; absent on interpreters that predate ABI flags.
    pub abiflags: Option<String>,

    /// Path of the interpreter the snapshot was taken from, when known.
    pub executable: Option<String>,
}

impl InterpreterConfig {
    /// Queries `interpreter` for its build configuration.
    pub fn from_interpreter(interpreter: impl AsRef<Path>) -> Result<Self> {
        const SCRIPT: &str = r#"
# Also runs under Python 2.
from __future__ import print_function

import sys
import sysconfig


def print_if_set(varname, value):
    if value is not None:
        print(varname, value)


print("version_major", sys.version_info[0])
print("version_minor", sys.version_info[1])
print_if_set("include_dir", sysconfig.get_path("include"))
print_if_set("lib_dir", sysconfig.get_config_var("LIBDIR"))
print_if_set("lib_name", sysconfig.get_config_var("LDLIBRARY"))
print_if_set("abiflags", sysconfig.get_config_var("ABIFLAGS"))
print_if_set("executable", sys.executable)
"#;
        let interpreter = interpreter.as_ref();
        let output = run_python_script(interpreter, SCRIPT)?;
        let map = parse_script_output(&output);
        ensure!(
            !map.is_empty(),
            "the interpreter at {} did not report any build configuration",
            interpreter.display()
        );

        macro_rules! required {
            ($key:literal) => {
                map.get($key)
                    .ok_or(concat!("interpreter output did not contain ", $key))?
            };
        }

        let version = PythonVersion {
            major: required!("version_major")
                .parse()
                .context("failed to parse major version")?,
            minor: required!("version_minor")
                .parse()
                .context("failed to parse minor version")?,
        };

        Ok(InterpreterConfig {
            version,
            include_dir: map.get("include_dir").cloned(),
            lib_dir: map.get("lib_dir").cloned(),
            lib_name: map.get("lib_name").cloned(),
            abiflags: map.get("abiflags").cloned(),
            executable: map.get("executable").cloned(),
        })
    }

    /// Reads a configuration from the file at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_file = std::fs::File::open(path)
            .with_context(|| format!("failed to open config file at {}", path.display()))?;
        InterpreterConfig::from_reader(BufReader::new(config_file))
    }

    /// Parses the `key=value` config file format written by [`to_writer`].
    ///
    /// Only `version` is required.
    ///
    /// [`to_writer`]: InterpreterConfig::to_writer
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let reader = BufReader::new(reader);

        let mut version = None;
        let mut include_dir = None;
        let mut lib_dir = None;
        let mut lib_name = None;
        let mut abiflags = None;
        let mut executable = None;

        for (i, line) in reader.lines().enumerate() {
            let line = line.context("failed to read line from config")?;
            let mut split = line.splitn(2, '=');
            let (key, value) = (
                split
                    .next()
                    .expect("first splitn value should always be present"),
                split
                    .next()
                    .ok_or_else(|| format!("expected key=value pair on line {}", i + 1))?,
            );
            match key {
                "version" => {
                    version = Some(value.parse().with_context(|| {
                        format!("failed to parse version from config value '{}'", value)
                    })?)
                }
                "include_dir" => include_dir = Some(value.to_string()),
                "lib_dir" => lib_dir = Some(value.to_string()),
                "lib_name" => lib_name = Some(value.to_string()),
                "abiflags" => abiflags = Some(value.to_string()),
                "executable" => executable = Some(value.to_string()),
                unknown => bail!("unknown config key `{}` on line {}", unknown, i + 1),
            }
        }

        Ok(InterpreterConfig {
            version: version.ok_or("missing value for version")?,
            include_dir,
            lib_dir,
            lib_name,
            abiflags,
            executable,
        })
    }

    /// Writes this configuration in the format [`from_reader`] parses.
    ///
    /// Absent optional values are omitted rather than written empty, so a
    /// round trip preserves the present/absent distinction.
    ///
    /// [`from_reader`]: InterpreterConfig::from_reader
    pub fn to_writer(&self, mut writer: impl Write) -> Result<()> {
        macro_rules! write_option_line {
            ($field:ident) => {
                if let Some(value) = &self.$field {
                    writeln!(writer, "{}={}", stringify!($field), value).context(concat!(
                        "failed to write ",
                        stringify!($field),
                        " to config"
                    ))
                } else {
                    Ok(())
                }
            };
        }

        writeln!(writer, "version={}", self.version)
            .context("failed to write version to config")?;
        write_option_line!(include_dir)?;
        write_option_line!(lib_dir)?;
        write_option_line!(lib_name)?;
        write_option_line!(abiflags)?;
        write_option_line!(executable)?;
        Ok(())
    }

    /// Resolves one key against this snapshot.
    ///
    /// `None` means the underlying configuration had no value for the key,
    /// which callers report as an error. `version-suffix` never yields
    /// `None`: an interpreter without ABI flags has the empty suffix.
    pub fn value(&self, key: ConfigKey) -> Option<String> {
        match key {
            ConfigKey::IncludeDir => self.include_dir.clone(),
            ConfigKey::LibDir => self.lib_dir.clone(),
            ConfigKey::LibName => self.lib_name.clone(),
            ConfigKey::Version => Some(self.version.to_string()),
            ConfigKey::VersionMajor => Some(self.version.major.to_string()),
            ConfigKey::VersionMinor => Some(self.version.minor.to_string()),
            ConfigKey::VersionSuffix => Some(self.abiflags.clone().unwrap_or_default()),
        }
    }
}

fn venv_interpreter(virtual_env: &OsStr, windows: bool) -> PathBuf {
    if windows {
        Path::new(virtual_env).join("Scripts").join("python.exe")
    } else {
        Path::new(virtual_env).join("bin").join("python")
    }
}

fn conda_env_interpreter(conda_prefix: &OsStr, windows: bool) -> PathBuf {
    if windows {
        Path::new(conda_prefix).join("python.exe")
    } else {
        Path::new(conda_prefix).join("bin").join("python")
    }
}

fn get_env_interpreter() -> Option<PathBuf> {
    match (env_var("VIRTUAL_ENV"), env_var("CONDA_PREFIX")) {
        // The interpreter always runs on the host.
        (Some(dir), None) => Some(venv_interpreter(&dir, cfg!(windows))),
        (None, Some(dir)) => Some(conda_env_interpreter(&dir, cfg!(windows))),
        (Some(_), Some(_)) => {
            warn!(
                "both VIRTUAL_ENV and CONDA_PREFIX are set; ignoring both for locating the \
                 Python interpreter until one of them is unset"
            );
            None
        }
        (None, None) => None,
    }
}

/// Attempts to locate the Python interpreter to query.
///
/// Locations are checked in the order listed:
///   1. If `PYTHON_CONFIG_PYTHON` is set, this interpreter is used.
///   2. If in a virtualenv or conda environment, that environment's
///      interpreter is used.
///   3. `python`, if this is a functional Python interpreter
///   4. `python3`, as above
pub fn find_interpreter() -> Result<PathBuf> {
    if let Some(exe) = env_var("PYTHON_CONFIG_PYTHON") {
        Ok(exe.into())
    } else if let Some(env_interpreter) = get_env_interpreter() {
        Ok(env_interpreter)
    } else {
        ["python", "python3"]
            .iter()
            .find(|bin| {
                if let Ok(out) = Command::new(bin).arg("--version").output() {
                    // Python 2 writes its version to stderr.
                    out.stdout.starts_with(b"Python ") || out.stderr.starts_with(b"Python ")
                } else {
                    false
                }
            })
            .map(PathBuf::from)
            .ok_or_else(|| "no Python interpreter found in PATH".into())
    }
}

/// Runs a Python script using the specified interpreter binary.
fn run_python_script(interpreter: &Path, script: &str) -> Result<String> {
    let out = Command::new(interpreter)
        .env("PYTHONIOENCODING", "utf-8")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .and_then(|mut child| {
            child
                .stdin
                .as_mut()
                .expect("piped stdin")
                .write_all(script.as_bytes())?;
            child.wait_with_output()
        });

    match out {
        Err(err) => bail!(
            "failed to run the Python interpreter at {}: {}",
            interpreter.display(),
            err
        ),
        Ok(ok) if !ok.status.success() => bail!(
            "the Python interpreter at {} exited with an error",
            interpreter.display()
        ),
        Ok(ok) => {
            String::from_utf8(ok.stdout).context("failed to parse interpreter output as utf-8")
        }
    }
}

/// Splits `name value` lines into a map; the value keeps any further spaces.
fn parse_script_output(output: &str) -> HashMap<String, String> {
    output
        .lines()
        .filter_map(|line| {
            let mut split = line.splitn(2, ' ');
            Some((split.next()?.to_string(), split.next()?.to_string()))
        })
        .collect()
}
