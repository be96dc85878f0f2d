//! End-to-end checks of the query surface, driven through a config file so
//! the results do not depend on the host's Python installation.

use std::env;
use std::process::Command;

use python_config::cli::{print_values, usage, Invocation, UsageError};
use python_config::{load, ConfigKey, InterpreterConfig, PythonVersion};

fn sample_config() -> InterpreterConfig {
    InterpreterConfig {
        version: PythonVersion {
            major: 3,
            minor: 11,
        },
        include_dir: Some("/usr/include/python3.11".into()),
        lib_dir: Some("/usr/lib".into()),
        lib_name: Some("libpython3.11.so".into()),
        abiflags: Some("".into()),
        executable: Some("/usr/bin/python3".into()),
    }
}

fn write_config_file(config: &InterpreterConfig) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    config.to_writer(&mut file).unwrap();
    file
}

#[test]
fn all_query_against_config_file() {
    let file = write_config_file(&sample_config());
    let config = InterpreterConfig::from_path(file.path()).unwrap();

    let mut buf: Vec<u8> = Vec::new();
    print_values(&Invocation::All, &config, &mut buf).unwrap();
    assert_eq!(
        std::str::from_utf8(&buf).unwrap(),
        "include-dir /usr/include/python3.11\n\
         lib-dir /usr/lib\n\
         lib-name libpython3.11.so\n\
         version 3.11\n\
         version-major 3\n\
         version-minor 11\n\
         version-suffix \n"
    );
}

#[test]
fn selected_query_against_config_file() {
    let file = write_config_file(&sample_config());
    let config = InterpreterConfig::from_path(file.path()).unwrap();

    let args: Vec<String> = ["--lib-name", "--version-major", "--lib-name"]
        .iter()
        .map(|arg| arg.to_string())
        .collect();
    let invocation = Invocation::from_args(&args).unwrap();

    let mut buf: Vec<u8> = Vec::new();
    print_values(&invocation, &config, &mut buf).unwrap();
    assert_eq!(
        std::str::from_utf8(&buf).unwrap(),
        "libpython3.11.so\n3\nlibpython3.11.so\n"
    );
}

#[test]
fn bad_argv_is_rejected_before_any_lookup() {
    for argv in [
        vec![],
        vec!["--all".to_string(), "--version".to_string()],
        vec!["--version".to_string(), "--libdir".to_string()],
    ] {
        assert_eq!(Invocation::from_args(&argv), Err(UsageError));
    }

    assert_eq!(
        usage("python-config"),
        "Usage: python-config --all | --include-dir | --lib-dir | --lib-name | \
         --version | --version-major | --version-minor | --version-suffix"
    );
}

#[test]
fn missing_value_diagnostic_names_the_flag() {
    let mut config = sample_config();
    config.lib_dir = None;

    let invocation = Invocation::Selected(vec![ConfigKey::LibDir]);
    let mut buf: Vec<u8> = Vec::new();
    let error = print_values(&invocation, &config, &mut buf).unwrap_err();

    assert!(buf.is_empty());
    assert_eq!(
        format!("ERROR: {}", error.report()),
        "ERROR: missing config value for \"lib-dir\""
    );
}

#[test]
fn suffix_is_empty_not_missing_without_abiflags() {
    let mut config = sample_config();
    config.abiflags = None;
    let file = write_config_file(&config);
    let config = InterpreterConfig::from_path(file.path()).unwrap();

    let invocation = Invocation::Selected(vec![ConfigKey::VersionSuffix]);
    let mut buf: Vec<u8> = Vec::new();
    print_values(&invocation, &config, &mut buf).unwrap();
    assert_eq!(std::str::from_utf8(&buf).unwrap(), "\n");
}

#[test]
fn binary_prints_values_and_exits_zero() {
    let file = write_config_file(&sample_config());

    let out = Command::new(env!("CARGO_BIN_EXE_python-config"))
        .args(["--version", "--lib-name"])
        .env("PYTHON_CONFIG_FILE", file.path())
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(
        String::from_utf8(out.stdout).unwrap(),
        "3.11\nlibpython3.11.so\n"
    );
    assert!(out.stderr.is_empty());

    let out = Command::new(env!("CARGO_BIN_EXE_python-config"))
        .arg("--all")
        .env("PYTHON_CONFIG_FILE", file.path())
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(
        String::from_utf8(out.stdout).unwrap(),
        "include-dir /usr/include/python3.11\n\
         lib-dir /usr/lib\n\
         lib-name libpython3.11.so\n\
         version 3.11\n\
         version-major 3\n\
         version-minor 11\n\
         version-suffix \n"
    );
}

#[test]
fn binary_rejects_bad_argv_with_usage_on_stdout() {
    let file = write_config_file(&sample_config());

    for argv in [vec![], vec!["--version", "--bogus"]] {
        let out = Command::new(env!("CARGO_BIN_EXE_python-config"))
            .args(argv)
            .env("PYTHON_CONFIG_FILE", file.path())
            .output()
            .unwrap();
        assert_eq!(out.status.code(), Some(1));

        let stdout = String::from_utf8(out.stdout).unwrap();
        assert!(stdout.starts_with("Usage: "));
        // No values precede the usage line, even after a valid flag.
        assert_eq!(stdout.lines().count(), 1);
    }
}

#[test]
fn binary_reports_missing_value_after_partial_output() {
    let mut config = sample_config();
    config.include_dir = None;
    let file = write_config_file(&config);

    let out = Command::new(env!("CARGO_BIN_EXE_python-config"))
        .args(["--version", "--include-dir", "--lib-dir"])
        .env("PYTHON_CONFIG_FILE", file.path())
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(
        String::from_utf8(out.stdout).unwrap(),
        "3.11\nERROR: missing config value for \"include-dir\"\n"
    );
}

#[test]
fn load_reads_the_file_named_by_the_environment() {
    let file = write_config_file(&sample_config());

    // No other test in this binary touches this variable.
    env::set_var("PYTHON_CONFIG_FILE", file.path());
    let config = load().unwrap();
    env::remove_var("PYTHON_CONFIG_FILE");

    assert_eq!(config.value(ConfigKey::Version).as_deref(), Some("3.11"));
    assert_eq!(
        config.value(ConfigKey::LibName).as_deref(),
        Some("libpython3.11.so")
    );
}
