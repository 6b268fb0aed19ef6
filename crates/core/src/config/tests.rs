// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;
use std::io::Write;
use yare::parameterized;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_match_the_factory_protocol() {
    let config = Config::default();
    assert_eq!(config.semaphore.name, "/factorySem");
    assert_eq!(config.semaphore.mode.bits(), 0o600);
    assert!(!config.semaphore.exclusive);
    assert_eq!(config.factory.work_delay, Duration::from_secs(5));
    assert_eq!(config.factory.shutdown_grace, Duration::from_secs(2));
    assert_eq!(config.log.filter, "info");
    assert!(config.log.file.is_none());

    let options = config.create_options();
    assert_eq!(options.initial, 0);
    assert_eq!(options.mode, 0o600);
}

#[test]
fn toml_file_overrides_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[semaphore]
name = "jobs"
mode = "0660"
exclusive = true

[factory]
work_delay = "250ms"

[log]
filter = "debug"
file = "/tmp/semgate.log"
"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.semaphore.name, "jobs");
    assert_eq!(config.semaphore.mode.bits(), 0o660);
    assert!(config.semaphore.exclusive);
    assert_eq!(config.factory.work_delay, Duration::from_millis(250));
    // Unset keys keep their defaults
    assert_eq!(config.factory.shutdown_grace, DEFAULT_SHUTDOWN_GRACE);
    assert_eq!(config.log.filter, "debug");
    assert_eq!(config.log.file, Some(PathBuf::from("/tmp/semgate.log")));

    assert_eq!(config.semaphore_name().unwrap().as_str(), "/jobs");
    assert!(config.create_options().exclusive);
}

#[test]
fn unknown_keys_are_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[semaphore]\nnmae = \"typo\"").unwrap();

    let err = Config::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "{err}");
}

#[test]
fn missing_file_is_a_read_error() {
    let err = Config::from_file(Path::new("/nonexistent/semgate.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
    assert!(err.to_string().contains("/nonexistent/semgate.toml"));
}

#[test]
fn environment_overrides_file_values() {
    let mut config = Config::default();
    config
        .apply_env(env(&[
            (NAME_ENV, "/other"),
            (MODE_ENV, "0o644"),
            (EXCLUSIVE_ENV, "yes"),
            (WORK_DELAY_ENV, "1s 500ms"),
            (SHUTDOWN_GRACE_ENV, "100ms"),
            (LOG_ENV, "semgate_core=trace"),
            (LOG_FILE_ENV, "/var/log/semgate.log"),
        ]))
        .unwrap();

    assert_eq!(config.semaphore.name, "/other");
    assert_eq!(config.semaphore.mode.bits(), 0o644);
    assert!(config.semaphore.exclusive);
    assert_eq!(config.factory.work_delay, Duration::from_millis(1500));
    assert_eq!(config.factory.shutdown_grace, Duration::from_millis(100));
    assert_eq!(config.log.filter, "semgate_core=trace");
    assert_eq!(config.log.file, Some(PathBuf::from("/var/log/semgate.log")));
}

#[test]
fn empty_log_file_variable_means_stderr() {
    let mut config = Config::default();
    config.log.file = Some(PathBuf::from("/tmp/x.log"));
    config.apply_env(env(&[(LOG_FILE_ENV, "")])).unwrap();
    assert!(config.log.file.is_none());
}

#[parameterized(
    bad_mode = { MODE_ENV, "rw-------" },
    mode_too_wide = { MODE_ENV, "04755" },
    bad_bool = { EXCLUSIVE_ENV, "maybe" },
    bad_delay = { WORK_DELAY_ENV, "soon" },
    bad_grace = { SHUTDOWN_GRACE_ENV, "-1s" },
)]
fn invalid_environment_values_are_reported(key: &str, value: &str) {
    let mut config = Config::default();
    let err = config.apply_env(env(&[(key, value)])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }), "{err}");
}

#[parameterized(
    plain = { "600", 0o600 },
    leading_zero = { "0660", 0o660 },
    rust_prefix = { "0o644", 0o644 },
    padded = { " 0700 ", 0o700 },
)]
fn mode_parses_octal(raw: &str, bits: u32) {
    let mode: Mode = raw.parse().unwrap();
    assert_eq!(mode.bits(), bits);
}

#[test]
fn mode_displays_as_four_octal_digits() {
    assert_eq!(Mode::new(0o60).to_string(), "0060");
    assert_eq!(Mode::default().to_string(), "0600");
}

#[test]
fn config_round_trips_through_toml() {
    let config = Config::default();
    let text = toml::to_string(&config).unwrap();
    assert!(text.contains("mode = \"0600\""));
    assert!(text.contains("work_delay = \"5s\""));
    let parsed: Config = toml::from_str(&text).unwrap();
    assert_eq!(parsed, config);
}
