//! Unit tests for configuration loading and output folder resolution
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate FLACREC_OUTPUT_DIR are marked with #[serial]
//! to ensure they run sequentially, not in parallel.

use flacrec_common::config::{resolve_output_dir, TomlConfig, OUTPUT_DIR_ENV};
use flacrec_common::Error;
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, content).expect("write config");
    path
}

#[test]
fn test_load_explicit_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
        output_dir = "/srv/music"
        player_url = "http://127.0.0.1:47000"
        default_album = "Road Trip"
        keep_art = true

        [monitor]
        poll_interval_ms = 500
        heartbeat_ticks = 10

        [logging]
        level = "debug"
        "#,
    );

    let config = TomlConfig::load(Some(&path)).expect("config should load");
    assert_eq!(config.output_dir, Some(PathBuf::from("/srv/music")));
    assert_eq!(config.player_url.as_deref(), Some("http://127.0.0.1:47000"));
    assert_eq!(config.default_album.as_deref(), Some("Road Trip"));
    assert!(config.keep_art);
    assert_eq!(config.monitor.poll_interval_ms, 500);
    assert_eq!(config.monitor.heartbeat_ticks, 10);
    assert_eq!(config.monitor.settle_delay_ms, 1000);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_missing_explicit_file_is_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");
    let result = TomlConfig::load(Some(&missing));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_locate_reports_explicit_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "keep_art = true\n");
    assert_eq!(TomlConfig::locate(Some(&path)).unwrap(), Some(path));

    let missing = dir.path().join("nope.toml");
    assert!(matches!(
        TomlConfig::locate(Some(&missing)),
        Err(Error::Config(_))
    ));
}

#[test]
fn test_malformed_file_is_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "output_dir = [unterminated");
    let result = TomlConfig::load(Some(&path));
    assert!(matches!(result, Err(Error::ConfigParse(_))));
}

#[test]
fn test_invalid_values_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[monitor]\npoll_interval_ms = 0\n");
    let result = TomlConfig::load(Some(&path));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_cli_argument_wins() {
    env::set_var(OUTPUT_DIR_ENV, "/from/env");
    let config = TomlConfig {
        output_dir: Some(PathBuf::from("/from/file")),
        ..Default::default()
    };

    let resolved = resolve_output_dir(Some(Path::new("/from/cli")), OUTPUT_DIR_ENV, &config).unwrap();
    assert_eq!(resolved, PathBuf::from("/from/cli"));

    env::remove_var(OUTPUT_DIR_ENV);
}

#[test]
#[serial]
fn test_env_beats_config_file() {
    env::set_var(OUTPUT_DIR_ENV, "/from/env");
    let config = TomlConfig {
        output_dir: Some(PathBuf::from("/from/file")),
        ..Default::default()
    };

    let resolved = resolve_output_dir(None, OUTPUT_DIR_ENV, &config).unwrap();
    assert_eq!(resolved, PathBuf::from("/from/env"));

    env::remove_var(OUTPUT_DIR_ENV);
}

#[test]
#[serial]
fn test_config_file_used_last() {
    env::remove_var(OUTPUT_DIR_ENV);
    let config = TomlConfig {
        output_dir: Some(PathBuf::from("/from/file")),
        ..Default::default()
    };

    let resolved = resolve_output_dir(None, OUTPUT_DIR_ENV, &config).unwrap();
    assert_eq!(resolved, PathBuf::from("/from/file"));
}

#[test]
#[serial]
fn test_missing_output_dir_is_config_error() {
    env::remove_var(OUTPUT_DIR_ENV);
    let result = resolve_output_dir(None, OUTPUT_DIR_ENV, &TomlConfig::default());
    match result {
        Err(Error::Config(msg)) => assert!(msg.contains("--output-dir")),
        other => panic!("expected Config error, got {:?}", other),
    }
}
