//! Tests for LinkConfig

use crate::config::*;
use pretty_assertions::assert_eq;
use std::path::PathBuf;

#[test]
fn test_defaults() {
    let config = LinkConfig::default();
    assert_eq!(config.compiler.batch_size, 1000);
    assert_eq!(config.compiler.max_commit_attempts, 3);
    assert_eq!(config.compiler.json_source_field, "content");
    assert_eq!(config.compiler.stage_keys.input, "source_stage_ref");
    assert_eq!(config.loader.connector_dir, PathBuf::from("lib").join("connector"));
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let config = LinkConfig::from_toml_str(
        r#"
home_dir = "/opt/dlink"

[compiler]
batch_size = 500
json_source_field = "payload"

[compiler.stage_keys]
input = "source_table_name"
output = "result_table_name"
"#,
    )
    .unwrap();
    assert_eq!(config.home_dir, Some(PathBuf::from("/opt/dlink")));
    assert_eq!(config.compiler.batch_size, 500);
    assert_eq!(config.compiler.max_retries, 1);
    assert_eq!(config.compiler.json_source_field, "payload");
    assert_eq!(config.compiler.stage_keys.output, "result_table_name");
    assert_eq!(config.loader.archive_extensions, vec!["so", "dylib", "dll"]);
}

#[test]
fn test_invalid_toml_is_an_error() {
    assert!(LinkConfig::from_toml_str("compiler = 3").is_err());
}

#[test]
fn test_env_overrides() {
    let mut config = LinkConfig::default();
    config.apply_env(|key| match key {
        HOME_ENV => Some("/srv/link".to_string()),
        SHARED_PREFIXES_ENV => Some("arrow_, ,parquet::".to_string()),
        _ => None,
    });
    assert_eq!(config.home_dir(), PathBuf::from("/srv/link"));
    assert_eq!(config.loader.shared_prefixes, vec!["arrow_", "parquet::"]);
    assert_eq!(
        config.connector_root(),
        PathBuf::from("/srv/link").join("lib").join("connector")
    );
}

#[test]
fn test_load_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[loader]\nconnector_dir = \"plugins\"\n").unwrap();
    let config = LinkConfig::load(Some(&path)).unwrap();
    assert_eq!(config.loader.connector_dir, PathBuf::from("plugins"));
}

#[test]
fn test_load_missing_explicit_path_fails() {
    let dir = tempfile::tempdir().unwrap();
    assert!(LinkConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
}
