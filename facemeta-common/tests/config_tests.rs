//! Tests for configuration loading and path resolution
//!
//! Covers:
//! - Missing config files fall back to built-in defaults
//! - Explicit config files must exist and parse
//! - Root folder priority: CLI > FACEMETA_ROOT > TOML > current directory
//! - Flat table fallback from the full table to the simplified table
//!
//! Tests that touch FACEMETA_ROOT / FACEMETA_CONFIG are marked #[serial] so
//! they never run concurrently.

use facemeta_common::config::{
    resolve_root_folder, resolve_table_path, TomlConfig, CONFIG_ENV_VAR, ROOT_ENV_VAR,
};
use facemeta_common::Error;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
#[serial]
fn test_resolver_cli_argument_wins() {
    env::set_var(ROOT_ENV_VAR, "/tmp/facemeta-env-root");
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/facemeta-toml-root")),
        ..TomlConfig::default()
    };

    let root = resolve_root_folder(Some(Path::new("/tmp/facemeta-cli-root")), &config);
    assert_eq!(root, PathBuf::from("/tmp/facemeta-cli-root"));

    env::remove_var(ROOT_ENV_VAR);
}

#[test]
#[serial]
fn test_resolver_env_var_beats_toml() {
    env::set_var(ROOT_ENV_VAR, "/tmp/facemeta-env-root");
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/facemeta-toml-root")),
        ..TomlConfig::default()
    };

    let root = resolve_root_folder(None, &config);
    assert_eq!(root, PathBuf::from("/tmp/facemeta-env-root"));

    env::remove_var(ROOT_ENV_VAR);
}

#[test]
#[serial]
fn test_resolver_toml_then_current_dir() {
    env::remove_var(ROOT_ENV_VAR);

    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/facemeta-toml-root")),
        ..TomlConfig::default()
    };
    assert_eq!(
        resolve_root_folder(None, &config),
        PathBuf::from("/tmp/facemeta-toml-root")
    );

    assert_eq!(
        resolve_root_folder(None, &TomlConfig::default()),
        PathBuf::from(".")
    );
}

#[test]
#[serial]
fn test_load_from_env_config_path() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("facemeta.toml");
    fs::write(&path, "[review]\nport = 5999\n").unwrap();

    env::set_var(CONFIG_ENV_VAR, &path);
    let config = TomlConfig::load(None).unwrap();
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(config.review.port, 5999);
}

#[test]
fn test_explicit_missing_config_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("absent.toml");

    let err = TomlConfig::load(Some(&missing)).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn test_explicit_invalid_config_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.toml");
    fs::write(&path, "[review\nport = ").unwrap();

    let err = TomlConfig::load(Some(&path)).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_explicit_config_loads() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("facemeta.toml");
    fs::write(
        &path,
        r#"
root_folder = "/srv/dataset"

[logging]
level = "debug"

[normalize]
seed = 7
"#,
    )
    .unwrap();

    let config = TomlConfig::load(Some(&path)).unwrap();
    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/dataset")));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.normalize.seed, Some(7));
}

#[test]
fn test_table_path_prefers_full_table() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    // Nothing exists yet: simplified table is the fallback
    assert_eq!(resolve_table_path(root, None), root.join("meta.csv"));

    fs::write(root.join("imdb_meta_full.csv"), "age\n").unwrap();
    assert_eq!(resolve_table_path(root, None), root.join("imdb_meta_full.csv"));
}

#[test]
fn test_table_path_explicit_relative_to_root() {
    let root = Path::new("/srv/dataset");
    assert_eq!(
        resolve_table_path(root, Some(Path::new("meta_full.csv"))),
        PathBuf::from("/srv/dataset/meta_full.csv")
    );
    assert_eq!(
        resolve_table_path(root, Some(Path::new("/elsewhere/meta.csv"))),
        PathBuf::from("/elsewhere/meta.csv")
    );
}
