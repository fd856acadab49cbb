// SPDX-FileCopyrightText: 2026 Serialite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the serialite configuration system.

use serialite_config::diagnostic::ConfigError;
use serialite_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};
use serialite_core::OpenMode;

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_serialite_config() {
    let toml = r#"
[database]
path = "/tmp/test.db"
mode = "read_write"
vfs = "unix-dotfile"
busy_timeout_ms = 250
wal_mode = false

[logging]
level = "debug"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.database.path, "/tmp/test.db");
    assert_eq!(config.database.mode, OpenMode::ReadWrite);
    assert_eq!(config.database.vfs.as_deref(), Some("unix-dotfile"));
    assert_eq!(config.database.busy_timeout_ms, 250);
    assert!(!config.database.wal_mode);
    assert_eq!(config.logging.level, "debug");
}

/// An empty document yields the compiled defaults.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_and_validate_str("").expect("defaults should validate");
    assert_eq!(config.database.mode, OpenMode::ReadWriteCreate);
    assert_eq!(config.database.busy_timeout_ms, 5_000);
    assert!(config.database.wal_mode);
    assert!(config.database.vfs.is_none());
    assert_eq!(config.logging.level, "info");
}

/// A misspelled key produces an UnknownKey diagnostic with a suggestion.
#[test]
fn unknown_key_suggests_correction() {
    let toml = r#"
[database]
busy_timout_ms = 10
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "busy_timout_ms");
            assert_eq!(suggestion.as_deref(), Some("busy_timeout_ms"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// An unknown open mode string is rejected at deserialization.
#[test]
fn unknown_open_mode_is_rejected() {
    let toml = r#"
[database]
mode = "write_only"
"#;

    assert!(load_and_validate_str(toml).is_err());
}

/// Semantic validation runs after successful deserialization.
#[test]
fn wal_mode_with_read_only_fails_validation() {
    let toml = r#"
[database]
mode = "read_only"
wal_mode = true
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert!(matches!(errors[0], ConfigError::Validation { .. }));
    assert!(errors[0].to_string().contains("wal_mode"));
}

/// An explicit config file is loaded from disk.
#[test]
fn loads_explicit_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("serialite.toml");
    std::fs::write(&path, "[database]\npath = \"data/app.db\"\nwal_mode = false\n").unwrap();

    let config = load_and_validate_path(&path).expect("file config should load");
    assert_eq!(config.database.path, "data/app.db");
    assert!(!config.database.wal_mode);
}

/// Figment's jail scopes environment overrides to the closure.
#[test]
fn env_vars_override_file_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("serialite.toml", "[database]\npath = \"from-file.db\"\n")?;
        jail.set_env("SERIALITE_DATABASE_PATH", "from-env.db");
        jail.set_env("SERIALITE_DATABASE_BUSY_TIMEOUT_MS", "42");
        jail.set_env("SERIALITE_LOGGING_LEVEL", "warn");

        let config = serialite_config::load_config().expect("config should load");
        assert_eq!(config.database.path, "from-env.db");
        assert_eq!(config.database.busy_timeout_ms, 42);
        assert_eq!(config.logging.level, "warn");
        Ok(())
    });
}

/// Changes made after loading are re-checked and folded into one error.
#[test]
fn revalidate_folds_errors_into_one() {
    let mut config = load_and_validate_str("").expect("defaults should be valid");
    assert!(serialite_config::revalidate(&config).is_ok());

    config.database.path = "  ".to_string();
    config.logging.level = "loud".to_string();
    match serialite_config::revalidate(&config) {
        Err(serialite_core::SerialiteError::Config(message)) => {
            assert!(message.contains("database.path"));
            assert!(message.contains("; "));
        }
        other => panic!("expected a config error, got {other:?}"),
    }
}
