// SPDX-FileCopyrightText: 2026 Serialite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use serialite_core::OpenMode;

use crate::diagnostic::ConfigError;
use crate::model::SerialiteConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &SerialiteConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let db = &config.database;

    if db.path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "database.path must not be empty".to_string(),
        });
    }

    if db.wal_mode && db.mode == OpenMode::ReadOnly {
        errors.push(ConfigError::Validation {
            message: "database.wal_mode cannot be enabled when database.mode is `read_only`"
                .to_string(),
        });
    }

    if let Some(vfs) = &db.vfs {
        if vfs.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: "database.vfs must not be empty when set".to_string(),
            });
        }
    }

    if !LOG_LEVELS.contains(&config.logging.level.to_ascii_lowercase().as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "logging.level `{}` is not one of {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&SerialiteConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_failure() {
        let mut config = SerialiteConfig::default();
        config.database.path = "  ".into();
        config.database.mode = OpenMode::ReadOnly;
        config.logging.level = "loud".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn read_only_without_wal_is_valid() {
        let mut config = SerialiteConfig::default();
        config.database.mode = OpenMode::ReadOnly;
        config.database.wal_mode = false;
        assert!(validate_config(&config).is_ok());
    }
}
