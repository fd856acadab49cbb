// SPDX-FileCopyrightText: 2026 Serialite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};
use serialite_core::OpenMode;

/// Top-level serialite configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SerialiteConfig {
    /// Database file and connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings used every time the queue opens (or reopens) its handle.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Path or `file:` URI of the SQLite database.
    #[serde(default = "default_database_path")]
    pub path: String,

    /// How the file is opened.
    #[serde(default)]
    pub mode: OpenMode,

    /// Optional SQLite VFS name.
    #[serde(default)]
    pub vfs: Option<String>,

    /// Milliseconds SQLite waits on a locked database before returning SQLITE_BUSY.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Switch the database to WAL journaling on open.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            mode: OpenMode::default(),
            vfs: None,
            busy_timeout_ms: default_busy_timeout_ms(),
            wal_mode: default_wal_mode(),
        }
    }
}

impl DatabaseConfig {
    /// Configuration for a database at `path` with every other setting defaulted.
    pub fn at(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

fn default_database_path() -> String {
    dirs::data_local_dir()
        .map(|d| d.join("serialite/serialite.db").display().to_string())
        .unwrap_or_else(|| "serialite.db".to_string())
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_wal_mode() -> bool {
    true
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default level filter (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
