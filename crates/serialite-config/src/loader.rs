// SPDX-FileCopyrightText: 2026 Serialite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./serialite.toml` > `~/.config/serialite/serialite.toml`
//! > `/etc/serialite/serialite.toml` with environment variable overrides via the
//! `SERIALITE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use tracing::debug;

use crate::model::SerialiteConfig;

const SYSTEM_CONFIG: &str = "/etc/serialite/serialite.toml";
const LOCAL_CONFIG: &str = "serialite.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/serialite/serialite.toml`
/// 3. `~/.config/serialite/serialite.toml`
/// 4. `./serialite.toml`
/// 5. `SERIALITE_*` environment variables
pub fn load_config() -> Result<SerialiteConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<SerialiteConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SerialiteConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SerialiteConfig, figment::Error> {
    debug!(path = %path.display(), "loading explicit config file");
    Figment::new()
        .merge(Serialized::defaults(SerialiteConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    let user_config = dirs::config_dir()
        .map(|d| d.join("serialite/serialite.toml"))
        .unwrap_or_default();
    for source in [Path::new(SYSTEM_CONFIG), user_config.as_path(), Path::new(LOCAL_CONFIG)] {
        if source.is_file() {
            debug!(path = %source.display(), "config file found");
        }
    }

    Figment::new()
        .merge(Serialized::defaults(SerialiteConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Environment provider mapping `SERIALITE_<SECTION>_<KEY>` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because keys such as
/// `busy_timeout_ms` contain underscores themselves.
fn env_provider() -> Env {
    Env::prefixed("SERIALITE_").map(|key| env_key_to_path(key.as_str()).into())
}

/// `DATABASE_BUSY_TIMEOUT_MS` -> `database.busy_timeout_ms`.
///
/// Figment hands the key over with its original casing.
fn env_key_to_path(key: &str) -> String {
    key.to_ascii_lowercase()
        .replacen("database_", "database.", 1)
        .replacen("logging_", "logging.", 1)
}
