// SPDX-FileCopyrightText: 2026 Serialite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! serialite - operator CLI for a database served through a serial access queue.
//!
//! Every command opens the configured database through a `DatabaseQueue`, so
//! the CLI exercises exactly the code path an embedding application uses.

mod checkpoint;
mod exec;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serialite_config::{ConfigError, DatabaseConfig, SerialiteConfig};
use serialite_core::{CheckpointMode, OpenMode, Result, SerialiteError, TransactionMode};
use serialite_queue::DatabaseQueue;

/// serialite - serialized access to a single SQLite database.
#[derive(Parser, Debug)]
#[command(name = "serialite", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override `database.path`.
    #[arg(long, global = true, value_name = "PATH")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Show database path, journal mode, size and SQLite capabilities.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },
    /// Fold the write-ahead log back into the database file.
    Checkpoint {
        /// passive, full, restart or truncate.
        #[arg(long, default_value_t = CheckpointMode::Passive)]
        mode: CheckpointMode,
        /// Attached schema to checkpoint; all schemas when omitted.
        #[arg(long)]
        schema: Option<String>,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Run a SQL batch inside a transaction.
    Exec {
        /// SQL statements to execute.
        sql: String,
        /// exclusive, deferred or immediate.
        #[arg(long, default_value_t = TransactionMode::Exclusive)]
        mode: TransactionMode,
        /// Roll the transaction back instead of committing it.
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let loaded = match load_config(&cli) {
        Ok(config) => config,
        Err(errors) => {
            serialite_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    let config = match apply_overrides(&cli, loaded) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("serialite: {e}");
            std::process::exit(1);
        }
    };
    init_tracing(&config.logging.level);
    tracing::debug!(path = %config.database.path, "configuration loaded");

    let result = match cli.command {
        Commands::Status { json, plain } => status::run_status(&config, json, plain),
        Commands::Checkpoint { mode, schema, json } => {
            checkpoint::run_checkpoint(&config, mode, schema.as_deref(), json)
        }
        Commands::Exec { sql, mode, dry_run } => exec::run_exec(&config, &sql, mode, dry_run),
    };

    if let Err(e) = result {
        eprintln!("serialite: {e}");
        std::process::exit(1);
    }
}

/// Load configuration from `--config` or the XDG hierarchy.
fn load_config(cli: &Cli) -> Result<SerialiteConfig, Vec<ConfigError>> {
    match &cli.config {
        Some(path) => serialite_config::load_and_validate_path(path),
        None => serialite_config::load_and_validate(),
    }
}

/// Apply `--database` and check the result again.
fn apply_overrides(cli: &Cli, mut config: SerialiteConfig) -> Result<SerialiteConfig> {
    if let Some(path) = &cli.database {
        config.database.path = path.display().to_string();
        serialite_config::revalidate(&config)?;
    }
    Ok(config)
}

/// Open a queue on the configured database, creating its directory when allowed.
fn open_queue(config: &DatabaseConfig) -> Result<DatabaseQueue> {
    let path = std::path::Path::new(&config.path);
    if config.mode == OpenMode::ReadWriteCreate && !config.path.starts_with("file:") {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                SerialiteError::Internal(format!(
                    "failed to create database directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
    }
    DatabaseQueue::from_config(config)
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("serialite={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(true)
        .init();
}
