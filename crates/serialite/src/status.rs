// SPDX-FileCopyrightText: 2026 Serialite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `serialite status` command implementation.
//!
//! Opens the configured database through a queue and reports its journal
//! mode, size and the capabilities of the linked SQLite library.

use std::io::IsTerminal;

use serde::Serialize;
use serialite_config::SerialiteConfig;
use serialite_core::{OpenMode, Result};
use serialite_queue::DatabaseQueue;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub path: String,
    pub mode: OpenMode,
    pub journal_mode: String,
    pub page_count: i64,
    pub page_size: i64,
    pub sqlite_version: String,
    pub savepoints_supported: bool,
}

impl StatusReport {
    /// Approximate size of the main database file.
    pub fn size_bytes(&self) -> i64 {
        self.page_count * self.page_size
    }
}

/// Gather the status of the database behind `queue`.
pub fn collect_status(queue: &DatabaseQueue, mode: OpenMode) -> Result<StatusReport> {
    queue.in_database(move |db| {
        let conn = db.conn()?;
        let journal_mode: String = conn.query_row("PRAGMA journal_mode", [], |r| r.get(0))?;
        let page_count: i64 = conn.query_row("PRAGMA page_count", [], |r| r.get(0))?;
        let page_size: i64 = conn.query_row("PRAGMA page_size", [], |r| r.get(0))?;
        Ok(StatusReport {
            path: db.options().path().display().to_string(),
            mode,
            journal_mode,
            page_count,
            page_size,
            sqlite_version: rusqlite::version().to_string(),
            savepoints_supported: serialite_queue::savepoints_supported(),
        })
    })
}

/// Run the `serialite status` command.
///
/// If `--json` is passed, outputs structured JSON for scripting.
/// If `--plain` is passed or stdout is not a TTY, disables colors.
pub fn run_status(config: &SerialiteConfig, json: bool, plain: bool) -> Result<()> {
    let queue = crate::open_queue(&config.database)?;
    let report = collect_status(&queue, config.database.mode)?;
    queue.close()?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print_status(&report, use_color);
    }
    Ok(())
}

fn print_status(report: &StatusReport, use_color: bool) {
    println!();
    println!("  serialite status");
    println!("  {}", "-".repeat(35));
    println!("    Path:       {}", report.path);
    println!("    Mode:       {}", report.mode);

    if use_color {
        use colored::Colorize;
        let journal = if report.journal_mode.eq_ignore_ascii_case("wal") {
            report.journal_mode.green()
        } else {
            report.journal_mode.yellow()
        };
        println!("    Journal:    {journal}");
    } else {
        println!("    Journal:    {}", report.journal_mode);
    }

    println!(
        "    Size:       {} pages x {} bytes ({} bytes)",
        report.page_count,
        report.page_size,
        report.size_bytes()
    );
    println!("    SQLite:     {}", report.sqlite_version);
    println!(
        "    Savepoints: {}",
        if report.savepoints_supported { "yes" } else { "no" }
    );
    println!();
}
