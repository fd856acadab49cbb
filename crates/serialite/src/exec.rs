// SPDX-FileCopyrightText: 2026 Serialite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `serialite exec` command implementation.
//!
//! Runs a SQL batch inside one transaction on the queue. With `--dry-run` the
//! rollback flag is set, so the batch is validated against the live schema but
//! nothing is kept.

use serialite_config::SerialiteConfig;
use serialite_core::{Result, TransactionMode};
use serialite_queue::DatabaseQueue;
use tracing::info;

/// Execute `sql` in a `mode` transaction and return the number of rows changed.
pub fn exec_batch(
    queue: &DatabaseQueue,
    sql: &str,
    mode: TransactionMode,
    dry_run: bool,
) -> Result<u64> {
    let sql = sql.to_string();
    queue.in_transaction_with(mode, move |db, rollback| {
        let conn = db.conn()?;
        let before: i64 = conn.query_row("SELECT total_changes()", [], |r| r.get(0))?;
        conn.execute_batch(&sql)?;
        let after: i64 = conn.query_row("SELECT total_changes()", [], |r| r.get(0))?;
        if dry_run {
            rollback.set();
        }
        Ok(u64::try_from(after - before).unwrap_or(0))
    })
}

/// Run the `serialite exec` command.
pub fn run_exec(
    config: &SerialiteConfig,
    sql: &str,
    mode: TransactionMode,
    dry_run: bool,
) -> Result<()> {
    let queue = crate::open_queue(&config.database)?;
    let changed = exec_batch(&queue, sql, mode, dry_run)?;
    queue.close()?;

    info!(%mode, changed, dry_run, "batch executed");
    if dry_run {
        println!("{changed} row(s) would change ({mode} transaction rolled back)");
    } else {
        println!("{changed} row(s) changed ({mode} transaction committed)");
    }
    Ok(())
}
