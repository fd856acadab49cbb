// SPDX-FileCopyrightText: 2026 Serialite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `serialite checkpoint` command implementation.

use serialite_config::SerialiteConfig;
use serialite_core::{CheckpointMode, CheckpointResult, Result};

/// Run the `serialite checkpoint` command.
pub fn run_checkpoint(
    config: &SerialiteConfig,
    mode: CheckpointMode,
    schema: Option<&str>,
    json: bool,
) -> Result<()> {
    let queue = crate::open_queue(&config.database)?;
    let result = queue.checkpoint(mode, schema)?;
    queue.close()?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        println!("{}", describe(mode, &result));
    }
    Ok(())
}

/// One-line human summary of a checkpoint.
fn describe(mode: CheckpointMode, result: &CheckpointResult) -> String {
    match (result.log_frames, result.checkpointed_frames) {
        (Some(log), Some(done)) => {
            let busy = if result.busy { " (busy: another connection held a lock)" } else { "" };
            format!("checkpoint {mode}: {done} of {log} WAL frames checkpointed{busy}")
        }
        _ => format!("checkpoint {mode}: database is not in WAL mode, nothing to do"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_wal_counts() {
        let result = CheckpointResult::from_pragma(0, 12, 12);
        assert_eq!(
            describe(CheckpointMode::Truncate, &result),
            "checkpoint truncate: 12 of 12 WAL frames checkpointed"
        );
    }

    #[test]
    fn describes_busy_checkpoint() {
        let result = CheckpointResult::from_pragma(1, 12, 4);
        assert!(describe(CheckpointMode::Full, &result).ends_with("held a lock)"));
    }

    #[test]
    fn describes_rollback_journal() {
        let result = CheckpointResult::from_pragma(0, -1, -1);
        assert!(describe(CheckpointMode::Passive, &result).contains("not in WAL mode"));
    }
}
