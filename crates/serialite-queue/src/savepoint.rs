// SPDX-FileCopyrightText: 2026 Serialite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Savepoints: nestable sub-transactions with generated names.
//!
//! Names come from one process-wide counter, so they never repeat on any
//! connection. A started savepoint is always released exactly once, after a
//! `ROLLBACK TO` when the unit asked for a rollback or failed.
//!
//! When several steps fail, the first error is returned and the rest are logged.

use std::sync::atomic::{AtomicU64, Ordering};

use serialite_core::{Result, SerialiteError};
use tracing::{debug, warn};

use crate::database::Database;
use crate::queue::DatabaseQueue;
use crate::transaction::RollbackFlag;

/// First SQLite release with SAVEPOINT (3.6.8).
const SAVEPOINT_MIN_VERSION: i32 = 3_006_008;

static SAVEPOINT_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Whether the linked SQLite library understands SAVEPOINT.
pub fn savepoints_supported() -> bool {
    rusqlite::version_number() >= SAVEPOINT_MIN_VERSION
}

/// Generate a savepoint name not used before in this process.
pub fn next_savepoint_name() -> String {
    let n = SAVEPOINT_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("serialite_sp_{n}")
}

/// Keep the first error, logging a later one.
fn first_error(first: Result<()>, second: Result<()>) -> Result<()> {
    match (first, second) {
        (Err(first), Err(later)) => {
            warn!(error = %later, "savepoint cleanup failed after an earlier error");
            Err(first)
        }
        (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
        (Ok(()), Ok(())) => Ok(()),
    }
}

impl Database {
    /// Run `unit` inside a fresh savepoint on this handle.
    ///
    /// Usable from inside a unit of work that already holds the handle, which
    /// is how savepoints nest.
    pub fn in_savepoint<R>(
        &mut self,
        unit: impl FnOnce(&mut Database, &mut RollbackFlag) -> Result<R>,
    ) -> Result<R> {
        if !savepoints_supported() {
            warn!(
                sqlite_version = rusqlite::version(),
                "savepoints are not supported by the linked SQLite library"
            );
            return Err(SerialiteError::SavepointsUnsupported {
                version: rusqlite::version().to_string(),
            });
        }

        let name = next_savepoint_name();
        self.start_savepoint(&name)?;

        let mut rollback = RollbackFlag::default();
        let outcome = unit(self, &mut rollback);

        let resolution = if rollback.is_set() || outcome.is_err() {
            let rolled_back = self.rollback_to_savepoint(&name);
            let released = self.release_savepoint(&name);
            debug!(savepoint = %name, "savepoint rolled back");
            first_error(rolled_back, released)
        } else {
            self.release_savepoint(&name)
        };

        match outcome {
            Ok(value) => resolution.map(|()| value),
            Err(e) => {
                if let Err(later) = resolution {
                    warn!(savepoint = %name, error = %later, "savepoint cleanup failed after unit of work error");
                }
                Err(e)
            }
        }
    }
}

impl DatabaseQueue {
    /// Run `unit` inside a savepoint, blocking until it completes.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a unit of work running on this queue; use
    /// [`Database::in_savepoint`] on the handle you were given instead.
    #[track_caller]
    pub fn in_savepoint<R, F>(&self, unit: F) -> Result<R>
    where
        F: FnOnce(&mut Database, &mut RollbackFlag) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        crate::context::assert_not_reentrant(self.id(), "in_savepoint");
        self.submit_sync(true, move |db| db.in_savepoint(unit))
    }

    /// Queue `unit` to run inside a savepoint and return immediately. Failures are logged.
    pub fn in_savepoint_async<F>(&self, unit: F)
    where
        F: FnOnce(&mut Database, &mut RollbackFlag) -> Result<()> + Send + 'static,
    {
        self.submit_async("savepoint", move |db| db.in_savepoint(unit));
    }
}
