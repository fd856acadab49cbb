// SPDX-FileCopyrightText: 2026 Serialite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transaction bracketing for units of work.
//!
//! A transactional unit receives a [`RollbackFlag`] alongside the handle. The
//! transaction is committed when the unit returns `Ok` with the flag clear, and
//! rolled back when the flag is set or the unit returns an error.

use serialite_core::{Result, TransactionMode};
use tracing::{debug, warn};

use crate::database::Database;
use crate::queue::DatabaseQueue;

/// Set by a unit of work to undo everything it did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RollbackFlag(bool);

impl RollbackFlag {
    /// Request a rollback when the unit returns.
    pub fn set(&mut self) {
        self.0 = true;
    }

    pub fn is_set(&self) -> bool {
        self.0
    }
}

impl Database {
    /// Run `unit` inside a transaction opened in `mode` on this handle.
    ///
    /// Begin, commit and rollback failures are returned. When the unit itself
    /// fails, its error wins and a failing rollback is only logged.
    pub fn run_transaction<R>(
        &mut self,
        mode: TransactionMode,
        unit: impl FnOnce(&mut Database, &mut RollbackFlag) -> Result<R>,
    ) -> Result<R> {
        self.begin_transaction(mode)?;

        let mut rollback = RollbackFlag::default();
        match unit(self, &mut rollback) {
            Ok(value) if !rollback.is_set() => {
                if let Err(e) = self.commit() {
                    if let Err(rollback_err) = self.rollback() {
                        warn!(error = %rollback_err, "rollback after failed commit also failed");
                    }
                    return Err(e);
                }
                debug!(%mode, "transaction committed");
                Ok(value)
            }
            Ok(value) => {
                self.rollback()?;
                debug!(%mode, "transaction rolled back on request");
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = self.rollback() {
                    warn!(error = %rollback_err, "rollback after failed unit of work also failed");
                }
                debug!(%mode, error = %e, "transaction rolled back after error");
                Err(e)
            }
        }
    }
}

impl DatabaseQueue {
    /// Run `unit` in an exclusive transaction, blocking until it completes.
    #[track_caller]
    pub fn in_transaction<R, F>(&self, unit: F) -> Result<R>
    where
        F: FnOnce(&mut Database, &mut RollbackFlag) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        self.in_transaction_with(TransactionMode::Exclusive, unit)
    }

    #[track_caller]
    pub fn in_exclusive_transaction<R, F>(&self, unit: F) -> Result<R>
    where
        F: FnOnce(&mut Database, &mut RollbackFlag) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        self.in_transaction_with(TransactionMode::Exclusive, unit)
    }

    #[track_caller]
    pub fn in_deferred_transaction<R, F>(&self, unit: F) -> Result<R>
    where
        F: FnOnce(&mut Database, &mut RollbackFlag) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        self.in_transaction_with(TransactionMode::Deferred, unit)
    }

    #[track_caller]
    pub fn in_immediate_transaction<R, F>(&self, unit: F) -> Result<R>
    where
        F: FnOnce(&mut Database, &mut RollbackFlag) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        self.in_transaction_with(TransactionMode::Immediate, unit)
    }

    /// Run `unit` in a transaction of the given mode, blocking until it completes.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a unit of work running on this queue.
    #[track_caller]
    pub fn in_transaction_with<R, F>(&self, mode: TransactionMode, unit: F) -> Result<R>
    where
        F: FnOnce(&mut Database, &mut RollbackFlag) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        crate::context::assert_not_reentrant(self.id(), "in_transaction");
        self.submit_sync(true, move |db| db.run_transaction(mode, unit))
    }

    /// Queue `unit` to run in an exclusive transaction and return immediately.
    pub fn in_transaction_async<F>(&self, unit: F)
    where
        F: FnOnce(&mut Database, &mut RollbackFlag) -> Result<()> + Send + 'static,
    {
        self.in_transaction_with_async(TransactionMode::Exclusive, unit);
    }

    pub fn in_exclusive_transaction_async<F>(&self, unit: F)
    where
        F: FnOnce(&mut Database, &mut RollbackFlag) -> Result<()> + Send + 'static,
    {
        self.in_transaction_with_async(TransactionMode::Exclusive, unit);
    }

    pub fn in_deferred_transaction_async<F>(&self, unit: F)
    where
        F: FnOnce(&mut Database, &mut RollbackFlag) -> Result<()> + Send + 'static,
    {
        self.in_transaction_with_async(TransactionMode::Deferred, unit);
    }

    pub fn in_immediate_transaction_async<F>(&self, unit: F)
    where
        F: FnOnce(&mut Database, &mut RollbackFlag) -> Result<()> + Send + 'static,
    {
        self.in_transaction_with_async(TransactionMode::Immediate, unit);
    }

    /// Queue `unit` to run in a transaction of the given mode. Failures are logged.
    pub fn in_transaction_with_async<F>(&self, mode: TransactionMode, unit: F)
    where
        F: FnOnce(&mut Database, &mut RollbackFlag) -> Result<()> + Send + 'static,
    {
        self.submit_async("transaction", move |db| db.run_transaction(mode, unit));
    }
}
