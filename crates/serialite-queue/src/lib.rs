// SPDX-FileCopyrightText: 2026 Serialite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serialized access to a single SQLite connection shared by many threads.
//!
//! A [`DatabaseQueue`] owns one [`Database`] handle and a dedicated worker
//! thread. Every unit of work, whether plain, transactional, a savepoint or a
//! checkpoint, is sent to that worker and runs alone, in submission order.
//! Synchronous submissions block until the unit finishes; asynchronous ones
//! return immediately.
//!
//! ```no_run
//! use serialite_queue::DatabaseQueue;
//!
//! # fn main() -> serialite_core::Result<()> {
//! let queue = DatabaseQueue::new("app.db")?;
//! queue.in_transaction(|db, _rollback| {
//!     db.conn()?.execute_batch("CREATE TABLE IF NOT EXISTS kv (k TEXT PRIMARY KEY, v TEXT)")?;
//!     Ok(())
//! })?;
//! # Ok(())
//! # }
//! ```

pub mod checkpoint;
pub mod context;
pub mod database;
pub mod queue;
pub mod savepoint;
pub mod transaction;

pub use database::{Database, OpenOptions};
pub use queue::{DatabaseGuard, DatabaseQueue};
pub use savepoint::savepoints_supported;
pub use serialite_core::{
    CheckpointMode, CheckpointResult, OpenMode, Result, SerialiteError, TransactionMode,
};
pub use transaction::RollbackFlag;
