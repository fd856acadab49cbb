// SPDX-FileCopyrightText: 2026 Serialite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WAL checkpoints run through the queue.

use serialite_core::{CheckpointMode, CheckpointResult, Result};

use crate::queue::DatabaseQueue;

impl DatabaseQueue {
    /// Checkpoint the write-ahead log, serialized with every other unit of work.
    ///
    /// `schema` names one attached database; `None` checkpoints all of them.
    /// The engine's result and error are returned unchanged.
    #[track_caller]
    pub fn checkpoint(&self, mode: CheckpointMode, schema: Option<&str>) -> Result<CheckpointResult> {
        crate::context::assert_not_reentrant(self.id(), "checkpoint");
        let schema = schema.map(str::to_owned);
        self.submit_sync(true, move |db| db.checkpoint(mode, schema.as_deref()))
    }
}
