// SPDX-FileCopyrightText: 2026 Serialite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Execution-context tagging used to catch reentrant submissions.
//!
//! Each queue worker thread is tagged with its queue's id for its whole
//! lifetime. A blocking submission made from a thread carrying the same tag
//! would wait on itself forever, so it is turned into a panic instead.

use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_QUEUE_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static CURRENT_QUEUE: Cell<Option<u64>> = const { Cell::new(None) };
}

/// Allocate a process-unique queue id.
pub(crate) fn next_queue_id() -> u64 {
    NEXT_QUEUE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Tag the calling thread as the worker of queue `id`.
pub(crate) fn enter(id: u64) {
    CURRENT_QUEUE.with(|current| current.set(Some(id)));
}

/// Replace the calling thread's tag, returning the one it had.
pub(crate) fn replace(tag: Option<u64>) -> Option<u64> {
    CURRENT_QUEUE.with(|current| current.replace(tag))
}

/// Id of the queue whose worker is the calling thread, if any.
pub fn current_queue() -> Option<u64> {
    CURRENT_QUEUE.with(Cell::get)
}

/// Whether the calling thread is the worker of queue `id`.
pub fn is_current(id: u64) -> bool {
    current_queue() == Some(id)
}

/// Panic if a blocking `operation` on queue `id` is issued from its own worker.
#[track_caller]
pub(crate) fn assert_not_reentrant(id: u64, operation: &str) {
    if is_current(id) {
        panic!(
            "reentrant `{operation}` on database queue {id}: the calling thread already \
             holds the queue's database (inside one of its units of work or through a \
             `database()` guard), so waiting on the queue would deadlock"
        );
    }
}
