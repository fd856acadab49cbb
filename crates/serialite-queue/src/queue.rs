// SPDX-FileCopyrightText: 2026 Serialite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The serial access queue.
//!
//! All access to the [`Database`] is funnelled through one worker thread fed
//! by a FIFO channel, so units of work never overlap and run in the order they
//! were submitted, whether they were submitted synchronously or not. Each
//! job runs inside the tracing span that was current when it was submitted.
//!
//! **Do NOT open a second `Connection` to the same file for writes alongside a
//! queue.** The queue is the single writer.

use std::any::Any;
use std::ops::{Deref, DerefMut};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::sync_channel;
use std::sync::{Arc, Weak};
use std::thread;

use parking_lot::{Mutex, MutexGuard};
use rusqlite::{InterruptHandle, OpenFlags};
use serialite_config::DatabaseConfig;
use serialite_core::{Result, SerialiteError};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, trace, warn, Span};

use crate::context;
use crate::database::{Database, OpenOptions};

/// Exclusive access to a queue's handle outside of a unit of work.
///
/// While the guard is alive the holding thread is tagged as inside the queue,
/// so a blocking submission to the same queue from that thread panics instead
/// of waiting on a worker that waits on the guard.
pub struct DatabaseGuard<'a> {
    db: MutexGuard<'a, Database>,
    previous_tag: Option<u64>,
}

impl<'a> DatabaseGuard<'a> {
    fn new(id: u64, db: MutexGuard<'a, Database>) -> Self {
        Self {
            db,
            previous_tag: context::replace(Some(id)),
        }
    }
}

impl Deref for DatabaseGuard<'_> {
    type Target = Database;

    fn deref(&self) -> &Database {
        &self.db
    }
}

impl DerefMut for DatabaseGuard<'_> {
    fn deref_mut(&mut self) -> &mut Database {
        &mut self.db
    }
}

impl Drop for DatabaseGuard<'_> {
    fn drop(&mut self) {
        context::replace(self.previous_tag);
    }
}

type Job = Box<dyn FnOnce() + Send + 'static>;

/// What a unit of work produced: its own result, or the payload of its panic.
type Outcome<R> = std::result::Result<Result<R>, Box<dyn Any + Send + 'static>>;

struct Shared {
    id: u64,
    db: Mutex<Database>,
    interrupt: Mutex<Option<InterruptHandle>>,
    pending_async: AtomicUsize,
    sender: mpsc::UnboundedSender<Job>,
}

impl Shared {
    /// Reopen the handle if something closed it. Called with the handle locked.
    fn ensure_open(&self, db: &mut Database) -> Result<()> {
        if db.is_open() {
            return Ok(());
        }
        match db.reopen() {
            Ok(()) => {
                *self.interrupt.lock() = db.interrupt_handle();
                Ok(())
            }
            Err(e) => {
                error!(queue_id = self.id, error = %e, "failed to reopen database");
                Err(e)
            }
        }
    }

    /// Run one unit of work against the handle. Only ever called on the worker.
    fn run<R>(&self, reopen: bool, unit: impl FnOnce(&mut Database) -> Result<R>) -> Outcome<R> {
        let mut db = self.db.lock();
        if reopen {
            if let Err(e) = self.ensure_open(&mut db) {
                return Ok(Err(e));
            }
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| unit(&mut db)));
        if outcome.is_err() {
            db.recover_after_panic();
        }
        if db.has_open_result_sets() {
            warn!(
                queue_id = self.id,
                "unit of work finished with statements still in progress; \
                 drop every Rows/Statement before returning"
            );
        }
        outcome
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        if let Err(e) = self.db.get_mut().close() {
            warn!(queue_id = self.id, error = %e, "failed to close database on queue drop");
        }
        debug!(queue_id = self.id, "database queue dropped");
    }
}

/// A handle to a serial access queue. Cloning is cheap and shares the queue.
///
/// The database handle is closed when the last clone is dropped. Asynchronous
/// units still waiting at that point are discarded; call [`close`](Self::close)
/// first to let them run.
#[derive(Clone)]
pub struct DatabaseQueue {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for DatabaseQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseQueue")
            .field("id", &self.shared.id)
            .field("pending_async", &self.pending_async())
            .finish()
    }
}

impl DatabaseQueue {
    /// Open a read-write-create queue on `path` with [`OpenOptions::new`] defaults.
    ///
    /// Unlike [`from_config`](Self::from_config), this does not switch the file to WAL.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_options(OpenOptions::new(path))
    }

    /// Open a queue with explicit SQLite flags and an optional VFS name.
    pub fn open(path: impl AsRef<Path>, flags: OpenFlags, vfs: Option<&str>) -> Result<Self> {
        let options = OpenOptions::new(path).flags(flags);
        Self::with_options(match vfs {
            Some(vfs) => options.vfs(vfs),
            None => options,
        })
    }

    /// Open a queue from the `[database]` configuration section.
    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        Self::with_options(OpenOptions::from(config))
    }

    /// Open the handle eagerly and start the worker thread.
    ///
    /// Fails without spawning anything if the database cannot be opened.
    pub fn with_options(options: OpenOptions) -> Result<Self> {
        let db = Database::open(options)?;
        let id = context::next_queue_id();
        let (sender, receiver) = mpsc::unbounded_channel();
        spawn_worker(id, receiver)?;

        debug!(queue_id = id, path = %db.options().path().display(), "database queue started");
        Ok(Self {
            shared: Arc::new(Shared {
                id,
                interrupt: Mutex::new(db.interrupt_handle()),
                db: Mutex::new(db),
                pending_async: AtomicUsize::new(0),
                sender,
            }),
        })
    }

    /// Process-unique id of this queue.
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// Whether the calling thread holds this queue's handle: inside one of its
    /// units, or while holding a [`DatabaseGuard`].
    pub fn is_current_context(&self) -> bool {
        context::is_current(self.shared.id)
    }

    /// Number of asynchronous units submitted but not yet finished.
    pub fn pending_async(&self) -> usize {
        self.shared.pending_async.load(Ordering::SeqCst)
    }

    /// Run `unit` on the worker and block until it returns.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a unit of work running on this same queue,
    /// which would otherwise deadlock. A panic inside `unit` is resumed here.
    #[track_caller]
    pub fn in_database<R, F>(&self, unit: F) -> Result<R>
    where
        F: FnOnce(&mut Database) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        context::assert_not_reentrant(self.shared.id, "in_database");
        self.submit_sync(true, unit)
    }

    /// Queue `unit` and return immediately.
    ///
    /// Errors and panics from `unit` are logged, never returned.
    pub fn in_database_async<F>(&self, unit: F)
    where
        F: FnOnce(&mut Database) -> Result<()> + Send + 'static,
    {
        self.submit_async("unit of work", unit);
    }

    /// Run `unit` on the worker and await its result without blocking the caller's thread.
    pub async fn call<R, F>(&self, unit: F) -> Result<R>
    where
        F: FnOnce(&mut Database) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        context::assert_not_reentrant(self.shared.id, "call");
        let (tx, rx) = oneshot::channel();
        let shared = Arc::clone(&self.shared);
        let span = Span::current();
        self.dispatch(Box::new(move || {
            let _entered = span.enter();
            let _ = tx.send(shared.run(true, unit));
        }))?;
        match rx.await {
            Ok(outcome) => unwrap_outcome(outcome),
            Err(_) => Err(SerialiteError::Disconnected),
        }
    }

    /// Exclusive access to the handle from outside the queue, reopening it if needed.
    ///
    /// Returns `None` (and logs) if the handle cannot be reopened. The worker is
    /// stalled for as long as the guard lives, so keep it short. Blocking
    /// submissions to this queue from the guard's thread panic until it is dropped.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a unit of work running on this queue.
    #[track_caller]
    pub fn database(&self) -> Option<DatabaseGuard<'_>> {
        context::assert_not_reentrant(self.shared.id, "database");
        let mut db = self.shared.db.lock();
        self.shared.ensure_open(&mut db).ok()?;
        Some(DatabaseGuard::new(self.shared.id, db))
    }

    /// Close the handle once every previously submitted unit has run.
    ///
    /// Logs a warning if asynchronous units are still outstanding. The queue
    /// stays usable; the next unit reopens the handle.
    #[track_caller]
    pub fn close(&self) -> Result<()> {
        context::assert_not_reentrant(self.shared.id, "close");
        let pending = self.pending_async();
        if pending > 0 {
            warn!(
                queue_id = self.shared.id,
                pending, "closing database queue with asynchronous work still pending"
            );
        }
        let shared = Arc::clone(&self.shared);
        self.submit_sync(false, move |db| {
            db.close()?;
            *shared.interrupt.lock() = None;
            Ok(())
        })
    }

    /// Ask SQLite to abort whatever statement the worker is running.
    ///
    /// Safe to call from any thread at any time; a no-op when the handle is closed.
    pub fn interrupt(&self) {
        if let Some(handle) = self.shared.interrupt.lock().as_ref() {
            trace!(queue_id = self.shared.id, "interrupting database");
            handle.interrupt();
        }
    }

    /// Blocks on a std channel, so it is safe on threads that drive a tokio runtime.
    pub(crate) fn submit_sync<R, F>(&self, reopen: bool, unit: F) -> Result<R>
    where
        F: FnOnce(&mut Database) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = sync_channel(1);
        let shared = Arc::clone(&self.shared);
        let span = Span::current();
        self.dispatch(Box::new(move || {
            let _entered = span.enter();
            let _ = tx.send(shared.run(reopen, unit));
        }))?;
        match rx.recv() {
            Ok(outcome) => unwrap_outcome(outcome),
            Err(_) => Err(SerialiteError::Disconnected),
        }
    }

    pub(crate) fn submit_async<F>(&self, what: &'static str, unit: F)
    where
        F: FnOnce(&mut Database) -> Result<()> + Send + 'static,
    {
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let queue_id = self.shared.id;
        let span = Span::current();
        self.shared.pending_async.fetch_add(1, Ordering::SeqCst);

        let job = Box::new(move || {
            let _entered = span.enter();
            let Some(shared) = weak.upgrade() else {
                trace!(queue_id, "queue dropped before asynchronous {what} ran; skipping");
                return;
            };
            let outcome = shared.run(true, unit);
            shared.pending_async.fetch_sub(1, Ordering::SeqCst);
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(queue_id, error = %e, "asynchronous {what} failed"),
                Err(panic) => error!(
                    queue_id,
                    panic = panic_message(panic.as_ref()),
                    "asynchronous {what} panicked"
                ),
            }
        });

        if let Err(e) = self.dispatch(job) {
            self.shared.pending_async.fetch_sub(1, Ordering::SeqCst);
            error!(queue_id, error = %e, "failed to schedule asynchronous {what}");
        }
    }

    fn dispatch(&self, job: Job) -> Result<()> {
        self.shared
            .sender
            .send(job)
            .map_err(|_| SerialiteError::Disconnected)
    }
}

fn spawn_worker(id: u64, mut receiver: mpsc::UnboundedReceiver<Job>) -> Result<()> {
    thread::Builder::new()
        .name(format!("serialite-queue-{id}"))
        .spawn(move || {
            context::enter(id);
            while let Some(job) = receiver.blocking_recv() {
                job();
            }
            debug!(queue_id = id, "database queue worker exiting");
        })
        .map(drop)
        .map_err(|e| SerialiteError::Internal(format!("failed to spawn queue worker: {e}")))
}

fn unwrap_outcome<R>(outcome: Outcome<R>) -> Result<R> {
    match outcome {
        Ok(result) => result,
        Err(panic) => panic::resume_unwind(panic),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}
