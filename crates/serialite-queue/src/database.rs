// SPDX-FileCopyrightText: 2026 Serialite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The database handle: one SQLite connection with PRAGMA setup and lifecycle.
//!
//! A [`Database`] remembers how it was opened so it can be closed and later
//! reopened against the same file with the same settings. It is not shared
//! across threads by itself; [`DatabaseQueue`](crate::DatabaseQueue) owns it
//! and hands it to one unit of work at a time.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, InterruptHandle, OpenFlags};
use serialite_config::DatabaseConfig;
use serialite_core::{
    CheckpointMode, CheckpointResult, OpenMode, Result, SerialiteError, TransactionMode,
};
use tracing::{debug, warn};

/// Settings applied every time a [`Database`] is opened or reopened.
#[derive(Debug, Clone)]
pub struct OpenOptions {
    path: PathBuf,
    flags: OpenFlags,
    vfs: Option<String>,
    busy_timeout: Option<Duration>,
    wal_mode: bool,
}

impl OpenOptions {
    /// Read-write-create access to `path`, a 5 second busy timeout, rollback journal.
    ///
    /// The journal mode of an existing file is left alone. Configuration-driven
    /// opens (`From<&DatabaseConfig>`) switch to WAL unless `database.wal_mode`
    /// is `false`; call [`wal_mode`](Self::wal_mode) to get the same here.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            flags: OpenMode::ReadWriteCreate.flags(),
            vfs: None,
            busy_timeout: Some(Duration::from_secs(5)),
            wal_mode: false,
        }
    }

    /// Use raw SQLite open flags.
    pub fn flags(mut self, flags: OpenFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Open through the named VFS.
    pub fn vfs(mut self, vfs: impl Into<String>) -> Self {
        self.vfs = Some(vfs.into());
        self
    }

    /// Busy timeout to install, or `None` to keep SQLite's default of failing immediately.
    pub fn busy_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Switch to WAL journaling after opening.
    pub fn wal_mode(mut self, enabled: bool) -> Self {
        self.wal_mode = enabled;
        self
    }

    /// The database path or URI.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The SQLite open flags.
    pub fn open_flags(&self) -> OpenFlags {
        self.flags
    }

    /// The VFS name, if one was requested.
    pub fn vfs_name(&self) -> Option<&str> {
        self.vfs.as_deref()
    }

    fn connect(&self) -> Result<Connection> {
        let opened = match &self.vfs {
            Some(vfs) => Connection::open_with_flags_and_vfs(&self.path, self.flags, vfs.as_str()),
            None => Connection::open_with_flags(&self.path, self.flags),
        };
        let conn = opened.map_err(|source| self.open_error(source))?;

        if let Some(timeout) = self.busy_timeout {
            conn.busy_timeout(timeout)
                .map_err(|source| self.open_error(source))?;
        }
        if self.wal_mode {
            let mode: String = conn
                .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
                .map_err(|source| self.open_error(source))?;
            debug!(path = %self.path.display(), journal_mode = %mode, "journal mode set");
        }
        Ok(conn)
    }

    fn open_error(&self, source: rusqlite::Error) -> SerialiteError {
        SerialiteError::Open {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl From<&DatabaseConfig> for OpenOptions {
    fn from(config: &DatabaseConfig) -> Self {
        let options = OpenOptions::new(&config.path)
            .flags(config.mode.flags())
            .busy_timeout(Some(Duration::from_millis(config.busy_timeout_ms)))
            .wal_mode(config.wal_mode);
        match &config.vfs {
            Some(vfs) => options.vfs(vfs.clone()),
            None => options,
        }
    }
}

/// A SQLite connection that can be closed and reopened in place.
pub struct Database {
    options: OpenOptions,
    conn: Option<Connection>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.options.path)
            .field("open", &self.is_open())
            .finish()
    }
}

impl Database {
    /// Open a connection with the given options.
    pub fn open(options: OpenOptions) -> Result<Self> {
        let conn = options.connect()?;
        debug!(path = %options.path.display(), "database opened");
        Ok(Self {
            options,
            conn: Some(conn),
        })
    }

    /// Reopen a closed handle with its original path, flags and VFS.
    ///
    /// Does nothing if the handle is already open.
    pub fn reopen(&mut self) -> Result<()> {
        if self.conn.is_none() {
            self.conn = Some(self.options.connect()?);
            debug!(path = %self.options.path.display(), "database reopened");
        }
        Ok(())
    }

    /// Close the connection. Closing a closed handle is a no-op.
    ///
    /// If SQLite refuses to close (unfinalized statements), the handle stays open.
    pub fn close(&mut self) -> Result<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        match conn.close() {
            Ok(()) => {
                debug!(path = %self.options.path.display(), "database closed");
                Ok(())
            }
            Err((conn, err)) => {
                self.conn = Some(conn);
                Err(err.into())
            }
        }
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// The options this handle opens with.
    pub fn options(&self) -> &OpenOptions {
        &self.options
    }

    /// The underlying connection, for running statements.
    pub fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(SerialiteError::Closed)
    }

    /// Mutable access to the underlying connection.
    pub fn conn_mut(&mut self) -> Result<&mut Connection> {
        self.conn.as_mut().ok_or(SerialiteError::Closed)
    }

    /// Whether any prepared statement on this connection is mid-iteration.
    pub fn has_open_result_sets(&self) -> bool {
        self.conn.as_ref().is_some_and(Connection::is_busy)
    }

    /// Whether a transaction is currently open on this connection.
    pub fn in_transaction(&self) -> bool {
        self.conn.as_ref().is_some_and(|conn| !conn.is_autocommit())
    }

    /// A handle that can interrupt this connection from another thread.
    pub fn interrupt_handle(&self) -> Option<InterruptHandle> {
        self.conn.as_ref().map(Connection::get_interrupt_handle)
    }

    pub fn begin_transaction(&mut self, mode: TransactionMode) -> Result<()> {
        self.transaction_statement("begin", mode.begin_sql())
    }

    pub fn commit(&mut self) -> Result<()> {
        self.transaction_statement("commit", "COMMIT TRANSACTION")
    }

    pub fn rollback(&mut self) -> Result<()> {
        self.transaction_statement("rollback", "ROLLBACK TRANSACTION")
    }

    fn transaction_statement(&mut self, action: &'static str, sql: &str) -> Result<()> {
        self.conn()?
            .execute_batch(sql)
            .map_err(|source| SerialiteError::Transaction { action, source })
    }

    pub fn start_savepoint(&mut self, name: &str) -> Result<()> {
        self.savepoint_statement("start", name, "SAVEPOINT")
    }

    pub fn rollback_to_savepoint(&mut self, name: &str) -> Result<()> {
        self.savepoint_statement("roll back to", name, "ROLLBACK TO SAVEPOINT")
    }

    pub fn release_savepoint(&mut self, name: &str) -> Result<()> {
        self.savepoint_statement("release", name, "RELEASE SAVEPOINT")
    }

    fn savepoint_statement(&mut self, action: &'static str, name: &str, verb: &str) -> Result<()> {
        let sql = format!("{verb} {}", quote_identifier(name));
        self.conn()?
            .execute_batch(&sql)
            .map_err(|source| SerialiteError::Savepoint {
                action,
                name: name.to_string(),
                source,
            })
    }

    /// Run a WAL checkpoint on `schema` (every attached database when `None`).
    pub fn checkpoint(
        &mut self,
        mode: CheckpointMode,
        schema: Option<&str>,
    ) -> Result<CheckpointResult> {
        let sql = match schema {
            Some(schema) => format!(
                "PRAGMA {}.wal_checkpoint({})",
                quote_identifier(schema),
                mode.as_sql()
            ),
            None => format!("PRAGMA wal_checkpoint({})", mode.as_sql()),
        };
        let (busy, log, checkpointed) = self.conn()?.query_row(&sql, [], |row| {
            Ok((row.get::<_, i64>(0)?, row.get(1)?, row.get(2)?))
        })?;
        Ok(CheckpointResult::from_pragma(busy, log, checkpointed))
    }

    /// Roll back whatever a panicking unit of work left open.
    pub(crate) fn recover_after_panic(&mut self) {
        if self.in_transaction() {
            if let Err(e) = self.rollback() {
                warn!(
                    error = %e,
                    "failed to roll back transaction left open by a panicking unit of work"
                );
            }
        }
    }
}

/// Quote `name` as an SQL identifier.
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
