// SPDX-FileCopyrightText: 2026 Serialite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness that owns a temporary database directory and a queue on it.

use std::ops::Deref;
use std::path::{Path, PathBuf};

use serialite_config::DatabaseConfig;
use serialite_core::{OpenMode, Result, SerialiteError};
use serialite_queue::DatabaseQueue;

use crate::fixtures;

/// Builder for [`TestQueue`].
pub struct TestQueueBuilder {
    file_name: String,
    wal_mode: bool,
    with_fixtures: bool,
}

impl TestQueueBuilder {
    fn new() -> Self {
        Self {
            file_name: "test.db".to_string(),
            wal_mode: false,
            with_fixtures: true,
        }
    }

    /// Name of the database file inside the temp directory.
    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    /// Open the database in WAL mode.
    pub fn wal_mode(mut self, enabled: bool) -> Self {
        self.wal_mode = enabled;
        self
    }

    /// Skip creating the fixture tables.
    pub fn empty(mut self) -> Self {
        self.with_fixtures = false;
        self
    }

    pub fn build(self) -> Result<TestQueue> {
        let temp_dir = tempfile::TempDir::new()
            .map_err(|e| SerialiteError::Internal(format!("failed to create temp dir: {e}")))?;
        let path = temp_dir.path().join(&self.file_name);

        let config = DatabaseConfig {
            mode: OpenMode::ReadWriteCreate,
            busy_timeout_ms: 1_000,
            wal_mode: self.wal_mode,
            ..DatabaseConfig::at(path.display().to_string())
        };
        let queue = DatabaseQueue::from_config(&config)?;

        if self.with_fixtures {
            queue.in_database(fixtures::create_tables)?;
        }
        tracing::debug!(path = %path.display(), "test queue ready");

        Ok(TestQueue {
            queue,
            path,
            _temp_dir: temp_dir,
        })
    }
}

/// A queue on a database that is deleted when the harness is dropped.
///
/// Derefs to [`DatabaseQueue`].
pub struct TestQueue {
    queue: DatabaseQueue,
    path: PathBuf,
    _temp_dir: tempfile::TempDir,
}

impl TestQueue {
    /// A queue with the fixture tables created, rollback journal.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> TestQueueBuilder {
        TestQueueBuilder::new()
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A clone of the queue, for moving into threads.
    pub fn queue(&self) -> DatabaseQueue {
        self.queue.clone()
    }

    /// Open a separate, read-only connection to inspect the file directly.
    pub fn inspect(&self) -> Result<rusqlite::Connection> {
        Ok(rusqlite::Connection::open_with_flags(
            &self.path,
            OpenMode::ReadOnly.flags(),
        )?)
    }
}

impl Deref for TestQueue {
    type Target = DatabaseQueue;

    fn deref(&self) -> &DatabaseQueue {
        &self.queue
    }
}
