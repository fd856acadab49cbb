// SPDX-FileCopyrightText: 2026 Serialite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the queue, configuration and CLI.

use rusqlite::OpenFlags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Locking strategy requested when a transaction begins.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransactionMode {
    /// Locks are acquired lazily on first read or write.
    Deferred,
    /// A write lock is acquired immediately.
    Immediate,
    /// An exclusive lock is acquired immediately.
    #[default]
    Exclusive,
}

impl TransactionMode {
    /// The statement that opens a transaction in this mode.
    pub fn begin_sql(self) -> &'static str {
        match self {
            Self::Deferred => "BEGIN DEFERRED TRANSACTION",
            Self::Immediate => "BEGIN IMMEDIATE TRANSACTION",
            Self::Exclusive => "BEGIN EXCLUSIVE TRANSACTION",
        }
    }
}

/// How aggressively a WAL checkpoint waits for or blocks other connections.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CheckpointMode {
    /// Checkpoint as many frames as possible without waiting.
    #[default]
    Passive,
    /// Wait for writers, then checkpoint every frame.
    Full,
    /// Like `Full`, then wait until readers are done with the log.
    Restart,
    /// Like `Restart`, then truncate the log file to zero bytes.
    Truncate,
}

impl CheckpointMode {
    /// The keyword passed to `PRAGMA wal_checkpoint`.
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Passive => "PASSIVE",
            Self::Full => "FULL",
            Self::Restart => "RESTART",
            Self::Truncate => "TRUNCATE",
        }
    }
}

/// Outcome of a WAL checkpoint.
///
/// Frame counts are `None` when the database is not in WAL mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckpointResult {
    /// The checkpoint could not complete because another connection held a lock.
    pub busy: bool,
    /// Number of frames in the write-ahead log.
    pub log_frames: Option<u32>,
    /// Number of frames copied back into the database file.
    pub checkpointed_frames: Option<u32>,
}

impl CheckpointResult {
    /// Build from the three integers returned by `PRAGMA wal_checkpoint`.
    pub fn from_pragma(busy: i64, log: i64, checkpointed: i64) -> Self {
        Self {
            busy: busy != 0,
            log_frames: u32::try_from(log).ok(),
            checkpointed_frames: u32::try_from(checkpointed).ok(),
        }
    }
}

/// Access mode used when opening the database file.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OpenMode {
    ReadOnly,
    ReadWrite,
    #[default]
    ReadWriteCreate,
}

impl OpenMode {
    /// SQLite open flags for this mode.
    ///
    /// `NO_MUTEX` is always set: the queue serializes every access itself.
    pub fn flags(self) -> OpenFlags {
        let base = OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        match self {
            Self::ReadOnly => base | OpenFlags::SQLITE_OPEN_READ_ONLY,
            Self::ReadWrite => base | OpenFlags::SQLITE_OPEN_READ_WRITE,
            Self::ReadWriteCreate => {
                base | OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
            }
        }
    }
}
