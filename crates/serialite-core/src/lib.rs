// SPDX-FileCopyrightText: 2026 Serialite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the serialite database queue.
//!
//! This crate provides the error type and the small vocabulary types
//! (transaction modes, checkpoint modes, open modes) shared by the queue,
//! the configuration system and the command-line tool.

pub mod error;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{Result, SerialiteError};
pub use types::{CheckpointMode, CheckpointResult, OpenMode, TransactionMode};
