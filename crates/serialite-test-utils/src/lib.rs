// SPDX-FileCopyrightText: 2026 Serialite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for serialite integration tests.
//!
//! - [`TestQueue`] - a queue on a throwaway database, optionally seeded with fixture tables
//! - [`fixtures`] - helpers that read and write the fixture tables from inside a unit of work

pub mod fixtures;
pub mod harness;

pub use harness::{TestQueue, TestQueueBuilder};
