// SPDX-FileCopyrightText: 2026 Serialite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixture tables used across the integration tests.
//!
//! `items` holds named rows; `counter` holds a single integer that units of
//! work increment, and `log` records the order units ran in.

use rusqlite::{params, OptionalExtension};
use serialite_core::Result;
use serialite_queue::Database;

/// Create the fixture tables if they do not exist.
pub fn create_tables(db: &mut Database) -> Result<()> {
    db.conn()?.execute_batch(
        "CREATE TABLE IF NOT EXISTS items (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE);
         CREATE TABLE IF NOT EXISTS counter (id INTEGER PRIMARY KEY CHECK (id = 1), value INTEGER NOT NULL);
         INSERT OR IGNORE INTO counter (id, value) VALUES (1, 0);
         CREATE TABLE IF NOT EXISTS log (seq INTEGER PRIMARY KEY AUTOINCREMENT, tag INTEGER NOT NULL);",
    )?;
    Ok(())
}

pub fn insert_item(db: &mut Database, name: &str) -> Result<()> {
    db.conn()?
        .execute("INSERT INTO items (name) VALUES (?1)", params![name])?;
    Ok(())
}

pub fn has_item(db: &Database, name: &str) -> Result<bool> {
    let found = db
        .conn()?
        .query_row("SELECT 1 FROM items WHERE name = ?1", params![name], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

pub fn item_names(db: &Database) -> Result<Vec<String>> {
    let conn = db.conn()?;
    let mut stmt = conn.prepare("SELECT name FROM items ORDER BY id")?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(names)
}

/// Read-modify-write the counter in two statements, so overlapping units would lose updates.
pub fn increment_counter(db: &Database) -> Result<i64> {
    let conn = db.conn()?;
    let current: i64 = conn.query_row("SELECT value FROM counter WHERE id = 1", [], |r| r.get(0))?;
    conn.execute(
        "UPDATE counter SET value = ?1 WHERE id = 1",
        params![current + 1],
    )?;
    Ok(current + 1)
}

pub fn counter_value(db: &Database) -> Result<i64> {
    Ok(db
        .conn()?
        .query_row("SELECT value FROM counter WHERE id = 1", [], |r| r.get(0))?)
}

/// Append `tag` to the execution log.
pub fn record(db: &mut Database, tag: i64) -> Result<()> {
    db.conn()?
        .execute("INSERT INTO log (tag) VALUES (?1)", params![tag])?;
    Ok(())
}

/// Tags in the order they were recorded.
pub fn recorded(db: &Database) -> Result<Vec<i64>> {
    let conn = db.conn()?;
    let mut stmt = conn.prepare("SELECT tag FROM log ORDER BY seq")?;
    let tags = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;
    Ok(tags)
}
