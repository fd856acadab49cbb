// SPDX-FileCopyrightText: 2026 Serialite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the serial access queue and its transaction,
//! savepoint and checkpoint wrappers.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use serialite_core::{CheckpointMode, SerialiteError, TransactionMode};
use serialite_test_utils::fixtures;
use serialite_test_utils::TestQueue;

/// Concurrent mixed sync/async units never overlap and keep per-submitter order.
#[test]
fn concurrent_units_are_serialized() {
    const THREADS: i64 = 8;
    const PER_THREAD: i64 = 25;

    let harness = TestQueue::new().unwrap();
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let queue = harness.queue();
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    let tag = t * 1_000 + i;
                    if i % 2 == 0 {
                        queue.in_database_async(move |db| {
                            fixtures::increment_counter(db)?;
                            fixtures::record(db, tag)
                        });
                    } else {
                        queue
                            .in_database(move |db| {
                                fixtures::increment_counter(db)?;
                                fixtures::record(db, tag)
                            })
                            .unwrap();
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let (count, tags) = harness
        .in_database(|db| Ok((fixtures::counter_value(db)?, fixtures::recorded(db)?)))
        .unwrap();
    assert_eq!(count, THREADS * PER_THREAD);
    assert_eq!(tags.len() as i64, THREADS * PER_THREAD);

    for t in 0..THREADS {
        let mine: Vec<i64> = tags.iter().copied().filter(|tag| tag / 1_000 == t).collect();
        let expected: Vec<i64> = (0..PER_THREAD).map(|i| t * 1_000 + i).collect();
        assert_eq!(mine, expected, "thread {t} units ran out of order");
    }
}

/// From a single submitter, sync and async units run in exactly submission order.
#[test]
fn mixed_submission_styles_keep_fifo_order() {
    let harness = TestQueue::new().unwrap();
    for tag in 0..20 {
        match tag % 3 {
            0 => harness.in_database_async(move |db| fixtures::record(db, tag)),
            1 => harness
                .in_database(move |db| fixtures::record(db, tag))
                .unwrap(),
            _ => harness.in_transaction_async(move |db, _| fixtures::record(db, tag)),
        }
    }
    let tags = harness.in_database(|db| fixtures::recorded(db)).unwrap();
    assert_eq!(tags, (0..20).collect::<Vec<_>>());
}

/// A synchronous unit's writes are on disk when the call returns.
#[test]
fn sync_submission_blocks_until_done() {
    let harness = TestQueue::new().unwrap();
    harness
        .in_database(|db| fixtures::insert_item(db, "alpha"))
        .unwrap();

    let conn = harness.inspect().unwrap();
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM items WHERE name = 'alpha'", [], |r| {
            r.get(0)
        })
        .unwrap();
    assert_eq!(n, 1);
}

/// An asynchronous submission returns before its unit runs; a later sync unit sees it.
#[test]
fn async_submission_does_not_block() {
    let harness = TestQueue::new().unwrap();
    let (gate_tx, gate_rx) = mpsc::channel::<()>();

    harness.in_database_async(move |db| {
        gate_rx.recv().unwrap();
        fixtures::insert_item(db, "late")
    });
    // Reaching this line at all shows the submitter was not blocked.
    assert_eq!(harness.pending_async(), 1);
    gate_tx.send(()).unwrap();

    let present = harness
        .in_database(|db| fixtures::has_item(db, "late"))
        .unwrap();
    assert!(present);
    assert_eq!(harness.pending_async(), 0);
}

/// Blocking submissions from inside a unit on the same queue fail fast.
#[test]
#[should_panic(expected = "reentrant `in_transaction`")]
fn reentrant_transaction_panics() {
    let harness = TestQueue::new().unwrap();
    let inner = harness.queue();
    let _ = harness.in_database(move |_| inner.in_transaction(|_, _| Ok(())));
}

#[test]
#[should_panic(expected = "reentrant `in_savepoint`")]
fn reentrant_savepoint_panics() {
    let harness = TestQueue::new().unwrap();
    let inner = harness.queue();
    let _ = harness.in_savepoint(move |_, _| inner.in_savepoint(|_, _| Ok(())));
}

/// Units on one queue may block on a different queue.
#[test]
fn cross_queue_submission_is_allowed() {
    let a = TestQueue::new().unwrap();
    let b = TestQueue::new().unwrap();
    let other = b.queue();
    a.in_database(move |_| other.in_database(|db| fixtures::insert_item(db, "from-a")))
        .unwrap();
    assert!(b.in_database(|db| fixtures::has_item(db, "from-a")).unwrap());
}

#[test]
fn transaction_commits_when_flag_is_clear() {
    let harness = TestQueue::new().unwrap();
    for (mode, name) in [
        (TransactionMode::Exclusive, "exclusive"),
        (TransactionMode::Deferred, "deferred"),
        (TransactionMode::Immediate, "immediate"),
    ] {
        harness
            .in_transaction_with(mode, move |db, _| fixtures::insert_item(db, name))
            .unwrap();
    }
    harness
        .in_transaction(|db, _| fixtures::insert_item(db, "default"))
        .unwrap();

    let names = harness.in_database(|db| fixtures::item_names(db)).unwrap();
    assert_eq!(names, ["exclusive", "deferred", "immediate", "default"]);
}

#[test]
fn transaction_rolls_back_when_flag_is_set() {
    let harness = TestQueue::new().unwrap();
    harness
        .in_immediate_transaction(|db, rollback| {
            fixtures::insert_item(db, "doomed")?;
            rollback.set();
            Ok(())
        })
        .unwrap();
    harness
        .in_deferred_transaction(|db, rollback| {
            fixtures::insert_item(db, "doomed-too")?;
            rollback.set();
            Ok(())
        })
        .unwrap();

    let names = harness.in_database(|db| fixtures::item_names(db)).unwrap();
    assert!(names.is_empty());
}

#[test]
fn async_transaction_rollback_is_applied_in_order() {
    let harness = TestQueue::new().unwrap();
    harness.in_exclusive_transaction_async(|db, _| fixtures::insert_item(db, "kept"));
    harness.in_immediate_transaction_async(|db, rollback| {
        fixtures::insert_item(db, "dropped")?;
        rollback.set();
        Ok(())
    });
    harness.in_deferred_transaction_async(|db, _| fixtures::insert_item(db, "kept-too"));

    let names = harness.in_database(|db| fixtures::item_names(db)).unwrap();
    assert_eq!(names, ["kept", "kept-too"]);
}

/// Failing units roll back their transaction and surface the error.
#[test]
fn transaction_error_rolls_back() {
    let harness = TestQueue::new().unwrap();
    let err = harness
        .in_transaction(|db, _| {
            fixtures::insert_item(db, "dup")?;
            fixtures::insert_item(db, "dup")
        })
        .unwrap_err();
    assert!(matches!(err, SerialiteError::Sqlite(_)));
    assert!(!harness.in_database(|db| fixtures::has_item(db, "dup")).unwrap());
}

/// Savepoint A keeps row X while nested savepoint B's row Y is rolled back.
#[test]
fn nested_savepoint_rollback() {
    let harness = TestQueue::new().unwrap();
    harness
        .in_savepoint(|db, _| {
            fixtures::insert_item(db, "X")?;
            db.in_savepoint(|db, rollback| {
                fixtures::insert_item(db, "Y")?;
                rollback.set();
                Ok(())
            })
        })
        .unwrap();

    let (x, y) = harness
        .in_database(|db| Ok((fixtures::has_item(db, "X")?, fixtures::has_item(db, "Y")?)))
        .unwrap();
    assert!(x);
    assert!(!y);
}

/// Savepoints nest inside an explicit transaction too.
#[test]
fn savepoint_inside_transaction() {
    let harness = TestQueue::new().unwrap();
    harness
        .in_transaction(|db, _| {
            fixtures::insert_item(db, "outer")?;
            db.in_savepoint(|db, _| fixtures::insert_item(db, "inner"))?;
            db.in_savepoint(|db, rollback| {
                fixtures::insert_item(db, "discarded")?;
                rollback.set();
                Ok(())
            })
        })
        .unwrap();

    let names = harness.in_database(|db| fixtures::item_names(db)).unwrap();
    assert_eq!(names, ["outer", "inner"]);
}

#[test]
fn async_savepoint_runs_before_later_sync_unit() {
    let harness = TestQueue::new().unwrap();
    harness.in_savepoint_async(|db, _| fixtures::insert_item(db, "sp-async"));
    assert!(
        harness
            .in_database(|db| fixtures::has_item(db, "sp-async"))
            .unwrap()
    );
}

/// After close, the accessor and the next unit reopen the same file.
#[test]
fn lazy_reopen_after_close() {
    let harness = TestQueue::new().unwrap();
    harness
        .in_database(|db| fixtures::insert_item(db, "persisted"))
        .unwrap();

    harness.close().unwrap();
    {
        let db = harness.database().expect("handle should reopen");
        assert!(db.is_open());
        assert_eq!(db.options().path(), harness.path());
        assert!(fixtures::has_item(&db, "persisted").unwrap());
    }

    harness.close().unwrap();
    assert!(
        harness
            .in_database(|db| fixtures::has_item(db, "persisted"))
            .unwrap()
    );
}

/// A unit that closes the handle itself is followed by a transparent reopen.
#[test]
fn externally_closed_handle_is_reopened() {
    let harness = TestQueue::new().unwrap();
    harness.in_database(|db| db.close()).unwrap();
    assert!(harness.in_database(|db| Ok(db.is_open())).unwrap());
}

/// Explicit close lets queued async units run first.
#[test]
fn close_drains_queued_async_units() {
    let harness = TestQueue::new().unwrap();
    for i in 0..10 {
        harness.in_database_async(move |db| fixtures::record(db, i));
    }
    harness.close().unwrap();
    assert_eq!(harness.pending_async(), 0);

    let tags = harness.in_database(|db| fixtures::recorded(db)).unwrap();
    assert_eq!(tags.len(), 10);
}

/// `interrupt` aborts a long-running statement from another thread.
#[test]
fn interrupt_aborts_running_statement() {
    let harness = TestQueue::new().unwrap();
    let queue = harness.queue();
    let worker = thread::spawn(move || {
        queue.in_database(|db| {
            let n: i64 = db.conn()?.query_row(
                "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c)
                 SELECT COUNT(*) FROM c",
                [],
                |r| r.get(0),
            )?;
            Ok(n)
        })
    });

    while !worker.is_finished() {
        harness.interrupt();
        thread::sleep(Duration::from_millis(10));
    }

    match worker.join().unwrap() {
        Err(SerialiteError::Sqlite(rusqlite::Error::SqliteFailure(e, _))) => {
            assert_eq!(e.code, rusqlite::ErrorCode::OperationInterrupted);
        }
        other => panic!("expected an interrupted statement, got {other:?}"),
    }

    // The queue keeps working afterwards.
    assert!(harness.in_database(|db| fixtures::counter_value(db)).is_ok());
}

#[test]
fn checkpoint_through_the_queue() {
    let harness = TestQueue::builder().wal_mode(true).build().unwrap();
    harness
        .in_database(|db| fixtures::insert_item(db, "walled"))
        .unwrap();

    let result = harness.checkpoint(CheckpointMode::Full, None).unwrap();
    assert!(!result.busy);
    assert!(result.log_frames.is_some());
    assert_eq!(result.log_frames, result.checkpointed_frames);
}

/// The awaitable API shares the same FIFO with blocking submissions.
#[tokio::test(flavor = "multi_thread")]
async fn call_is_ordered_with_async_units() {
    let harness = TestQueue::new().unwrap();
    harness.in_database_async(|db| fixtures::insert_item(db, "first"));
    let seen = harness
        .call(|db| fixtures::has_item(db, "first"))
        .await
        .unwrap();
    assert!(seen);
}

/// Holding the accessor guard counts as being inside the queue.
#[test]
#[should_panic(expected = "reentrant `in_transaction`")]
fn transaction_while_holding_the_guard_panics() {
    let harness = TestQueue::new().unwrap();
    let _db = harness.database().expect("handle should be open");
    let _ = harness.in_transaction(|_, _| Ok(()));
}

/// Blocking submissions work from a task running on a tokio worker thread.
#[tokio::test(flavor = "multi_thread")]
async fn blocking_api_inside_a_runtime() {
    let harness = TestQueue::new().unwrap();
    harness
        .in_transaction(|db, _| fixtures::insert_item(db, "from-task"))
        .unwrap();
    harness
        .in_savepoint(|db, _| fixtures::record(db, 7))
        .unwrap();
    let names = harness
        .call(|db| fixtures::item_names(db))
        .await
        .unwrap();
    assert_eq!(names, ["from-task"]);
    assert_eq!(harness.in_database(|db| fixtures::recorded(db)).unwrap(), [7]);
}
