//! Tests for log recovery
//!
//! These tests verify:
//! - Replay applies puts and deletes in order
//! - Replaying a persisted history reproduces the original store
//! - Corruption aborts recovery

use std::fs;

use keyv::config::LogSyncStrategy;
use keyv::wal::{Event, FileTransactionLog, LogRecovery, MemoryTransactionLog, TransactionLog};
use keyv::{KeyStore, KeyvError};
use tempfile::TempDir;

#[test]
fn test_replay_empty_log() {
    let mut log = MemoryTransactionLog::new();
    let store = KeyStore::new();

    let result = LogRecovery::replay(&mut log, &store).unwrap();

    assert_eq!(result.events_replayed, 0);
    assert_eq!(result.last_sequence, 0);
    assert!(store.is_empty());
}

#[test]
fn test_replay_applies_in_order() {
    let mut log = MemoryTransactionLog::with_events(vec![
        Event::put("a", "1").with_sequence(1),
        Event::put("b", "2").with_sequence(2),
        Event::put("a", "3").with_sequence(3),
        Event::delete("b").with_sequence(4),
        Event::delete("never-existed").with_sequence(5),
    ]);
    let store = KeyStore::new();

    let result = LogRecovery::replay(&mut log, &store).unwrap();

    assert_eq!(result.events_replayed, 5);
    assert_eq!(result.puts, 3);
    assert_eq!(result.deletes, 2);
    assert_eq!(result.last_sequence, 5);
    assert_eq!(store.get("a").unwrap(), "3");
    assert!(matches!(store.get("b"), Err(KeyvError::NotFound)));
}

#[test]
fn test_persisted_history_replays_to_same_state() {
    let temp = TempDir::new().unwrap();
    let log_path = temp.path().join("transaction.log");

    enum Op {
        Put(String, String),
        Delete(String),
    }

    let ops: Vec<Op> = (0..300)
        .map(|i| {
            let key = format!("key{}", i % 37);
            if i % 5 == 4 {
                Op::Delete(key)
            } else {
                Op::Put(key, format!("value {}\twith\ttabs\nand newline {}", i, i * 7))
            }
        })
        .collect();

    let direct = KeyStore::new();
    let mut log = FileTransactionLog::open(&log_path, LogSyncStrategy::OsManaged).unwrap();
    log.run().unwrap();
    for op in &ops {
        match op {
            Op::Put(key, value) => {
                direct.put(key.as_str(), value.as_str()).unwrap();
                log.write_put(key, value);
            }
            Op::Delete(key) => {
                direct.delete(key).unwrap();
                log.write_delete(key);
            }
        }
    }
    log.close().unwrap();

    let replayed = KeyStore::new();
    let mut log = FileTransactionLog::open(&log_path, LogSyncStrategy::OsManaged).unwrap();
    let result = LogRecovery::replay(&mut log, &replayed).unwrap();

    assert_eq!(result.events_replayed, ops.len() as u64);
    assert_eq!(result.last_sequence, ops.len() as u64);
    assert_eq!(replayed.snapshot(), direct.snapshot());
}

#[test]
fn test_corruption_aborts_replay() {
    let temp = TempDir::new().unwrap();
    let log_path = temp.path().join("transaction.log");
    fs::write(&log_path, "1\t2\ta\tx\n2\t2\tb\ty\n1\t2\tc\tz\n3\t2\td\tw\n").unwrap();

    let store = KeyStore::new();
    let mut log = FileTransactionLog::open(&log_path, LogSyncStrategy::EveryWrite).unwrap();
    let result = LogRecovery::replay(&mut log, &store);

    assert!(matches!(result, Err(KeyvError::Corruption { line: 3, .. })));
    assert!(!store.contains_key("c"));
    assert!(!store.contains_key("d"));
}

#[test]
fn test_bad_escape_aborts_replay() {
    let temp = TempDir::new().unwrap();
    let log_path = temp.path().join("transaction.log");
    fs::write(&log_path, "1\t2\ta\tbad%G1\n").unwrap();

    let store = KeyStore::new();
    let mut log = FileTransactionLog::open(&log_path, LogSyncStrategy::EveryWrite).unwrap();

    assert!(matches!(
        LogRecovery::replay(&mut log, &store),
        Err(KeyvError::Corruption { line: 1, .. })
    ));
    assert!(store.is_empty());
}
