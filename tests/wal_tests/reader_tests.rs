//! Tests for the event reader
//!
//! These tests verify:
//! - Reading events in file order
//! - Empty input handling
//! - Monotonic sequence enforcement
//! - Exactly one error, then nothing

use std::fs;
use std::io::Cursor;

use keyv::wal::{Event, EventKind, EventReader};
use keyv::KeyvError;
use tempfile::TempDir;

fn reader(contents: &str) -> EventReader<Cursor<Vec<u8>>> {
    EventReader::new(Cursor::new(contents.as_bytes().to_vec()), 0)
}

// =============================================================================
// Basic Reading Tests
// =============================================================================

#[test]
fn test_read_empty_input() {
    let mut reader = reader("");
    assert!(reader.next().is_none());
    assert_eq!(reader.last_sequence(), 0);
}

#[test]
fn test_read_multiple_events() {
    let contents = "1\t2\tk1\tv1\n2\t2\tk2\tv2\n3\t1\tk1\t\n";

    let events: Vec<Event> = reader(contents).map(|e| e.unwrap()).collect();

    assert_eq!(
        events,
        vec![
            Event::put("k1", "v1").with_sequence(1),
            Event::put("k2", "v2").with_sequence(2),
            Event::delete("k1").with_sequence(3),
        ]
    );
}

#[test]
fn test_read_last_line_without_newline() {
    let mut reader = reader("1\t2\tk\tv\n2\t2\tk\tw");

    assert_eq!(reader.next().unwrap().unwrap().sequence, 1);
    assert_eq!(reader.next().unwrap().unwrap().value, "w");
    assert!(reader.next().is_none());
}

#[test]
fn test_gaps_in_sequence_are_accepted() {
    let events: Vec<u64> = reader("1\t2\ta\tx\n5\t2\tb\ty\n9\t1\ta\t\n")
        .map(|e| e.unwrap().sequence)
        .collect();

    assert_eq!(events, vec![1, 5, 9]);
}

#[test]
fn test_tracks_last_sequence_and_line() {
    let mut reader = reader("4\t2\ta\tx\n6\t2\tb\ty\n");
    reader.next();
    reader.next();

    assert_eq!(reader.last_sequence(), 6);
    assert_eq!(reader.line_no(), 2);
}

#[test]
fn test_open_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("transaction.log");
    fs::write(&path, "1\t2\tfoo\tbar%20baz\n").unwrap();

    let events: Vec<Event> = EventReader::open(&path).unwrap().map(|e| e.unwrap()).collect();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::Put);
    assert_eq!(events[0].value, "bar baz");
}

#[test]
fn test_open_missing_file() {
    let temp = TempDir::new().unwrap();
    let result = EventReader::open(&temp.path().join("missing.log"));
    assert!(matches!(result, Err(KeyvError::Io(_))));
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_repeated_sequence_stops_reader() {
    let contents = "1\t2\ta\tx\n2\t2\tb\ty\n2\t2\tc\tz\n3\t2\td\tw\n";

    let items: Vec<_> = reader(contents).collect();

    assert_eq!(items.len(), 3);
    assert!(items[0].is_ok());
    assert!(items[1].is_ok());
    match &items[2] {
        Err(KeyvError::Corruption { line, .. }) => assert_eq!(*line, 3),
        other => panic!("expected corruption, got {:?}", other),
    }
}

#[test]
fn test_decreasing_sequence_stops_reader() {
    let mut reader = reader("5\t2\ta\tx\n4\t2\tb\ty\n");

    assert!(reader.next().unwrap().is_ok());
    assert!(reader.next().unwrap().is_err());
    assert!(reader.next().is_none());
    assert_eq!(reader.last_sequence(), 5);
}

#[test]
fn test_sequence_must_exceed_starting_point() {
    let mut reader = EventReader::new(Cursor::new(b"3\t2\ta\tx\n".to_vec()), 3);

    assert!(matches!(reader.next(), Some(Err(KeyvError::Corruption { line: 1, .. }))));
    assert!(reader.next().is_none());
}

#[test]
fn test_zero_sequence_is_rejected() {
    let mut reader = reader("0\t2\ta\tx\n");
    assert!(matches!(reader.next(), Some(Err(KeyvError::Corruption { .. }))));
}

#[test]
fn test_malformed_line_yields_single_error() {
    let items: Vec<_> = reader("1\t2\ta\tx\ngarbage\n2\t2\tb\ty\n").collect();

    assert_eq!(items.len(), 2);
    assert!(matches!(items[1], Err(KeyvError::Corruption { line: 2, .. })));
}

#[test]
fn test_invalid_utf8_is_corruption() {
    let mut bytes = b"1\t2\ta\tx\n".to_vec();
    bytes.extend_from_slice(&[0xff, 0xfe, b'\n']);
    let mut reader = EventReader::new(Cursor::new(bytes), 0);

    assert!(reader.next().unwrap().is_ok());
    assert!(matches!(
        reader.next(),
        Some(Err(KeyvError::Corruption { line: 2, .. }))
    ));
    assert!(reader.next().is_none());
}
