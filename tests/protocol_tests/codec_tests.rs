//! Tests for the protocol codec
//!
//! These tests verify:
//! - Frame layout for each command and status
//! - Decoding errors for malformed frames
//! - Stream helpers over in-memory buffers

use std::io::Cursor;

use keyv::protocol::{
    decode_command, decode_response, encode_command, encode_response, read_command,
    read_response, write_command, write_response, Command, CommandType, Response, Status,
    HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
use keyv::KeyvError;

fn assert_protocol_error<T: std::fmt::Debug>(result: keyv::Result<T>) {
    match result {
        Err(KeyvError::Protocol(_)) => {}
        other => panic!("expected protocol error, got {:?}", other),
    }
}

// =============================================================================
// Command Encoding Tests
// =============================================================================

#[test]
fn test_encode_get_layout() {
    let bytes = encode_command(&Command::Get {
        key: "foo".to_string(),
    });

    assert_eq!(bytes[0], CommandType::Get as u8);
    assert_eq!(&bytes[1..5], &7u32.to_be_bytes());
    assert_eq!(&bytes[5..9], &3u32.to_be_bytes());
    assert_eq!(&bytes[9..], b"foo");
}

#[test]
fn test_encode_put_layout() {
    let bytes = encode_command(&Command::Put {
        key: "k".to_string(),
        value: "value".to_string(),
    });

    assert_eq!(bytes[0], 0x02);
    assert_eq!(bytes.len(), HEADER_SIZE + 4 + 1 + 5);
    assert_eq!(&bytes[HEADER_SIZE + 4..], b"kvalue");
}

#[test]
fn test_encode_ping_is_header_only() {
    let bytes = encode_command(&Command::Ping);
    assert_eq!(bytes, vec![0x04, 0, 0, 0, 0]);
}

#[test]
fn test_decode_commands() {
    let commands = vec![
        Command::Get {
            key: "get-key".to_string(),
        },
        Command::Put {
            key: "put key".to_string(),
            value: "multi\nline\tvalue ✓".to_string(),
        },
        Command::Put {
            key: String::new(),
            value: String::new(),
        },
        Command::Delete {
            key: "gone".to_string(),
        },
        Command::Ping,
    ];

    for command in commands {
        let decoded = decode_command(&encode_command(&command)).unwrap();
        assert_eq!(decoded, command);
    }
}

// =============================================================================
// Command Decoding Errors
// =============================================================================

#[test]
fn test_decode_incomplete_header() {
    assert_protocol_error(decode_command(&[0x01, 0, 0]));
}

#[test]
fn test_decode_unknown_command() {
    assert_protocol_error(decode_command(&[0x09, 0, 0, 0, 0]));
}

#[test]
fn test_decode_incomplete_payload() {
    assert_protocol_error(decode_command(&[0x01, 0, 0, 0, 10, 0, 0]));
}

#[test]
fn test_decode_payload_too_large() {
    let mut bytes = vec![0x02];
    bytes.extend_from_slice(&(MAX_PAYLOAD_SIZE + 1).to_be_bytes());
    assert_protocol_error(decode_command(&bytes));
}

#[test]
fn test_decode_missing_key_length() {
    assert_protocol_error(decode_command(&[0x01, 0, 0, 0, 2, 0, 0]));
}

#[test]
fn test_decode_key_longer_than_payload() {
    let mut bytes = vec![0x03, 0, 0, 0, 6];
    bytes.extend_from_slice(&10u32.to_be_bytes());
    bytes.extend_from_slice(b"ab");
    assert_protocol_error(decode_command(&bytes));
}

#[test]
fn test_decode_invalid_utf8_key() {
    let mut bytes = vec![0x01, 0, 0, 0, 6];
    bytes.extend_from_slice(&2u32.to_be_bytes());
    bytes.extend_from_slice(&[0xff, 0xfe]);
    assert_protocol_error(decode_command(&bytes));
}

#[test]
fn test_decode_ping_with_payload() {
    assert_protocol_error(decode_command(&[0x04, 0, 0, 0, 1, 0]));
}

// =============================================================================
// Response Tests
// =============================================================================

#[test]
fn test_encode_response_layout() {
    let bytes = encode_response(&Response::ok(Some(b"bar".to_vec())));
    assert_eq!(bytes, vec![0x00, 0, 0, 0, 3, b'b', b'a', b'r']);

    let bytes = encode_response(&Response::not_found());
    assert_eq!(bytes, vec![0x01, 0, 0, 0, 0]);
}

#[test]
fn test_decode_responses() {
    for response in [
        Response::ok(Some(b"value".to_vec())),
        Response::ok(None),
        Response::not_found(),
        Response::error("boom"),
    ] {
        assert_eq!(decode_response(&encode_response(&response)).unwrap(), response);
    }
}

#[test]
fn test_decode_unknown_status() {
    assert_protocol_error(decode_response(&[0x07, 0, 0, 0, 0]));
}

#[test]
fn test_error_payload_text() {
    let response = Response::error("no such key found");
    assert_eq!(response.status, Status::Error);
    assert_eq!(response.payload_text().as_deref(), Some("no such key found"));
}

// =============================================================================
// Stream Tests
// =============================================================================

#[test]
fn test_stream_multiple_commands() {
    let mut buffer = Vec::new();
    write_command(&mut buffer, &Command::Ping).unwrap();
    write_command(
        &mut buffer,
        &Command::Put {
            key: "a".to_string(),
            value: "b".to_string(),
        },
    )
    .unwrap();

    let mut cursor = Cursor::new(buffer);
    assert_eq!(read_command(&mut cursor).unwrap(), Command::Ping);
    assert_eq!(
        read_command(&mut cursor).unwrap(),
        Command::Put {
            key: "a".to_string(),
            value: "b".to_string(),
        }
    );

    match read_command(&mut cursor) {
        Err(KeyvError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
        other => panic!("expected EOF, got {:?}", other),
    }
}

#[test]
fn test_stream_response() {
    let mut buffer = Vec::new();
    write_response(&mut buffer, &Response::error("bad")).unwrap();

    let response = read_response(&mut Cursor::new(buffer)).unwrap();

    assert_eq!(response.status, Status::Error);
    assert_eq!(response.payload, Some(b"bad".to_vec()));
}

#[test]
fn test_stream_rejects_oversized_header() {
    let mut bytes = vec![0x01];
    bytes.extend_from_slice(&u32::MAX.to_be_bytes());

    assert_protocol_error(read_command(&mut Cursor::new(bytes)));
}
