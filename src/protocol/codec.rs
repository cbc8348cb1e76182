//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol. Every frame is a
//! one-byte tag, a four-byte big-endian payload length, and the payload.

use std::io::{Read, Write};

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{KeyvError, Result};

use super::{Command, CommandType, Response, Status};

/// Header size: 1 byte command/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

fn encode_frame(tag: u8, payload: &[u8]) -> Vec<u8> {
    let mut frame = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    frame.put_u8(tag);
    frame.put_u32(payload.len() as u32);
    frame.put_slice(payload);
    frame.to_vec()
}

/// Split a complete frame into its tag and payload
fn decode_frame(mut bytes: &[u8]) -> Result<(u8, &[u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(KeyvError::Protocol(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let tag = bytes.get_u8();
    let payload_len = bytes.get_u32();
    check_payload_len(payload_len)?;

    let payload_len = payload_len as usize;
    if bytes.len() < payload_len {
        return Err(KeyvError::Protocol(format!(
            "Incomplete payload: expected {} bytes, got {}",
            payload_len,
            bytes.len()
        )));
    }

    Ok((tag, &bytes[..payload_len]))
}

fn check_payload_len(payload_len: u32) -> Result<()> {
    if payload_len > MAX_PAYLOAD_SIZE {
        return Err(KeyvError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        )));
    }
    Ok(())
}

/// Read one whole frame (header + payload) from a stream
fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = (&header[1..]).get_u32();
    check_payload_len(payload_len)?;

    let mut frame = vec![0u8; HEADER_SIZE + payload_len as usize];
    frame[..HEADER_SIZE].copy_from_slice(&header);
    reader.read_exact(&mut frame[HEADER_SIZE..])?;
    Ok(frame)
}

fn to_utf8(bytes: &[u8], what: &str) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| KeyvError::Protocol(format!("{} is not valid UTF-8", what)))
}

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
pub fn encode_command(command: &Command) -> Vec<u8> {
    let mut payload = BytesMut::new();
    if let Some(key) = command.key() {
        payload.put_u32(key.len() as u32);
        payload.put_slice(key.as_bytes());
    }
    if let Command::Put { value, .. } = command {
        payload.put_slice(value.as_bytes());
    }

    encode_frame(command.command_type() as u8, &payload)
}

/// Decode a command from a complete frame
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    let (tag, payload) = decode_frame(bytes)?;

    let command_type = CommandType::from_byte(tag)
        .ok_or_else(|| KeyvError::Protocol(format!("Unknown command type: 0x{:02x}", tag)))?;

    if command_type == CommandType::Ping {
        if !payload.is_empty() {
            return Err(KeyvError::Protocol(format!(
                "PING command: unexpected payload of {} bytes",
                payload.len()
            )));
        }
        return Ok(Command::Ping);
    }

    let (key, rest) = split_key(command_type, payload)?;
    match command_type {
        CommandType::Get => Ok(Command::Get { key }),
        CommandType::Delete => Ok(Command::Delete { key }),
        CommandType::Put => Ok(Command::Put {
            key,
            value: to_utf8(rest, "value")?,
        }),
        CommandType::Ping => Ok(Command::Ping),
    }
}

/// Parse `key_len (4) + key`, returning the key and the remaining bytes
fn split_key(command_type: CommandType, mut payload: &[u8]) -> Result<(String, &[u8])> {
    if payload.len() < 4 {
        return Err(KeyvError::Protocol(format!(
            "{:?} command: missing key length",
            command_type
        )));
    }

    let key_len = payload.get_u32() as usize;
    if payload.len() < key_len {
        return Err(KeyvError::Protocol(format!(
            "{:?} command: incomplete key (expected {}, got {})",
            command_type,
            key_len,
            payload.len()
        )));
    }

    let (key, rest) = payload.split_at(key_len);
    Ok((to_utf8(key, "key")?, rest))
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
pub fn encode_response(response: &Response) -> Vec<u8> {
    let payload = response.payload.as_deref().unwrap_or(&[]);
    encode_frame(response.status as u8, payload)
}

/// Decode a response from a complete frame
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (tag, payload) = decode_frame(bytes)?;

    let status = Status::from_byte(tag)
        .ok_or_else(|| KeyvError::Protocol(format!("Unknown response status: 0x{:02x}", tag)))?;

    let payload = if payload.is_empty() {
        None
    } else {
        Some(payload.to_vec())
    };

    Ok(Response { status, payload })
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete command from a stream
///
/// Blocks until a complete command is received or an error occurs
pub fn read_command<R: Read>(reader: &mut R) -> Result<Command> {
    decode_command(&read_frame(reader)?)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    writer.write_all(&encode_command(command))?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    decode_response(&read_frame(reader)?)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    writer.write_all(&encode_response(response))?;
    writer.flush()?;
    Ok(())
}
