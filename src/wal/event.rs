//! Transaction log events
//!
//! One event per mutation, one line per event on disk.

use crate::error::{KeyvError, Result};

use super::escape::{escape, unescape};

/// Kind of mutation recorded by an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EventKind {
    Delete = 1,
    Put = 2,
}

impl EventKind {
    /// On-disk code for this kind
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(EventKind::Delete),
            2 => Some(EventKind::Put),
            _ => None,
        }
    }
}

/// A single mutation in the transaction log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Position in the log; 0 until the write worker assigns one
    pub sequence: u64,

    pub kind: EventKind,

    pub key: String,

    /// Unescaped value; empty for deletes
    pub value: String,
}

impl Event {
    /// A Put awaiting a sequence number
    pub fn put(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            sequence: 0,
            kind: EventKind::Put,
            key: key.into(),
            value: value.into(),
        }
    }

    /// A Delete awaiting a sequence number
    pub fn delete(key: impl Into<String>) -> Self {
        Self {
            sequence: 0,
            kind: EventKind::Delete,
            key: key.into(),
            value: String::new(),
        }
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Render the newline-terminated on-disk record
    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\n",
            self.sequence,
            self.kind.code(),
            escape(&self.key),
            escape(&self.value)
        )
    }

    /// Parse one record (without its line terminator)
    ///
    /// `line_no` is only used to label errors.
    pub fn parse_line(line: &str, line_no: u64) -> Result<Self> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 4 {
            return Err(KeyvError::corruption(
                line_no,
                format!("expected 4 tab-separated fields, found {}", fields.len()),
            ));
        }

        let sequence = fields[0].parse::<u64>().map_err(|e| {
            KeyvError::corruption(line_no, format!("bad sequence {:?}: {}", fields[0], e))
        })?;

        let kind = fields[1]
            .parse::<u8>()
            .ok()
            .and_then(EventKind::from_code)
            .ok_or_else(|| {
                KeyvError::corruption(line_no, format!("unknown event kind {:?}", fields[1]))
            })?;

        let key = unescape(fields[2]).map_err(|e| {
            KeyvError::corruption(line_no, format!("unable to unescape key {:?}: {}", fields[2], e))
        })?;

        let value = unescape(fields[3]).map_err(|e| {
            KeyvError::corruption(
                line_no,
                format!("unable to unescape value {:?}: {}", fields[3], e),
            )
        })?;

        Ok(Self {
            sequence,
            kind,
            key,
            value,
        })
    }
}
