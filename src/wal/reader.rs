//! Transaction log reader
//!
//! Lazily parses persisted events line by line.

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Lines};
use std::path::Path;

use crate::error::{KeyvError, Result};

use super::Event;

/// Reject a sequence that does not move past the high-water mark
pub(crate) fn check_sequence(last_sequence: u64, sequence: u64, line_no: u64) -> Result<()> {
    if sequence <= last_sequence {
        return Err(KeyvError::corruption(
            line_no,
            format!(
                "sequence numbers out of order: {} does not follow {}",
                sequence, last_sequence
            ),
        ));
    }
    Ok(())
}

/// Iterator over the events of a log stream
///
/// Yields events one at a time, in file order. The first parse failure,
/// unescape failure, out-of-order sequence, or I/O error is yielded once as
/// an `Err`, after which the iterator is exhausted.
pub struct EventReader<R> {
    lines: Lines<R>,
    line_no: u64,
    last_sequence: u64,
    finished: bool,
}

impl EventReader<BufReader<File>> {
    /// Open a log file for reading from the start
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), 0))
    }
}

impl<R: BufRead> EventReader<R> {
    /// Read from `reader`; every sequence must exceed `last_sequence`
    pub fn new(reader: R, last_sequence: u64) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            last_sequence,
            finished: false,
        }
    }

    /// Highest sequence successfully read
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Number of lines consumed so far
    pub fn line_no(&self) -> u64 {
        self.line_no
    }

    fn next_event(&mut self) -> Option<Result<Event>> {
        let line = self.lines.next()?;
        self.line_no += 1;
        let line = match line {
            Ok(line) => line,
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Some(Err(KeyvError::corruption(
                    self.line_no,
                    "record is not valid UTF-8",
                )));
            }
            Err(e) => return Some(Err(KeyvError::Io(e))),
        };

        let result = Event::parse_line(&line, self.line_no).and_then(|event| {
            check_sequence(self.last_sequence, event.sequence, self.line_no)?;
            Ok(event)
        });

        if let Ok(event) = &result {
            self.last_sequence = event.sequence;
        }
        Some(result)
    }
}

impl<R: BufRead> Iterator for EventReader<R> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let item = self.next_event();
        if !matches!(item, Some(Ok(_))) {
            self.finished = true;
        }
        item
    }
}
