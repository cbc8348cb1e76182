//! In-memory transaction log
//!
//! Same contract as the file-backed log, minus the file. Appends happen
//! synchronously on the caller's thread. Clones share the same log, so a
//! test can keep one handle to inspect what another persisted.

use std::sync::Arc;

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;

use crate::error::{KeyvError, Result};

use super::reader::check_sequence;
use super::{Event, LogState, TransactionLog};

#[derive(Debug)]
struct MemoryLog {
    persisted: Vec<Event>,
    last_sequence: u64,
    state: LogState,
    /// Appends accepted since `run`
    appended: usize,
    /// Fail the append after this many have succeeded
    fail_after: Option<usize>,
}

/// Transaction log held entirely in memory
#[derive(Debug, Clone)]
pub struct MemoryTransactionLog {
    inner: Arc<Mutex<MemoryLog>>,
    errors_tx: Sender<KeyvError>,
    errors_rx: Receiver<KeyvError>,
}

impl Default for MemoryTransactionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTransactionLog {
    /// An empty log
    pub fn new() -> Self {
        Self::with_events(Vec::new())
    }

    /// A log that already holds `events`, as if persisted by an earlier run
    ///
    /// The events are kept verbatim so recovery sees exactly these sequences.
    pub fn with_events(events: Vec<Event>) -> Self {
        let (errors_tx, errors_rx) = channel::bounded(1);
        Self {
            inner: Arc::new(Mutex::new(MemoryLog {
                persisted: events,
                last_sequence: 0,
                state: LogState::Created,
                appended: 0,
                fail_after: None,
            })),
            errors_tx,
            errors_rx,
        }
    }

    /// Fault on the append following the first `count` successful ones
    pub fn fail_after(self, count: usize) -> Self {
        self.inner.lock().fail_after = Some(count);
        self
    }

    /// Everything persisted so far, in log order
    pub fn events(&self) -> Vec<Event> {
        self.inner.lock().persisted.clone()
    }

    fn append(&self, event: Event) {
        let mut log = self.inner.lock();
        match log.state {
            LogState::Active => {}
            LogState::Faulted => {
                tracing::warn!(key = %event.key, "transaction log faulted; event not persisted");
                return;
            }
            state => {
                tracing::warn!(key = %event.key, ?state, "transaction log is not running; event dropped");
                return;
            }
        }

        if log.fail_after == Some(log.appended) {
            log.state = LogState::Faulted;
            tracing::error!(last_sequence = log.last_sequence, "injected write failure");
            let _ = self
                .errors_tx
                .try_send(KeyvError::LogWrite("injected write failure".to_string()));
            return;
        }

        log.last_sequence += 1;
        let sequence = log.last_sequence;
        log.persisted.push(event.with_sequence(sequence));
        log.appended += 1;
    }
}

impl TransactionLog for MemoryTransactionLog {
    fn write_put(&self, key: &str, value: &str) {
        self.append(Event::put(key, value));
    }

    fn write_delete(&self, key: &str) {
        self.append(Event::delete(key));
    }

    fn errors(&self) -> Receiver<KeyvError> {
        self.errors_rx.clone()
    }

    fn read_events(&mut self) -> Box<dyn Iterator<Item = Result<Event>> + '_> {
        let mut log = self.inner.lock();
        if log.state != LogState::Created {
            let error = KeyvError::LogState(format!(
                "cannot read events while log is {:?}",
                log.state
            ));
            return Box::new(std::iter::once(Err(error)));
        }
        log.state = LogState::Recovering;
        drop(log);

        Box::new(MemoryEvents {
            log: &self.inner,
            index: 0,
            finished: false,
        })
    }

    fn run(&mut self) -> Result<()> {
        let mut log = self.inner.lock();
        if !matches!(log.state, LogState::Created | LogState::Recovering) {
            return Err(KeyvError::LogState(format!(
                "cannot run while log is {:?}",
                log.state
            )));
        }
        log.state = LogState::Active;
        log.appended = 0;
        Ok(())
    }

    fn state(&self) -> LogState {
        self.inner.lock().state
    }

    fn last_sequence(&self) -> u64 {
        self.inner.lock().last_sequence
    }

    fn close(&mut self) -> Result<()> {
        let mut log = self.inner.lock();
        if log.state != LogState::Faulted {
            log.state = LogState::Closed;
        }
        Ok(())
    }
}

/// Replays persisted events one at a time, checking order like the file reader
struct MemoryEvents<'a> {
    log: &'a Mutex<MemoryLog>,
    index: usize,
    finished: bool,
}

impl Iterator for MemoryEvents<'_> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut log = self.log.lock();
        let Some(event) = log.persisted.get(self.index).cloned() else {
            self.finished = true;
            return None;
        };
        self.index += 1;

        if let Err(e) = check_sequence(log.last_sequence, event.sequence, self.index as u64) {
            log.state = LogState::Faulted;
            self.finished = true;
            return Some(Err(e));
        }
        log.last_sequence = event.sequence;
        Some(Ok(event))
    }
}
