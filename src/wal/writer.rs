//! Transaction log write worker
//!
//! The only code that appends to the log file. Runs on its own thread and
//! drains the bounded event queue in order.

use std::fs::File;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{Receiver, Sender};
use parking_lot::Mutex;

use crate::config::LogSyncStrategy;
use crate::error::KeyvError;

use super::{Event, LogState};

/// Single writer for a log file
pub(crate) struct LogWorker {
    file: File,
    last_sequence: Arc<AtomicU64>,
    state: Arc<Mutex<LogState>>,
    sync_strategy: LogSyncStrategy,
    /// Appends since the last fsync
    unsynced: usize,
    errors: Sender<KeyvError>,
}

impl LogWorker {
    pub(crate) fn new(
        file: File,
        last_sequence: Arc<AtomicU64>,
        state: Arc<Mutex<LogState>>,
        sync_strategy: LogSyncStrategy,
        errors: Sender<KeyvError>,
    ) -> Self {
        Self {
            file,
            last_sequence,
            state,
            sync_strategy,
            unsynced: 0,
            errors,
        }
    }

    /// Start draining `events` on a dedicated thread
    pub(crate) fn spawn(self, events: Receiver<Event>) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("keyv-log-writer".to_string())
            .spawn(move || self.run(events))
    }

    fn run(mut self, events: Receiver<Event>) {
        tracing::debug!(
            last_sequence = self.last_sequence.load(Ordering::Acquire),
            "write worker started"
        );

        // Ends when every sender is dropped and the queue is empty
        for event in events.iter() {
            if let Err(e) = self.append(event) {
                self.fault(e);
                return;
            }
        }

        if self.unsynced > 0 && self.sync_strategy != LogSyncStrategy::OsManaged {
            if let Err(e) = self.sync() {
                self.fault(e);
                return;
            }
        }

        tracing::debug!(
            last_sequence = self.last_sequence.load(Ordering::Acquire),
            "write worker stopped"
        );
    }

    fn append(&mut self, event: Event) -> io::Result<()> {
        let sequence = self.last_sequence.load(Ordering::Acquire) + 1;
        let event = event.with_sequence(sequence);

        self.file.write_all(event.to_line().as_bytes())?;
        self.last_sequence.store(sequence, Ordering::Release);
        self.unsynced += 1;

        let strategy = self.sync_strategy;
        match strategy {
            LogSyncStrategy::EveryWrite => self.sync()?,
            LogSyncStrategy::EveryNEntries { count } if self.unsynced >= count => self.sync()?,
            _ => {}
        }

        tracing::trace!(sequence, kind = ?event.kind, key = %event.key, "appended event");
        Ok(())
    }

    fn sync(&mut self) -> io::Result<()> {
        self.file.sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Record the fault, report it once, and give up
    fn fault(self, error: io::Error) {
        *self.state.lock() = LogState::Faulted;
        tracing::error!(
            error = %error,
            last_sequence = self.last_sequence.load(Ordering::Acquire),
            "transaction log write failed; no further events will be persisted"
        );
        // Capacity 1 and only one fault per worker, so this cannot be full
        let _ = self.errors.try_send(KeyvError::LogWrite(error.to_string()));
    }
}
