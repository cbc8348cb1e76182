//! File-backed transaction log

use std::fs::{File, OpenOptions};
use std::io::BufReader;
use std::iter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;

use crate::config::LogSyncStrategy;
use crate::error::{KeyvError, Result};

use super::reader::EventReader;
use super::writer::LogWorker;
use super::{Event, LogState, TransactionLog, DEFAULT_QUEUE_CAPACITY};

/// Transaction log stored in a single append-only file
///
/// The file is opened once. During recovery it is read sequentially by
/// [`read_events`](TransactionLog::read_events); [`run`](TransactionLog::run)
/// then hands it to a dedicated write worker, which owns it until
/// [`close`](TransactionLog::close) or a fatal error.
pub struct FileTransactionLog {
    path: PathBuf,

    /// Present until the write worker takes ownership
    file: Option<File>,

    sync_strategy: LogSyncStrategy,
    queue_capacity: usize,

    /// Shared with the write worker
    last_sequence: Arc<AtomicU64>,
    state: Arc<Mutex<LogState>>,

    events: Option<Sender<Event>>,
    worker: Option<JoinHandle<()>>,

    errors_tx: Sender<KeyvError>,
    errors_rx: Receiver<KeyvError>,
}

impl FileTransactionLog {
    /// Open or create the log at `path`
    pub fn open(path: &Path, sync_strategy: LogSyncStrategy) -> Result<Self> {
        let mut options = OpenOptions::new();
        options.create(true).append(true).read(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o755);
        }

        let file = options.open(path).map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "cannot open transaction log");
            e
        })?;
        tracing::info!(path = %path.display(), "opened transaction log");

        let (errors_tx, errors_rx) = channel::bounded(1);

        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            sync_strategy,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            last_sequence: Arc::new(AtomicU64::new(0)),
            state: Arc::new(Mutex::new(LogState::Created)),
            events: None,
            worker: None,
            errors_tx,
            errors_rx,
        })
    }

    /// Set how many events may be pending before writers block
    ///
    /// Takes effect on the next `run`; values below 1 are raised to 1.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    fn enqueue(&self, event: Event) {
        let Some(events) = &self.events else {
            tracing::warn!(
                kind = ?event.kind,
                key = %event.key,
                state = ?self.state(),
                "transaction log is not running; event dropped"
            );
            return;
        };

        if events.send(event).is_err() {
            // Worker exited after a fault and dropped the receiver
            tracing::warn!("transaction log faulted; event not persisted");
        }
    }

    fn state_error(&self, action: &str) -> KeyvError {
        KeyvError::LogState(format!("cannot {} while log is {:?}", action, self.state()))
    }
}

impl TransactionLog for FileTransactionLog {
    fn write_put(&self, key: &str, value: &str) {
        self.enqueue(Event::put(key, value));
    }

    fn write_delete(&self, key: &str) {
        self.enqueue(Event::delete(key));
    }

    fn errors(&self) -> Receiver<KeyvError> {
        self.errors_rx.clone()
    }

    fn read_events(&mut self) -> Box<dyn Iterator<Item = Result<Event>> + '_> {
        // One pass only: a second BufReader over the shared handle would
        // resume past the first reader's read-ahead
        if self.state() != LogState::Created {
            return Box::new(iter::once(Err(self.state_error("read events"))));
        }
        *self.state.lock() = LogState::Recovering;

        let Some(file) = self.file.as_ref() else {
            return Box::new(iter::once(Err(self.state_error("read events"))));
        };

        let reader = EventReader::new(
            BufReader::new(file),
            self.last_sequence.load(Ordering::Acquire),
        );

        Box::new(ReadEvents {
            reader,
            last_sequence: &self.last_sequence,
            state: &self.state,
        })
    }

    fn run(&mut self) -> Result<()> {
        if !matches!(self.state(), LogState::Created | LogState::Recovering) {
            return Err(self.state_error("run"));
        }
        let file = self.file.take().ok_or_else(|| self.state_error("run"))?;

        let (events_tx, events_rx) = channel::bounded(self.queue_capacity);
        let worker = LogWorker::new(
            file,
            Arc::clone(&self.last_sequence),
            Arc::clone(&self.state),
            self.sync_strategy,
            self.errors_tx.clone(),
        );

        *self.state.lock() = LogState::Active;
        let handle = worker.spawn(events_rx).map_err(|e| {
            *self.state.lock() = LogState::Faulted;
            KeyvError::Io(e)
        })?;

        self.events = Some(events_tx);
        self.worker = Some(handle);

        tracing::info!(
            path = %self.path.display(),
            last_sequence = self.last_sequence(),
            queue_capacity = self.queue_capacity,
            "transaction log running"
        );
        Ok(())
    }

    fn state(&self) -> LogState {
        *self.state.lock()
    }

    fn last_sequence(&self) -> u64 {
        self.last_sequence.load(Ordering::Acquire)
    }

    fn close(&mut self) -> Result<()> {
        // Disconnecting the queue lets the worker drain what is left and exit
        self.events.take();

        if let Some(worker) = self.worker.take() {
            worker
                .join()
                .map_err(|_| KeyvError::LogWrite("write worker panicked".to_string()))?;
        }
        self.file.take();

        let mut state = self.state.lock();
        if *state != LogState::Faulted {
            *state = LogState::Closed;
        }
        Ok(())
    }
}

impl Drop for FileTransactionLog {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::error!(error = %e, "failed to close transaction log");
        }
    }
}

/// Recovery iterator that keeps the log's sequence counter in step
struct ReadEvents<'a> {
    reader: EventReader<BufReader<&'a File>>,
    last_sequence: &'a AtomicU64,
    state: &'a Mutex<LogState>,
}

impl Iterator for ReadEvents<'_> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.next()? {
            Ok(event) => {
                self.last_sequence.store(event.sequence, Ordering::Release);
                Some(Ok(event))
            }
            Err(e) => {
                *self.state.lock() = LogState::Faulted;
                tracing::error!(error = %e, "transaction log read failed");
                Some(Err(e))
            }
        }
    }
}
