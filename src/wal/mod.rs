//! Transaction Log Module
//!
//! Provides durability through an append-only, line-oriented log of mutations.
//!
//! ## Responsibilities
//! - Queue mutations and append them from a single writer thread
//! - Assign strictly increasing sequence numbers
//! - Replay persisted events in order on startup
//! - Report the first fatal error and stop
//!
//! ## File Format
//! ```text
//! ┌──────────┬─────┬──────┬─────┬─────────┬─────┬───────────────┬────┐
//! │ sequence │ TAB │ kind │ TAB │ key     │ TAB │ escaped value │ LF │
//! └──────────┴─────┴──────┴─────┴─────────┴─────┴───────────────┴────┘
//! ```
//! `kind` is `1` for Delete and `2` for Put. Keys and values are
//! percent-escaped, so neither can contain a TAB, space, or newline.
//!
//! ## Lifecycle
//! ```text
//! Created ──read_events──▶ Recovering ──run──▶ Active ──close──▶ Closed
//!    │                          │                 │
//!    └──────────run─────────────┼─────────────────┤
//!                               └── fault ──▶ Faulted ◀── fault
//! ```

mod escape;
mod event;
mod file;
mod memory;
mod reader;
mod recovery;
mod writer;

use crossbeam::channel::Receiver;

use crate::error::{KeyvError, Result};

pub use escape::{escape, unescape, EscapeError};
pub use event::{Event, EventKind};
pub use file::FileTransactionLog;
pub use memory::MemoryTransactionLog;
pub use reader::EventReader;
pub use recovery::{LogRecovery, RecoveryResult};

/// Pending events the write queue holds before `write_put`/`write_delete` block
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Lifecycle state of a transaction log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogState {
    /// Opened, nothing read or written yet
    Created,

    /// Replaying persisted events
    Recovering,

    /// Write worker running
    Active,

    /// A read or write failed; no further durability progress
    Faulted,

    /// Write worker drained and stopped
    Closed,
}

/// An append-only durable log of store mutations
///
/// Write calls only enqueue; failures surface later on [`errors`](Self::errors).
/// `read_events` must be fully drained before `run` is called, otherwise new
/// sequence numbers would collide with persisted ones.
pub trait TransactionLog: Send + Sync {
    /// Enqueue a Put; blocks only while the pending queue is full
    fn write_put(&self, key: &str, value: &str);

    /// Enqueue a Delete; blocks only while the pending queue is full
    fn write_delete(&self, key: &str);

    /// Receives the first fatal write error, once
    fn errors(&self) -> Receiver<KeyvError>;

    /// Lazily replay persisted events in order, stopping after the first error
    ///
    /// Only valid once, from `Created`; later calls yield a single
    /// [`KeyvError::LogState`].
    fn read_events(&mut self) -> Box<dyn Iterator<Item = Result<Event>> + '_>;

    /// Start the write worker
    fn run(&mut self) -> Result<()>;

    fn state(&self) -> LogState;

    /// Highest sequence number read or written so far
    fn last_sequence(&self) -> u64;

    /// Drain queued events and stop the write worker
    fn close(&mut self) -> Result<()>;
}
