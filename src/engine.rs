//! Engine Module
//!
//! Ties the KeyStore to its transaction log.
//!
//! ## Responsibilities
//! - Recover the store from the log before accepting requests
//! - Apply writes to the store, then hand them to the log
//! - Serve reads straight from the store
//! - Expose the log's fault channel to the owner

use std::fs;

use crossbeam::channel::Receiver;
use parking_lot::RwLock;

use crate::config::Config;
use crate::error::{KeyvError, Result};
use crate::protocol::Command;
use crate::store::KeyStore;
use crate::wal::{FileTransactionLog, LogRecovery, LogState, RecoveryResult, TransactionLog};

/// The key-value engine
///
/// ## Concurrency Model
///
/// - **Reads** go to the KeyStore under its read lock; any number run at once.
/// - **Writes** take the KeyStore write lock for the mutation only, then
///   enqueue an event. The log's bounded queue is the only place a writer
///   can wait, and only while the queue is full.
/// - The `log` RwLock is held shared by writers and exclusively only by
///   `close`, so shutdown waits for in-flight enqueues.
///
/// A write is visible to readers as soon as `put`/`delete` returns, but is
/// durable only once the write worker appends it. A crash in between loses
/// that one write.
pub struct Engine {
    store: KeyStore,
    log: RwLock<Box<dyn TransactionLog>>,
    recovery: RecoveryResult,
}

impl Engine {
    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Create the data directory
    /// 2. Open the transaction log
    /// 3. Replay it into an empty store
    /// 4. Start the log's write worker
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;

        let log = FileTransactionLog::open(&config.log_path(), config.sync_strategy)?
            .with_queue_capacity(config.queue_capacity);

        Self::with_log(KeyStore::new(), Box::new(log))
    }

    /// Build an engine around an existing store and log
    ///
    /// The log is replayed into `store` and then started.
    pub fn with_log(store: KeyStore, mut log: Box<dyn TransactionLog>) -> Result<Self> {
        let recovery = LogRecovery::replay(&mut *log, &store).map_err(|e| {
            tracing::error!(error = %e, "recovery failed; refusing to start");
            e
        })?;
        log.run()?;

        Ok(Self {
            store,
            log: RwLock::new(log),
            recovery,
        })
    }

    /// Execute a command
    pub fn execute(&self, command: Command) -> Result<Option<String>> {
        match command {
            Command::Get { key } => self.get(&key).map(Some),
            Command::Put { key, value } => {
                self.put(&key, &value)?;
                Ok(None)
            }
            Command::Delete { key } => {
                self.delete(&key)?;
                Ok(None)
            }
            Command::Ping => Ok(Some("PONG".to_string())),
        }
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Result<String> {
        self.store.get(key)
    }

    /// Put a key-value pair
    ///
    /// Steps:
    /// 1. Write to the KeyStore
    /// 2. Enqueue a Put event for the log
    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        self.store.put(key, value)?;
        self.log.read().write_put(key, value);
        Ok(())
    }

    /// Delete a key; deleting an absent key still logs the delete
    pub fn delete(&self, key: &str) -> Result<()> {
        self.store.delete(key)?;
        self.log.read().write_delete(key);
        Ok(())
    }

    /// Receives the log's first fatal write error
    ///
    /// Owners must watch this; nothing else signals lost durability.
    pub fn errors(&self) -> Receiver<KeyvError> {
        self.log.read().errors()
    }

    pub fn log_state(&self) -> LogState {
        self.log.read().state()
    }

    /// Sequence number of the last persisted event
    pub fn last_sequence(&self) -> u64 {
        self.log.read().last_sequence()
    }

    /// What startup recovery replayed
    pub fn recovery(&self) -> &RecoveryResult {
        &self.recovery
    }

    pub fn store(&self) -> &KeyStore {
        &self.store
    }

    /// Flush queued events and stop the log
    ///
    /// Writes issued after `close` stay in memory only.
    pub fn close(&self) -> Result<()> {
        self.log.write().close()
    }
}
