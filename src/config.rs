//! Configuration for KeyV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{KeyvError, Result};
use crate::wal::DEFAULT_QUEUE_CAPACITY;

/// Main configuration for a KeyV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for data files
    ///   {data_dir}/
    ///     └── transaction.log
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Transaction Log Configuration
    // -------------------------------------------------------------------------
    /// How often the write worker fsyncs the log
    pub sync_strategy: LogSyncStrategy,

    /// Pending events the write queue holds before callers block
    pub queue_capacity: usize,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,
}

/// Transaction log sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSyncStrategy {
    /// fsync after every append (safest, slowest)
    EveryWrite,

    /// fsync after N appends
    EveryNEntries { count: usize },

    /// Leave flushing to the OS page cache
    OsManaged,
}

impl LogSyncStrategy {
    /// Map a "sync every N" count onto a strategy: 0 = OS managed, 1 = every write
    pub fn from_count(count: usize) -> Self {
        match count {
            0 => LogSyncStrategy::OsManaged,
            1 => LogSyncStrategy::EveryWrite,
            n => LogSyncStrategy::EveryNEntries { count: n },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./keyv_data"),
            sync_strategy: LogSyncStrategy::EveryNEntries { count: 16 },
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            listen_addr: "127.0.0.1:8080".to_string(),
            max_connections: 1024,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// File name of the transaction log inside `data_dir`
    pub const LOG_FILENAME: &'static str = "transaction.log";

    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Full path of the transaction log
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(Self::LOG_FILENAME)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(KeyvError::Config(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        if let LogSyncStrategy::EveryNEntries { count: 0 } = self.sync_strategy {
            return Err(KeyvError::Config(
                "sync count must be at least 1".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(KeyvError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the log sync strategy
    pub fn sync_strategy(mut self, strategy: LogSyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the write queue capacity
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
