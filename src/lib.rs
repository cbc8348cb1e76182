//! # KeyV
//!
//! A durable key-value store with:
//! - An in-memory KeyStore (many readers, one writer at a time)
//! - An append-only transaction log written by a single background worker
//! - Ordered replay of the log on startup
//! - A TCP front end and CLI client
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │                  (thread per client)                         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Engine                                 │
//! │        reads → KeyStore, writes → KeyStore then log          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌──────────────────┐
//!   │  KeyStore   │          │  TransactionLog  │
//!   │  (RwLock)   │          │ queue(16)→worker │
//!   └─────────────┘          └────────┬─────────┘
//!          ▲                          │
//!          └──── replay on startup ───┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod engine;
pub mod network;
pub mod protocol;
pub mod store;
pub mod wal;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::{Config, LogSyncStrategy};
pub use engine::Engine;
pub use error::{KeyvError, Result};
pub use store::KeyStore;
pub use wal::{FileTransactionLog, MemoryTransactionLog, TransactionLog};

/// Current version of KeyV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
