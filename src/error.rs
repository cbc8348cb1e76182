//! Error types for KeyV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using KeyvError
pub type Result<T> = std::result::Result<T, KeyvError>;

/// Unified error type for KeyV operations
#[derive(Debug, Error)]
pub enum KeyvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("no such key found")]
    NotFound,

    // -------------------------------------------------------------------------
    // Transaction Log Errors
    // -------------------------------------------------------------------------
    #[error("transaction log write failed: {0}")]
    LogWrite(String),

    #[error("transaction log corrupted at line {line}: {reason}")]
    Corruption { line: u64, reason: String },

    #[error("transaction log misuse: {0}")]
    LogState(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Server error: {0}")]
    Remote(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl KeyvError {
    /// Build a corruption error for the given 1-based line
    pub(crate) fn corruption(line: u64, reason: impl Into<String>) -> Self {
        KeyvError::Corruption {
            line,
            reason: reason.into(),
        }
    }
}
