//! KeyStore Module
//!
//! In-memory map holding the live key/value state.
//!
//! ## Responsibilities
//! - Serve reads directly from memory
//! - Many concurrent readers, one exclusive writer at a time
//! - Last write wins; no history beyond what the transaction log records
//!
//! The store is repopulated from the transaction log on startup, so it never
//! needs to be persisted itself.

mod table;

pub use table::KeyStore;
