//! Transaction log recovery
//!
//! Replays a log into a fresh KeyStore on startup.

use crate::error::Result;
use crate::store::KeyStore;

use super::{EventKind, TransactionLog};

/// Drives the read path of a transaction log into a store
pub struct LogRecovery;

/// Result of a recovery run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of events applied
    pub events_replayed: u64,

    pub puts: u64,

    pub deletes: u64,

    /// Sequence of the last applied event (0 for an empty log)
    pub last_sequence: u64,
}

impl LogRecovery {
    /// Apply every persisted event of `log` to `store`, in order
    ///
    /// Each event is applied before the next one is read. The first error
    /// aborts recovery; events already applied stay in the store, but the
    /// caller is expected to abandon startup.
    pub fn replay(log: &mut dyn TransactionLog, store: &KeyStore) -> Result<RecoveryResult> {
        let mut result = RecoveryResult::default();

        for event in log.read_events() {
            let event = event?;
            match event.kind {
                EventKind::Put => {
                    store.put(event.key, event.value)?;
                    result.puts += 1;
                }
                EventKind::Delete => {
                    store.delete(&event.key)?;
                    result.deletes += 1;
                }
            }
            result.events_replayed += 1;
            result.last_sequence = event.sequence;
        }

        tracing::info!(
            events = result.events_replayed,
            puts = result.puts,
            deletes = result.deletes,
            last_sequence = result.last_sequence,
            keys = store.len(),
            "transaction log replayed"
        );
        Ok(result)
    }
}
