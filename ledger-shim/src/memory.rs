//! In-memory state store and event recorder
//!
//! Used for development peers and tests. Access counters make it possible
//! to assert that an invocation never reached the ledger.

use crate::{
    stub::{EventSink, StateStore},
    types::ChaincodeEvent,
    Error, Result,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// World state held in a hash map
#[derive(Debug, Default)]
pub struct MemoryState {
    entries: RwLock<HashMap<String, Vec<u8>>>,
    reads: AtomicU64,
    writes: AtomicU64,
}

impl MemoryState {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `get_state` calls served
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Number of `put_state` calls served
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Number of keys stored
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl StateStore for MemoryState {
    fn get_state(&self, key: &str) -> Result<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.entries
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))
    }

    fn put_state(&self, key: &str, value: &[u8]) -> Result<()> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.entries.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// Records every emitted event in order
#[derive(Debug, Default)]
pub struct MemoryEvents {
    events: RwLock<Vec<ChaincodeEvent>>,
}

impl MemoryEvents {
    /// Empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events
    pub fn events(&self) -> Vec<ChaincodeEvent> {
        self.events.read().clone()
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

impl EventSink for MemoryEvents {
    fn emit(&self, event: &ChaincodeEvent) -> Result<()> {
        self.events.write().push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TxId;

    #[test]
    fn test_missing_key_is_an_error() {
        let state = MemoryState::new();
        let err = state.get_state("LA-999").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(state.reads(), 1);
    }

    #[test]
    fn test_put_overwrites() {
        let state = MemoryState::new();
        state.put_state("k", b"one").unwrap();
        state.put_state("k", b"two").unwrap();
        assert_eq!(state.get_state("k").unwrap(), b"two");
        assert_eq!(state.len(), 1);
        assert_eq!(state.writes(), 2);
    }

    #[test]
    fn test_events_recorded_in_order() {
        let events = MemoryEvents::new();
        let tx = TxId::new();
        events.emit(&ChaincodeEvent::new(tx, "a", vec![1])).unwrap();
        events.emit(&ChaincodeEvent::new(tx, "b", vec![2])).unwrap();

        let recorded = events.events();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].channel, "a");
        assert_eq!(recorded[1].channel, "b");
    }
}
