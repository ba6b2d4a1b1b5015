//! Event delivery to listeners
//!
//! Delivery is best-effort: a broadcast with no subscribers, or a lagging
//! subscriber, is not an error for the emitting transaction.

use crate::{stub::EventSink, types::ChaincodeEvent, Result};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Publishes events to in-process subscribers
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    sender: broadcast::Sender<ChaincodeEvent>,
}

impl BroadcastSink {
    /// Create a sink buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ChaincodeEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventSink for BroadcastSink {
    fn emit(&self, event: &ChaincodeEvent) -> Result<()> {
        match self.sender.send(event.clone()) {
            Ok(receivers) => {
                tracing::debug!(channel = %event.channel, receivers, "Event broadcast");
            }
            Err(_) => {
                tracing::debug!(channel = %event.channel, "Event dropped, no subscribers");
            }
        }
        Ok(())
    }
}

/// Delivers each event to several sinks
///
/// Every sink is attempted; the first failure is returned.
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    /// Empty fan-out
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink
    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl EventSink for FanoutSink {
    fn emit(&self, event: &ChaincodeEvent) -> Result<()> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.emit(event) {
                tracing::warn!(channel = %event.channel, error = %e, "Event sink failed");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for FanoutSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutSink")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}
