//! Invocation context handed to a chaincode
//!
//! A [`Stub`] lives for exactly one invocation. It carries the caller's
//! arguments, the transaction id, the invocation's tracing span and the
//! bindings to the three collaborators a chaincode may touch: the state
//! store, the attribute resolver and the event sink.

use crate::{
    types::{ChaincodeEvent, Response, TxId},
    Result,
};
use std::cell::Cell;
use std::fmt;

/// Key-value world state
///
/// Keys are opaque, unique and global. A missing key is reported as
/// [`crate::Error::KeyNotFound`], never as an empty value.
pub trait StateStore: Send + Sync {
    /// Read the value stored under `key`
    fn get_state(&self, key: &str) -> Result<Vec<u8>>;

    /// Atomically replace the value stored under `key`
    fn put_state(&self, key: &str, value: &[u8]) -> Result<()>;
}

/// Attribute lookup scoped to the invoking identity
pub trait AttributeResolver {
    /// Resolve a named attribute of the caller
    fn resolve(&self, attribute: &str) -> Result<String>;
}

/// Best-effort event delivery
pub trait EventSink: Send + Sync {
    /// Deliver one event
    fn emit(&self, event: &ChaincodeEvent) -> Result<()>;
}

/// Deployable contract logic
pub trait Chaincode: Send + Sync + 'static {
    /// Called once when the chaincode is instantiated
    fn init(&self, _stub: &Stub<'_>) -> Response {
        Response::success(Vec::new())
    }

    /// Called for every transaction proposal
    fn invoke(&self, stub: &Stub<'_>) -> Response;
}

/// Per-invocation context
pub struct Stub<'a> {
    tx_id: TxId,
    function: &'a str,
    args: &'a [String],
    state: &'a dyn StateStore,
    identity: &'a dyn AttributeResolver,
    events: &'a dyn EventSink,
    span: tracing::Span,
    events_emitted: Cell<usize>,
}

impl<'a> Stub<'a> {
    /// Bind a new invocation context
    pub fn new(
        tx_id: TxId,
        function: &'a str,
        args: &'a [String],
        state: &'a dyn StateStore,
        identity: &'a dyn AttributeResolver,
        events: &'a dyn EventSink,
        span: tracing::Span,
    ) -> Self {
        Self {
            tx_id,
            function,
            args,
            state,
            identity,
            events,
            span,
            events_emitted: Cell::new(0),
        }
    }

    /// Transaction id of this invocation
    pub fn tx_id(&self) -> TxId {
        self.tx_id
    }

    /// Requested function name
    pub fn function(&self) -> &str {
        self.function
    }

    /// Positional arguments
    pub fn args(&self) -> &[String] {
        self.args
    }

    /// Logging span scoped to this invocation
    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    /// Read state
    pub fn get_state(&self, key: &str) -> Result<Vec<u8>> {
        self.state.get_state(key)
    }

    /// Write state
    pub fn put_state(&self, key: &str, value: &[u8]) -> Result<()> {
        self.state.put_state(key, value)
    }

    /// Resolve an attribute of the caller's certificate
    pub fn read_attribute(&self, attribute: &str) -> Result<String> {
        self.identity.resolve(attribute)
    }

    /// Emit an event on `channel`
    pub fn set_event(&self, channel: &str, payload: Vec<u8>) -> Result<()> {
        let event = ChaincodeEvent::new(self.tx_id, channel, payload);
        self.events.emit(&event)?;
        self.events_emitted.set(self.events_emitted.get() + 1);
        Ok(())
    }

    /// Number of events delivered so far
    pub fn events_emitted(&self) -> usize {
        self.events_emitted.get()
    }
}

impl fmt::Debug for Stub<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stub")
            .field("tx_id", &self.tx_id)
            .field("function", &self.function)
            .field("args", &self.args.len())
            .finish()
    }
}
