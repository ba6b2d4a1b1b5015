//! Core types exchanged between the peer and a chaincode
//!
//! Proposals flow in, responses and events flow out. Event envelopes are
//! bincode-encoded when persisted; everything else is plain serde.

use crate::identity::Certificate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Transaction identifier (UUIDv7 for time-ordering)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(Uuid);

impl TxId {
    /// Generate a fresh, time-ordered id
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wrap an existing uuid
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Underlying uuid
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TxId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An invocation request submitted to the peer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    /// Transaction id
    pub tx_id: TxId,

    /// Chaincode function name
    pub function: String,

    /// Positional string arguments
    pub args: Vec<String>,

    /// Certificate of the invoking identity
    pub creator: Certificate,

    /// Submission time
    pub timestamp: DateTime<Utc>,
}

impl Proposal {
    /// Build a proposal with a fresh transaction id
    pub fn new(
        function: impl Into<String>,
        args: Vec<String>,
        creator: Certificate,
    ) -> Self {
        Self {
            tx_id: TxId::new(),
            function: function.into(),
            args,
            creator,
            timestamp: Utc::now(),
        }
    }
}

/// Response status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum Status {
    /// Invocation succeeded
    Ok = 200,
    /// Malformed request (arguments, unknown function)
    BadRequest = 400,
    /// Caller is not allowed to invoke the function
    Forbidden = 403,
    /// Requested state does not exist
    NotFound = 404,
    /// State already exists
    Conflict = 409,
    /// Ledger, serialization or event failure
    Internal = 500,
}

impl Status {
    /// Numeric status code
    pub fn code(&self) -> u16 {
        *self as u16
    }
}

/// Result of an invocation as seen by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Outcome
    pub status: Status,

    /// Machine-readable error code (empty on success)
    #[serde(default)]
    pub code: String,

    /// Human-readable message
    #[serde(default)]
    pub message: String,

    /// Payload returned by the chaincode
    #[serde(default)]
    pub payload: Vec<u8>,
}

impl Response {
    /// Successful response carrying a payload
    pub fn success(payload: Vec<u8>) -> Self {
        Self {
            status: Status::Ok,
            code: String::new(),
            message: String::new(),
            payload,
        }
    }

    /// Failed response
    pub fn error(status: Status, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            payload: Vec::new(),
        }
    }

    /// Whether the invocation succeeded
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

/// Event emitted by a chaincode during an invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeEvent {
    /// Unique event ID
    pub event_id: Uuid,

    /// Transaction that emitted the event
    pub tx_id: TxId,

    /// Channel name the event was emitted on
    pub channel: String,

    /// Opaque payload
    #[serde(with = "serde_bytes")]
    pub payload: Vec<u8>,

    /// Emission timestamp (nanoseconds since Unix epoch)
    pub timestamp_nanos: i64,
}

impl ChaincodeEvent {
    /// Create an event stamped with the current time
    pub fn new(tx_id: TxId, channel: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            tx_id,
            channel: channel.into(),
            payload,
            timestamp_nanos: Utc::now().timestamp_nanos_opt().unwrap_or(0),
        }
    }
}

/// Digital signature (Ed25519)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Signature bytes (64 bytes)
    #[serde(with = "serde_bytes")]
    bytes: [u8; 64],
}

impl Signature {
    /// Create from bytes
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self { bytes }
    }

    /// Get bytes
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.bytes
    }
}
