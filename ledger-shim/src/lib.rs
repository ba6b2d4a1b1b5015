//! Ledger Shim
//!
//! Single-node rendition of the collaborators a chaincode runs against:
//! world state, caller identity, event delivery and invocation ordering.
//!
//! # Architecture
//!
//! - **Stub**: per-invocation context binding state, identity, events and a tracing span
//! - **State**: RocksDB or in-memory key-value store with atomic per-key put
//! - **Identity**: ed25519-signed attribute certificates checked against trusted issuers
//! - **Events**: best-effort broadcast, persistent event log, fan-out
//! - **Peer**: single-writer actor that executes proposals in arrival order
//!
//! # Invariants
//!
//! - A missing key is an error, never an empty value
//! - One invocation at a time per peer
//! - Event delivery never rolls back state

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod actor;
pub mod config;
pub mod error;
pub mod events;
pub mod identity;
pub mod memory;
pub mod metrics;
pub mod storage;
pub mod stub;
pub mod types;

// Re-exports
pub use actor::{spawn_peer, PeerBindings, PeerHandle};
pub use config::Config;
pub use error::{Error, Result};
pub use identity::{Certificate, KeyPair, TrustedIssuers};
pub use storage::Storage;
pub use stub::{AttributeResolver, Chaincode, EventSink, StateStore, Stub};
pub use types::{ChaincodeEvent, Proposal, Response, Status, TxId};
