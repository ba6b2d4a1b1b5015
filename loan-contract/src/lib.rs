//! Loan Contract
//!
//! Chaincode that stores home-loan applications on a key-value ledger and
//! lets bank staff look them up and move them through review.
//!
//! # Operations
//!
//! - **GetLoanApplication** `<id>`: stored bytes, unchanged
//! - **CreateLoanApplication** `<id> <json>`: gated on the loan admin role
//! - **UpdateLoanApplication** `<id> <status>`: rewrites only the status field
//!
//! Each successful write emits a JSON notification on the `evtSender`
//! channel. Failures come back as a [`ledger_shim::Response`] carrying a
//! status, a stable error code and a message.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod access;
pub mod codec;
pub mod config;
pub mod contract;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod types;

// Re-exports
pub use access::{AccessPolicy, Gate, ADMIN_ROLE};
pub use config::{Config, ContractConfig};
pub use contract::LoanContract;
pub use dispatcher::Operation;
pub use error::{Error, Result};
pub use events::{ContractEvent, EventKind, EventPolicy, EVENT_CHANNEL};
pub use types::{FinancialInfo, LoanApplication, PersonalInfo};
