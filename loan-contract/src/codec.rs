//! Conversion between structured values and ledger bytes
//!
//! Records and event payloads share one JSON encoding so every byte string
//! the contract writes is well-formed.

use crate::{
    types::{LoanApplication, STATUS_FIELD},
    Result,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

/// Encode a value for the ledger or an event channel
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Decode a value previously written by [`encode`]
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Decode a stored loan application
pub fn decode_application(bytes: &[u8]) -> Result<LoanApplication> {
    decode(bytes)
}

/// Rewrite the status of a stored record, returning the previous status
/// and the new bytes
///
/// Every other member is copied through as stored, including nulls, members
/// this version does not know, and member order.
pub fn replace_status(bytes: &[u8], status: &str) -> Result<(String, Vec<u8>)> {
    let previous = decode_application(bytes)?.status;
    let mut record: Map<String, Value> = decode(bytes)?;
    record.insert(STATUS_FIELD.to_string(), Value::String(status.to_string()));
    Ok((previous, encode(&record)?))
}
