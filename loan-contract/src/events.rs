//! Change notifications
//!
//! Events are advisory. The ledger write that precedes an event is never
//! rolled back; [`EventPolicy`] only decides whether a failed emission is
//! reported to the caller.

use crate::{codec, Error, Result};
use ledger_shim::Stub;
use serde::{Deserialize, Serialize};

/// Channel every loan application event is emitted on
pub const EVENT_CHANNEL: &str = "evtSender";

/// What happened to the record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Record created (or overwritten)
    #[serde(rename = "loanApplicationCreation")]
    Created,
    /// Record status updated
    #[serde(rename = "loanApplicationUpdate")]
    Updated,
}

/// Notification payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractEvent {
    /// Event type tag
    #[serde(rename = "eventType")]
    pub kind: EventKind,

    /// Affected loan application
    pub record_id: String,

    /// Human-readable summary
    pub description: String,
}

impl ContractEvent {
    /// Creation event for `record_id`
    pub fn created(record_id: &str) -> Self {
        Self {
            kind: EventKind::Created,
            record_id: record_id.to_string(),
            description: format!("{} Successfully created", record_id),
        }
    }

    /// Status update event for `record_id`
    pub fn updated(record_id: &str) -> Self {
        Self {
            kind: EventKind::Updated,
            record_id: record_id.to_string(),
            description: format!("{} Successfully updated status", record_id),
        }
    }
}

/// How a failed emission affects the operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPolicy {
    /// Emission failure fails the operation (state is still written)
    #[default]
    Required,
    /// Emission failure is logged and the operation succeeds
    BestEffort,
}

/// Encode and emit `event` on [`EVENT_CHANNEL`]
pub fn emit(stub: &Stub<'_>, event: &ContractEvent, policy: EventPolicy) -> Result<()> {
    let payload = codec::encode(event)?;

    match stub.set_event(EVENT_CHANNEL, payload) {
        Ok(()) => {
            tracing::debug!(
                parent: stub.span(),
                record_id = %event.record_id,
                kind = ?event.kind,
                "Event emitted"
            );
            Ok(())
        }
        Err(source) => match policy {
            EventPolicy::Required => Err(Error::EventEmission {
                record_id: event.record_id.clone(),
                source,
            }),
            EventPolicy::BestEffort => {
                tracing::warn!(
                    parent: stub.span(),
                    record_id = %event.record_id,
                    error = %source,
                    "Event dropped"
                );
                Ok(())
            }
        },
    }
}
