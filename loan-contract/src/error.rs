//! Error types for the loan contract

use ledger_shim::Status;
use thiserror::Error;

/// Result type for contract operations
pub type Result<T> = std::result::Result<T, Error>;

/// Contract errors
#[derive(Error, Debug)]
pub enum Error {
    /// Too few arguments supplied
    #[error("{operation} expects at least {expected} argument(s), got {actual}")]
    InvalidArgumentCount {
        /// Operation name
        operation: &'static str,
        /// Minimum argument count
        expected: usize,
        /// Supplied argument count
        actual: usize,
    },

    /// Ledger lookup failed, including a missing key
    #[error("Could not read {key} from ledger: {source}")]
    LedgerRead {
        /// Requested key
        key: String,
        /// Ledger failure
        #[source]
        source: ledger_shim::Error,
    },

    /// Ledger write failed
    #[error("Could not write {key} to ledger: {source}")]
    LedgerWrite {
        /// Target key
        key: String,
        /// Ledger failure
        #[source]
        source: ledger_shim::Error,
    },

    /// Payload is not a loan application (or could not be encoded)
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Caller's role does not satisfy the gate
    #[error("{name} with role {role} does not have access to {operation}")]
    AccessDenied {
        /// Resolved name attribute
        name: String,
        /// Resolved role attribute
        role: String,
        /// Gated operation
        operation: &'static str,
    },

    /// Identity layer could not produce an attribute
    #[error("Couldn't get attribute {attribute}: {source}")]
    AttributeResolution {
        /// Attribute name
        attribute: String,
        /// Identity failure
        #[source]
        source: ledger_shim::Error,
    },

    /// Event channel rejected the notification
    #[error("Could not emit event for {record_id}: {source}")]
    EventEmission {
        /// Record the event refers to
        record_id: String,
        /// Sink failure
        #[source]
        source: ledger_shim::Error,
    },

    /// Creation refused because the key is taken
    #[error("Loan application {0} already exists")]
    AlreadyExists(String),

    /// Function name not in the dispatch table
    #[error("Received unknown function invocation: {0}")]
    UnknownFunction(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidArgumentCount { .. } => "INVALID_ARGUMENT_COUNT",
            Error::LedgerRead { .. } => "LEDGER_READ_ERROR",
            Error::LedgerWrite { .. } => "LEDGER_WRITE_ERROR",
            Error::Serialization(_) => "SERIALIZATION_ERROR",
            Error::AccessDenied { .. } => "ACCESS_DENIED",
            Error::AttributeResolution { .. } => "ATTRIBUTE_RESOLUTION_ERROR",
            Error::EventEmission { .. } => "EVENT_EMISSION_ERROR",
            Error::AlreadyExists(_) => "ALREADY_EXISTS",
            Error::UnknownFunction(_) => "UNKNOWN_FUNCTION",
            Error::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Response status for this error
    pub fn status(&self) -> Status {
        match self {
            Error::InvalidArgumentCount { .. } | Error::UnknownFunction(_) => Status::BadRequest,
            Error::AccessDenied { .. } | Error::AttributeResolution { .. } => Status::Forbidden,
            Error::LedgerRead { source, .. } if source.is_not_found() => Status::NotFound,
            Error::AlreadyExists(_) => Status::Conflict,
            _ => Status::Internal,
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(format!("Failed to parse config: {}", err))
    }
}
