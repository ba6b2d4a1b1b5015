//! Loan application chaincode
//!
//! Every invocation is routed by function name, checked against the access
//! gate for its operation and only then handed to the operation handler.
//! Handlers check their own argument counts, so a denied caller is told
//! about the denial before any argument problem.

use crate::{
    access::AccessPolicy,
    codec,
    config::ContractConfig,
    dispatcher::{Operation, Router},
    events::{self, ContractEvent, EventPolicy},
    Error, Result,
};
use ledger_shim::{Chaincode, Response, Stub};

/// Chaincode managing loan application records
#[derive(Debug, Clone)]
pub struct LoanContract {
    router: Router,
    access: AccessPolicy,
    event_policy: EventPolicy,
    reject_existing_on_create: bool,
}

impl LoanContract {
    /// Build the contract; fails if the gate table is incomplete
    pub fn new(config: ContractConfig) -> Result<Self> {
        let router = Router::new(&config.access)?;

        Ok(Self {
            router,
            access: config.access,
            event_policy: config.event_policy,
            reject_existing_on_create: config.reject_existing_on_create,
        })
    }

    /// Access policy in force
    pub fn access(&self) -> &AccessPolicy {
        &self.access
    }

    /// Route, authorize and run one invocation
    pub fn dispatch(&self, stub: &Stub<'_>) -> Result<Vec<u8>> {
        let (operation, handler) = self.router.route(stub.function())?;
        self.access.authorize(stub, operation)?;
        handler(self, stub, stub.args())
    }

    /// Return the stored bytes for `args[0]` unchanged
    pub fn get_loan_application(&self, stub: &Stub<'_>, args: &[String]) -> Result<Vec<u8>> {
        Operation::GetLoanApplication.check_args(args)?;
        let id = &args[0];

        tracing::debug!(parent: stub.span(), id = %id, "Entering GetLoanApplication");

        let bytes = stub.get_state(id).map_err(|source| {
            tracing::error!(
                parent: stub.span(),
                id = %id,
                error = %source,
                "Failed to read loan application"
            );
            Error::LedgerRead {
                key: id.clone(),
                source,
            }
        })?;

        tracing::debug!(
            parent: stub.span(),
            id = %id,
            bytes = bytes.len(),
            "Loan application read"
        );
        Ok(bytes)
    }

    /// Store `args[1]` verbatim under `args[0]` and emit a creation event
    pub fn create_loan_application(&self, stub: &Stub<'_>, args: &[String]) -> Result<Vec<u8>> {
        Operation::CreateLoanApplication.check_args(args)?;
        let (id, payload) = (&args[0], &args[1]);

        tracing::debug!(parent: stub.span(), id = %id, "Entering CreateLoanApplication");

        if self.reject_existing_on_create {
            match stub.get_state(id) {
                Ok(_) => return Err(Error::AlreadyExists(id.clone())),
                Err(e) if e.is_not_found() => {}
                Err(source) => {
                    return Err(Error::LedgerRead {
                        key: id.clone(),
                        source,
                    })
                }
            }
        }

        stub.put_state(id, payload.as_bytes()).map_err(|source| {
            tracing::error!(
                parent: stub.span(),
                id = %id,
                error = %source,
                "Failed to save loan application"
            );
            Error::LedgerWrite {
                key: id.clone(),
                source,
            }
        })?;

        tracing::info!(parent: stub.span(), id = %id, "Successfully saved loan application");

        events::emit(stub, &ContractEvent::created(id), self.event_policy)?;
        Ok(Vec::new())
    }

    /// Replace the status of the record under `args[0]` with `args[1]`
    pub fn update_loan_application(&self, stub: &Stub<'_>, args: &[String]) -> Result<Vec<u8>> {
        Operation::UpdateLoanApplication.check_args(args)?;
        let (id, status) = (&args[0], &args[1]);

        tracing::debug!(
            parent: stub.span(),
            id = %id,
            status = %status,
            "Entering UpdateLoanApplication"
        );

        let bytes = stub.get_state(id).map_err(|source| {
            tracing::error!(
                parent: stub.span(),
                id = %id,
                error = %source,
                "Failed to read loan application"
            );
            Error::LedgerRead {
                key: id.clone(),
                source,
            }
        })?;

        let (previous, encoded) = codec::replace_status(&bytes, status).map_err(|e| {
            tracing::error!(
                parent: stub.span(),
                id = %id,
                error = %e,
                "Stored loan application is malformed"
            );
            e
        })?;

        stub.put_state(id, &encoded).map_err(|source| {
            tracing::error!(
                parent: stub.span(),
                id = %id,
                error = %source,
                "Failed to update loan application"
            );
            Error::LedgerWrite {
                key: id.clone(),
                source,
            }
        })?;

        tracing::info!(
            parent: stub.span(),
            id = %id,
            from = %previous,
            to = %status,
            "Successfully updated loan application status"
        );

        events::emit(stub, &ContractEvent::updated(id), self.event_policy)?;
        Ok(Vec::new())
    }
}

impl Chaincode for LoanContract {
    fn init(&self, stub: &Stub<'_>) -> Response {
        tracing::info!(parent: stub.span(), "Loan application chaincode instantiated");
        Response::success(Vec::new())
    }

    fn invoke(&self, stub: &Stub<'_>) -> Response {
        match self.dispatch(stub) {
            Ok(payload) => Response::success(payload),
            Err(e) => {
                tracing::warn!(
                    parent: stub.span(),
                    code = e.code(),
                    error = %e,
                    "Invocation rejected"
                );
                Response::error(e.status(), e.code(), e.to_string())
            }
        }
    }
}
