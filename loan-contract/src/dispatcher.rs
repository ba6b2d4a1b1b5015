//! Function-name routing
//!
//! The set of operations is closed. [`Router::new`] builds the name →
//! handler table once and refuses to start if any operation lacks a
//! handler or an access gate.

use crate::{access::AccessPolicy, contract::LoanContract, Error, Result};
use ledger_shim::Stub;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Handler signature shared by every operation
pub type Handler = fn(&LoanContract, &Stub<'_>, &[String]) -> Result<Vec<u8>>;

/// Operations exposed by the contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Read a record's raw bytes
    GetLoanApplication,
    /// Write a new record
    CreateLoanApplication,
    /// Replace a record's status
    UpdateLoanApplication,
}

impl Operation {
    /// Every operation, in table order
    pub const ALL: [Operation; 3] = [
        Operation::GetLoanApplication,
        Operation::CreateLoanApplication,
        Operation::UpdateLoanApplication,
    ];

    /// Function name used on the wire
    pub fn name(&self) -> &'static str {
        match self {
            Operation::GetLoanApplication => "GetLoanApplication",
            Operation::CreateLoanApplication => "CreateLoanApplication",
            Operation::UpdateLoanApplication => "UpdateLoanApplication",
        }
    }

    /// Minimum number of arguments
    pub fn min_args(&self) -> usize {
        match self {
            Operation::GetLoanApplication => 1,
            Operation::CreateLoanApplication | Operation::UpdateLoanApplication => 2,
        }
    }

    fn handler(&self) -> Handler {
        match self {
            Operation::GetLoanApplication => LoanContract::get_loan_application,
            Operation::CreateLoanApplication => LoanContract::create_loan_application,
            Operation::UpdateLoanApplication => LoanContract::update_loan_application,
        }
    }

    /// Fail with [`Error::InvalidArgumentCount`] when `args` is too short
    pub fn check_args(&self, args: &[String]) -> Result<()> {
        if args.len() < self.min_args() {
            return Err(Error::InvalidArgumentCount {
                operation: self.name(),
                expected: self.min_args(),
                actual: args.len(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Operation::ALL
            .iter()
            .copied()
            .find(|op| op.name() == s)
            .ok_or_else(|| Error::UnknownFunction(s.to_string()))
    }
}

/// Name → handler table
#[derive(Clone)]
pub struct Router {
    routes: HashMap<&'static str, (Operation, Handler)>,
}

impl Router {
    /// Build and validate the table against `policy`
    pub fn new(policy: &AccessPolicy) -> Result<Self> {
        policy.validate()?;

        let mut routes = HashMap::with_capacity(Operation::ALL.len());
        for op in Operation::ALL {
            if routes.insert(op.name(), (op, op.handler())).is_some() {
                return Err(Error::Config(format!("Duplicate route {}", op.name())));
            }
        }

        Ok(Self { routes })
    }

    /// Look up `function`
    pub fn route(&self, function: &str) -> Result<(Operation, Handler)> {
        self.routes
            .get(function)
            .copied()
            .ok_or_else(|| Error::UnknownFunction(function.to_string()))
    }

    /// Number of routed operations
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether nothing is routed
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.routes.keys().collect();
        names.sort();
        f.debug_struct("Router").field("routes", &names).finish()
    }
}
