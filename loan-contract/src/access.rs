//! Access-control gate
//!
//! One table maps every operation to its gate. An `open` gate admits any
//! caller without touching the identity layer; a `role` gate resolves the
//! caller's name and role attributes and compares the role for equality.

use crate::{dispatcher::Operation, Error, Result};
use ledger_shim::Stub;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Role allowed to create loan applications
pub const ADMIN_ROLE: &str = "Bank_Home_Loan_Admin";

/// Requirement placed on the caller of one operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    /// Any caller
    Open,
    /// Caller's role attribute must equal the value
    Role(String),
}

/// Operation → gate table plus attribute names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessPolicy {
    /// Attribute carrying the caller's display name
    pub name_attribute: String,

    /// Attribute carrying the caller's role
    pub role_attribute: String,

    /// Surface attribute lookup failures instead of denying with empty values
    pub strict_attributes: bool,

    /// Gate per operation
    pub gates: BTreeMap<Operation, Gate>,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        let mut gates = BTreeMap::new();
        gates.insert(
            Operation::CreateLoanApplication,
            Gate::Role(ADMIN_ROLE.to_string()),
        );
        gates.insert(Operation::UpdateLoanApplication, Gate::Open);
        gates.insert(Operation::GetLoanApplication, Gate::Open);

        Self {
            name_attribute: "username".to_string(),
            role_attribute: "role".to_string(),
            strict_attributes: false,
            gates,
        }
    }
}

impl AccessPolicy {
    /// Check that every operation has a gate
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = Operation::ALL
            .iter()
            .filter(|op| !self.gates.contains_key(*op))
            .map(|op| op.name())
            .collect();

        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "No access gate for: {}",
                missing.join(", ")
            )));
        }

        if let Some((op, _)) = self
            .gates
            .iter()
            .find(|(_, gate)| matches!(gate, Gate::Role(role) if role.is_empty()))
        {
            return Err(Error::Config(format!("Empty role gate for {}", op.name())));
        }

        Ok(())
    }

    /// Gate for `operation`; operations without an entry are closed
    pub fn gate(&self, operation: Operation) -> Option<&Gate> {
        self.gates.get(&operation)
    }

    /// Admit or reject the caller of `operation`
    pub fn authorize(&self, stub: &Stub<'_>, operation: Operation) -> Result<()> {
        let required = match self.gate(operation) {
            Some(Gate::Open) => return Ok(()),
            Some(Gate::Role(role)) => role.as_str(),
            None => "",
        };

        let name = self.attribute(stub, &self.name_attribute)?;
        let role = self.attribute(stub, &self.role_attribute)?;

        if !required.is_empty() && role == required {
            tracing::info!(
                parent: stub.span(),
                name = %name,
                role = %role,
                operation = operation.name(),
                "Access granted"
            );
            Ok(())
        } else {
            tracing::warn!(
                parent: stub.span(),
                name = %name,
                role = %role,
                operation = operation.name(),
                "Access denied"
            );
            Err(Error::AccessDenied {
                name,
                role,
                operation: operation.name(),
            })
        }
    }

    fn attribute(&self, stub: &Stub<'_>, attribute: &str) -> Result<String> {
        match stub.read_attribute(attribute) {
            Ok(value) => Ok(value),
            Err(source) => {
                let err = Error::AttributeResolution {
                    attribute: attribute.to_string(),
                    source,
                };
                if self.strict_attributes {
                    return Err(err);
                }
                tracing::warn!(parent: stub.span(), error = %err, "Treating attribute as empty");
                Ok(String::new())
            }
        }
    }
}
