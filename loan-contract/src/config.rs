//! Configuration for the loan contract and its peer

use crate::{access::AccessPolicy, events::EventPolicy, Error, Result};
use serde::{Deserialize, Serialize};

/// Contract behavior
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
    /// Operation → gate table
    pub access: AccessPolicy,

    /// Whether a failed event emission fails the operation
    pub event_policy: EventPolicy,

    /// Refuse to create over an existing key instead of overwriting it
    pub reject_existing_on_create: bool,
}

/// Full peer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// State store, identity and event settings
    pub ledger: ledger_shim::Config,

    /// Contract settings
    pub contract: ContractConfig,
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.as_ref().display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse from a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.contract.access.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let ledger = ledger_shim::Config::from_env().map_err(|e| Error::Config(e.to_string()))?;
        let mut contract = ContractConfig::default();

        if let Ok(policy) = std::env::var("LOAN_EVENT_POLICY") {
            contract.event_policy = match policy.as_str() {
                "required" => EventPolicy::Required,
                "best_effort" => EventPolicy::BestEffort,
                other => {
                    return Err(Error::Config(format!("Invalid LOAN_EVENT_POLICY: {}", other)))
                }
            };
        }

        if let Ok(flag) = std::env::var("LOAN_REJECT_EXISTING") {
            contract.reject_existing_on_create = flag
                .parse()
                .map_err(|e| Error::Config(format!("Invalid LOAN_REJECT_EXISTING: {}", e)))?;
        }

        if let Ok(role) = std::env::var("LOAN_ADMIN_ROLE") {
            contract.access.gates.insert(
                crate::dispatcher::Operation::CreateLoanApplication,
                crate::access::Gate::Role(role),
            );
        }

        contract.access.validate()?;
        Ok(Config { ledger, contract })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{Gate, ADMIN_ROLE};
    use crate::dispatcher::Operation;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.contract.event_policy, EventPolicy::Required);
        assert!(!config.contract.reject_existing_on_create);
        assert_eq!(
            config.contract.access.gate(Operation::CreateLoanApplication),
            Some(&Gate::Role(ADMIN_ROLE.to_string()))
        );
    }

    #[test]
    fn test_from_toml() {
        let config = Config::from_toml(
            r#"
            [ledger]
            data_dir = "/tmp/loans"

            [ledger.identity]
            trusted_issuers = []

            [contract]
            event_policy = "best_effort"
            reject_existing_on_create = true
            "#,
        )
        .unwrap();

        assert_eq!(config.ledger.data_dir, std::path::PathBuf::from("/tmp/loans"));
        assert_eq!(config.contract.event_policy, EventPolicy::BestEffort);
        assert!(config.contract.reject_existing_on_create);
        assert!(config.contract.access.validate().is_ok());
    }

    #[test]
    fn test_from_toml_rejects_bad_gate_table() {
        let result = Config::from_toml(
            r#"
            [contract.access.gates]
            CreateLoanApplication = "open"
            "#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
