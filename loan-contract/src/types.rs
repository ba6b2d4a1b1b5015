//! Loan application data model
//!
//! Field names are the storage contract: records written by any version
//! must stay readable, so every field defaults when missing and fields this
//! version does not know are carried through untouched.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// JSON key holding the workflow status
pub const STATUS_FIELD: &str = "status";

/// Read an explicit `null` as the type's default
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Conventional status values. The set is open; any string is accepted.
pub mod status {
    /// Application received
    pub const SUBMITTED: &str = "SUBMITTED";
    /// Reviewer assigned
    pub const UNDER_REVIEW: &str = "UNDER_REVIEW";
    /// Loan approved
    pub const APPROVED: &str = "APPROVED";
    /// Loan rejected
    pub const REJECTED: &str = "REJECTED";
}

/// Applicant's personal details. No format validation is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalInfo {
    /// First name
    #[serde(deserialize_with = "null_as_default", rename = "firstname")]
    pub first_name: String,

    /// Last name
    #[serde(deserialize_with = "null_as_default", rename = "lastname")]
    pub last_name: String,

    /// Date of birth
    #[serde(deserialize_with = "null_as_default", rename = "DOB")]
    pub date_of_birth: String,

    /// Email address
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,

    /// Mobile number
    #[serde(deserialize_with = "null_as_default")]
    pub mobile: String,

    /// Fields written by other versions
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Applicant's monthly finances
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FinancialInfo {
    /// Monthly salary
    #[serde(deserialize_with = "null_as_default")]
    pub monthly_salary: i64,

    /// Monthly rent
    #[serde(deserialize_with = "null_as_default")]
    pub monthly_rent: i64,

    /// Other monthly expenditure
    #[serde(deserialize_with = "null_as_default")]
    pub other_expenditure: i64,

    /// Existing monthly loan payment
    #[serde(deserialize_with = "null_as_default")]
    pub monthly_loan_payment: i64,

    /// Fields written by other versions
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The persisted loan application record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoanApplication {
    /// Identifier, doubles as the ledger key
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,

    /// Property reference
    #[serde(deserialize_with = "null_as_default")]
    pub property_id: String,

    /// Land reference
    #[serde(deserialize_with = "null_as_default")]
    pub land_id: String,

    /// Permit reference
    #[serde(deserialize_with = "null_as_default")]
    pub permit_id: String,

    /// Buyer reference
    #[serde(deserialize_with = "null_as_default")]
    pub buyer_id: String,

    /// Appraisal application reference
    #[serde(deserialize_with = "null_as_default", rename = "appraiserApplicationId")]
    pub appraisal_application_id: String,

    /// Sales contract reference
    #[serde(deserialize_with = "null_as_default")]
    pub sales_contract_id: String,

    /// Applicant details
    #[serde(deserialize_with = "null_as_default")]
    pub personal_info: PersonalInfo,

    /// Applicant finances
    #[serde(deserialize_with = "null_as_default")]
    pub financial_info: FinancialInfo,

    /// Workflow status, see [`status`]
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,

    /// Amount requested by the applicant
    #[serde(deserialize_with = "null_as_default")]
    pub requested_amount: i64,

    /// Appraised fair market value
    #[serde(deserialize_with = "null_as_default")]
    pub fair_market_value: i64,

    /// Amount approved by the bank
    #[serde(deserialize_with = "null_as_default")]
    pub approved_amount: i64,

    /// Reviewer identifier
    #[serde(deserialize_with = "null_as_default")]
    pub reviewer_id: String,

    /// Caller-supplied last modification timestamp
    #[serde(deserialize_with = "null_as_default")]
    pub last_modified_date: String,

    /// Fields written by other versions
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LoanApplication {
    /// Empty application with the given id and status
    pub fn new(id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: status.into(),
            ..Default::default()
        }
    }
}
