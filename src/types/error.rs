//! Error types for the land-sale lifecycle coordinator
//!
//! This module defines all errors a lifecycle operation can surface.
//! Each operation returns an explicit `Result`; there is no
//! exception-style control flow anywhere in the coordinator.
//!
//! # Error Categories
//!
//! - **Validation Errors**: missing or malformed request fields, detected
//!   before any persistence or remote call (status 400)
//! - **Not-Found Errors**: unknown record or draft ids (status 404)
//! - **Remote-Ledger Errors**: ledger unreachable, call reverted, or
//!   confirmation timed out (status 500)
//! - **Integrity Errors**: stored terms no longer match their hash,
//!   treated as tamper evidence (status 500)

use thiserror::Error;

/// Main error type for the lifecycle coordinator
///
/// Every lifecycle operation surfaces failures through this enum; the
/// transport boundary maps each variant to an HTTP-style status code via
/// [`CoordinatorError::status`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinatorError {
    /// A required request field is missing
    ///
    /// Detected before any persistence or remote call.
    #[error("{field} must be provided")]
    MissingField {
        /// Name of the missing field
        field: String,
    },

    /// An amount field is present but does not parse as a usable decimal
    ///
    /// Covers both malformed strings and negative values where a
    /// non-negative amount is required.
    #[error("Invalid amount '{amount}'")]
    InvalidAmount {
        /// The rejected amount string
        amount: String,
    },

    /// A parcel reference does not parse as a numeric ledger id
    #[error("Invalid parcel id '{parcel_id}'")]
    InvalidParcelId {
        /// The rejected parcel reference
        parcel_id: String,
    },

    /// No transaction record exists for the given id
    #[error("Transaction {id} not found")]
    TransactionNotFound {
        /// The unknown record id
        id: u64,
    },

    /// No drafted contract exists for the given id
    #[error("Drafted contract {id} not found")]
    DraftNotFound {
        /// The unknown draft id
        id: u64,
    },

    /// A remote ledger call failed
    ///
    /// Carries the operation that was in flight and the underlying cause
    /// reported by the ledger client. The coordinator never retries.
    #[error("Remote ledger failure during {operation}: {cause}")]
    RemoteLedger {
        /// The lifecycle operation that issued the call
        operation: String,
        /// Underlying cause reported by the ledger client
        cause: String,
    },

    /// Stored terms no longer hash to the recorded fingerprint
    ///
    /// Tamper evidence; the record can no longer be trusted to match the
    /// remote agreement.
    #[error("Terms hash mismatch for transaction {id}")]
    TermsHashMismatch {
        /// The affected record id
        id: u64,
    },
}

impl CoordinatorError {
    /// HTTP-style status code for the transport boundary
    pub fn status(&self) -> u16 {
        match self {
            CoordinatorError::MissingField { .. }
            | CoordinatorError::InvalidAmount { .. }
            | CoordinatorError::InvalidParcelId { .. } => 400,
            CoordinatorError::TransactionNotFound { .. }
            | CoordinatorError::DraftNotFound { .. } => 404,
            CoordinatorError::RemoteLedger { .. }
            | CoordinatorError::TermsHashMismatch { .. } => 500,
        }
    }
}

// Helper functions for creating common errors

impl CoordinatorError {
    /// Create a MissingField error
    pub fn missing_field(field: &str) -> Self {
        CoordinatorError::MissingField {
            field: field.to_string(),
        }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: &str) -> Self {
        CoordinatorError::InvalidAmount {
            amount: amount.to_string(),
        }
    }

    /// Create an InvalidParcelId error
    pub fn invalid_parcel_id(parcel_id: &str) -> Self {
        CoordinatorError::InvalidParcelId {
            parcel_id: parcel_id.to_string(),
        }
    }

    /// Create a TransactionNotFound error
    pub fn transaction_not_found(id: u64) -> Self {
        CoordinatorError::TransactionNotFound { id }
    }

    /// Create a DraftNotFound error
    pub fn draft_not_found(id: u64) -> Self {
        CoordinatorError::DraftNotFound { id }
    }

    /// Create a RemoteLedger error from an operation name and a cause
    pub fn remote_ledger(operation: &str, cause: impl std::fmt::Display) -> Self {
        CoordinatorError::RemoteLedger {
            operation: operation.to_string(),
            cause: cause.to_string(),
        }
    }

    /// Create a TermsHashMismatch error
    pub fn terms_hash_mismatch(id: u64) -> Self {
        CoordinatorError::TermsHashMismatch { id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::missing_field(
        CoordinatorError::MissingField { field: "buyer".to_string() },
        "buyer must be provided"
    )]
    #[case::invalid_amount(
        CoordinatorError::InvalidAmount { amount: "abc".to_string() },
        "Invalid amount 'abc'"
    )]
    #[case::invalid_parcel(
        CoordinatorError::InvalidParcelId { parcel_id: "lot-42".to_string() },
        "Invalid parcel id 'lot-42'"
    )]
    #[case::transaction_not_found(
        CoordinatorError::TransactionNotFound { id: 99 },
        "Transaction 99 not found"
    )]
    #[case::draft_not_found(
        CoordinatorError::DraftNotFound { id: 7 },
        "Drafted contract 7 not found"
    )]
    #[case::remote_ledger(
        CoordinatorError::RemoteLedger {
            operation: "create_transaction".to_string(),
            cause: "connection refused".to_string()
        },
        "Remote ledger failure during create_transaction: connection refused"
    )]
    #[case::terms_hash_mismatch(
        CoordinatorError::TermsHashMismatch { id: 3 },
        "Terms hash mismatch for transaction 3"
    )]
    fn test_error_display(#[case] error: CoordinatorError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case(CoordinatorError::missing_field("terms"), 400)]
    #[case(CoordinatorError::invalid_amount("x"), 400)]
    #[case(CoordinatorError::invalid_parcel_id("x"), 400)]
    #[case(CoordinatorError::transaction_not_found(1), 404)]
    #[case(CoordinatorError::draft_not_found(1), 404)]
    #[case(CoordinatorError::remote_ledger("sign_agreement", "reverted"), 500)]
    #[case(CoordinatorError::terms_hash_mismatch(1), 500)]
    fn test_status_mapping(#[case] error: CoordinatorError, #[case] status: u16) {
        assert_eq!(error.status(), status);
    }

    #[rstest]
    #[case::missing_field(
        CoordinatorError::missing_field("seller"),
        CoordinatorError::MissingField { field: "seller".to_string() }
    )]
    #[case::remote_ledger(
        CoordinatorError::remote_ledger("cancel_transaction", "timeout"),
        CoordinatorError::RemoteLedger {
            operation: "cancel_transaction".to_string(),
            cause: "timeout".to_string()
        }
    )]
    fn test_helper_functions(#[case] result: CoordinatorError, #[case] expected: CoordinatorError) {
        assert_eq!(result, expected);
    }
}
