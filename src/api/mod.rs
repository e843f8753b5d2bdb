//! Transport wire contract
//!
//! The coordinator is fronted by a thin transport (the CLI here; any HTTP
//! router would sit in the same place). This module fixes the contract that
//! transport speaks: the JSON response shapes for each lifecycle operation
//! and the mapping from [`CoordinatorError`] to an HTTP-style status code.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::Cancellation;
use crate::types::{CoordinatorError, LifecycleState, TransactionRecord};

/// Response for a successful `create_transaction`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTransactionResponse {
    /// Human-readable confirmation
    pub message: String,

    /// Id of the created record
    pub transaction_id: u64,

    /// Agreed sale total
    pub total_amount: Decimal,

    /// Terms fingerprint stored on the record
    pub terms_hash: String,

    /// Ledger agreement address the record is bound to
    pub smart_contract_address: String,
}

impl From<&TransactionRecord> for CreateTransactionResponse {
    fn from(record: &TransactionRecord) -> Self {
        Self {
            message: "Transaction created".to_string(),
            transaction_id: record.id,
            total_amount: record.total_amount,
            terms_hash: record.terms_hash.clone(),
            smart_contract_address: record.smart_contract_address.clone(),
        }
    }
}

/// Full record view returned by reads and mutating operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionResponse {
    /// The record itself
    #[serde(flatten)]
    pub record: TransactionRecord,

    /// Lifecycle state derived from the record
    pub state: LifecycleState,
}

impl From<TransactionRecord> for TransactionResponse {
    fn from(record: TransactionRecord) -> Self {
        let state = record.state();
        Self { record, state }
    }
}

/// Plain message response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable confirmation
    pub message: String,
}

impl MessageResponse {
    /// Create a message response.
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Response for `check_verification`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResponse {
    /// The ledger's verification flag
    pub is_verified: bool,
}

/// Response for a successful `cancel_transaction`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancellationResponse {
    /// Human-readable confirmation
    pub message: String,

    /// Id of the canceled record
    pub transaction_id: u64,

    /// Computed refund (may be negative; not disbursed)
    pub refund_amount: Decimal,
}

impl From<&Cancellation> for CancellationResponse {
    fn from(cancellation: &Cancellation) -> Self {
        Self {
            message: "Transaction canceled".to_string(),
            transaction_id: cancellation.record.id,
            refund_amount: cancellation.refund_amount,
        }
    }
}

/// Error body returned for any failed operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error description
    pub error: String,
}

impl From<&CoordinatorError> for ErrorResponse {
    fn from(error: &CoordinatorError) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> TransactionRecord {
        let mut record = TransactionRecord::new(
            "Alice".to_string(),
            "Bob".to_string(),
            "42".to_string(),
            "Sale of Lot 42".to_string(),
            "0xhash".to_string(),
            Decimal::new(100000, 2),
            "0xcontract".to_string(),
        );
        record.id = 7;
        record
    }

    #[test]
    fn test_create_response_carries_binding_fields() {
        let response = CreateTransactionResponse::from(&record());
        assert_eq!(response.transaction_id, 7);
        assert_eq!(response.total_amount, Decimal::new(100000, 2));
        assert_eq!(response.terms_hash, "0xhash");
        assert_eq!(response.smart_contract_address, "0xcontract");
    }

    #[test]
    fn test_transaction_response_includes_state() {
        let json = serde_json::to_value(TransactionResponse::from(record())).unwrap();
        assert_eq!(json["state"], "Created");
        assert_eq!(json["buyer"], "Alice");
        assert_eq!(json["id"], 7);
    }

    #[test]
    fn test_error_response_from_coordinator_error() {
        let error = CoordinatorError::transaction_not_found(9);
        let response = ErrorResponse::from(&error);
        assert_eq!(response.error, "Transaction 9 not found");
        assert_eq!(error.status(), 404);
    }
}
