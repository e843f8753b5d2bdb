//! Remote ledger client
//!
//! The remote ledger is an externally-deployed agreement contract on an
//! Ethereum-style chain. This module defines the client trait covering the
//! seven operations the coordinator consumes, plus two implementations:
//!
//! - [`RpcLedgerClient`] - JSON-RPC over HTTP against a real node
//! - [`InMemoryLedger`] - in-process agreement ledger for tests and the
//!   CLI's local mode
//!
//! Write operations block until the ledger confirms inclusion and return a
//! [`Receipt`]. The client never retries; retry policy, if any, belongs to
//! the caller.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod abi;
pub mod memory;
pub mod rpc;

pub use memory::InMemoryLedger;
pub use rpc::{LedgerConfig, RpcLedgerClient};

/// Ledger client error
///
/// A single failure taxonomy for everything that can go wrong between the
/// coordinator and the ledger: transport failures, reverted calls, and
/// confirmation timeouts all surface here with an underlying cause.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// The ledger endpoint could not be reached
    #[error("ledger unreachable: {0}")]
    Transport(String),

    /// The remote call was included but reverted
    #[error("ledger call reverted: {0}")]
    Reverted(String),

    /// The write was submitted but no receipt arrived within the poll budget
    #[error("confirmation timed out after {attempts} polls")]
    ConfirmationTimeout {
        /// Number of receipt polls attempted
        attempts: u32,
    },

    /// The ledger responded with data the client could not decode
    #[error("malformed ledger response: {0}")]
    Codec(String),

    /// An amount could not be represented in integer minor units
    #[error("amount not representable in minor units: {0}")]
    Amount(String),
}

impl From<reqwest::Error> for LedgerError {
    fn from(error: reqwest::Error) -> Self {
        LedgerError::Transport(error.to_string())
    }
}

/// Confirmation that a ledger write was included and finalized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Hash of the included transaction
    pub transaction_hash: String,

    /// Block in which the transaction was included
    pub block_number: u64,
}

/// Remote agreement state as reported by the ledger
///
/// Returned by `get_transaction_details`; the coordinator surfaces this
/// alongside the local record so callers can reconcile the two.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreementDetails {
    /// Land-parcel reference the agreement covers
    pub parcel_id: u64,

    /// Agreed sale total in minor units
    pub total_amount_cents: u64,

    /// Sum of recorded payments in minor units
    pub current_amount_paid_cents: u64,

    /// Number of installments recorded
    pub installments_paid: u64,

    /// Whether the ledger has verified the payment
    pub is_verified: bool,

    /// Whether the agreement has been signed
    pub is_agreement_signed: bool,

    /// Whether the agreement has been canceled
    pub is_canceled: bool,
}

/// Client interface for the remote agreement ledger
///
/// One method per remote capability, each taking the agreement id plus
/// operation-specific arguments. All amounts cross this boundary as integer
/// minor units (cents).
pub trait LedgerClient: Send + Sync {
    /// Register a new agreement on the ledger
    fn add_transaction(
        &self,
        agreement_id: u64,
        parcel_id: u64,
        total_amount_cents: u64,
        terms_hash: [u8; 32],
    ) -> impl std::future::Future<Output = Result<Receipt, LedgerError>> + Send;

    /// Sign an existing agreement
    fn sign_agreement(
        &self,
        agreement_id: u64,
    ) -> impl std::future::Future<Output = Result<Receipt, LedgerError>> + Send;

    /// Verify the payment for an agreement against the expected amount and
    /// terms fingerprint
    fn verify_payment(
        &self,
        agreement_id: u64,
        amount_cents: u64,
        terms_hash: [u8; 32],
    ) -> impl std::future::Future<Output = Result<Receipt, LedgerError>> + Send;

    /// Read whether the payment for an agreement has been verified
    fn is_payment_verified(
        &self,
        agreement_id: u64,
    ) -> impl std::future::Future<Output = Result<bool, LedgerError>> + Send;

    /// Record an installment payment against an agreement
    fn record_payment(
        &self,
        agreement_id: u64,
        amount_cents: u64,
    ) -> impl std::future::Future<Output = Result<Receipt, LedgerError>> + Send;

    /// Cancel an agreement
    fn cancel_transaction(
        &self,
        agreement_id: u64,
    ) -> impl std::future::Future<Output = Result<Receipt, LedgerError>> + Send;

    /// Read the full remote state of an agreement
    fn get_transaction_details(
        &self,
        agreement_id: u64,
    ) -> impl std::future::Future<Output = Result<AgreementDetails, LedgerError>> + Send;
}

/// Convert a 2-decimal-place currency amount to integer minor units (cents)
///
/// Fractional cents are truncated. Returns an error for negative amounts
/// and amounts too large for a `u64` cent count.
pub fn to_minor_units(amount: Decimal) -> Result<u64, LedgerError> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| cents.trunc().to_u64())
        .ok_or_else(|| LedgerError::Amount(amount.to_string()))
}
