//! Transaction-related types for the land-sale lifecycle coordinator
//!
//! This module defines the transaction record, its derived lifecycle state,
//! and the request payloads used to create and update records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Transaction record identifier
///
/// Assigned monotonically by the record store at creation and shared with
/// the remote ledger as the agreement id.
pub type TransactionId = u64;

/// A land-sale transaction record
///
/// The local half of a ledger agreement. The coordinator mutates this record
/// in lockstep with remote ledger calls; the `terms_hash` field is the
/// integrity fingerprint shared with the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Record identifier, doubles as the ledger agreement id
    pub id: TransactionId,

    /// Buyer identity
    pub buyer: String,

    /// Seller identity
    pub seller: String,

    /// Agreed sale total (2 decimal places)
    pub total_amount: Decimal,

    /// Down-payment amount expected by the ledger (2 decimal places)
    pub amount: Decimal,

    /// External land-parcel reference
    pub parcel_id: String,

    /// Free-text contract terms
    pub terms: String,

    /// 0x-prefixed hex of keccak-256(terms), computed once at creation
    ///
    /// A later read that observes `terms_hash != keccak(terms)` is treated
    /// as tamper evidence.
    pub terms_hash: String,

    /// Address of the ledger agreement contract this record is bound to
    ///
    /// Set exactly once, at creation, from externally-injected configuration.
    pub smart_contract_address: String,

    /// Whether the ledger has verified the payment for this agreement
    pub is_verified: bool,

    /// Whether the agreement has been signed
    pub is_agreement_signed: bool,

    /// Whether the transaction has been canceled
    pub is_canceled: bool,

    /// Running total of recorded installment payments
    pub current_amount_paid: Decimal,

    /// Number of installments recorded so far
    pub installments_paid: u32,

    /// Fee withheld from the refund when the transaction is canceled
    pub cancellation_fee: Decimal,

    /// Fee charged for processing a refund disbursement
    pub refund_fee: Decimal,

    /// Creation timestamp (unix milliseconds)
    pub created_at: u64,

    /// Last-mutation timestamp (unix milliseconds)
    pub updated_at: u64,
}

impl TransactionRecord {
    /// Create a new record in the `Created` state with zeroed running totals
    ///
    /// The id and timestamps are placeholders; the record store assigns them
    /// when the record is persisted.
    pub fn new(
        buyer: String,
        seller: String,
        parcel_id: String,
        terms: String,
        terms_hash: String,
        total_amount: Decimal,
        smart_contract_address: String,
    ) -> Self {
        TransactionRecord {
            id: 0,
            buyer,
            seller,
            total_amount,
            amount: Decimal::ZERO,
            parcel_id,
            terms,
            terms_hash,
            smart_contract_address,
            is_verified: false,
            is_agreement_signed: false,
            is_canceled: false,
            current_amount_paid: Decimal::ZERO,
            installments_paid: 0,
            cancellation_fee: Decimal::ZERO,
            refund_fee: Decimal::ZERO,
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Derive the lifecycle state from the record's flags and totals
    ///
    /// Priority: a canceled record is `Canceled` regardless of other flags;
    /// a verified record that has accumulated the full total is `Completed`;
    /// a signed-but-unverified record with payments recorded is
    /// `PaymentPending`.
    pub fn state(&self) -> LifecycleState {
        if self.is_canceled {
            LifecycleState::Canceled
        } else if self.is_verified && self.current_amount_paid >= self.total_amount {
            LifecycleState::Completed
        } else if self.is_verified {
            LifecycleState::Verified
        } else if self.is_agreement_signed && self.current_amount_paid > Decimal::ZERO {
            LifecycleState::PaymentPending
        } else if self.is_agreement_signed {
            LifecycleState::Signed
        } else {
            LifecycleState::Created
        }
    }
}

/// Lifecycle state derived from a transaction record
///
/// `Created → Signed → PaymentPending → Verified → (Completed | Canceled)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Record persisted and registered on the ledger, not yet signed
    Created,

    /// Agreement signed, no payments recorded yet
    Signed,

    /// Payments recorded but the ledger has not verified the payment
    PaymentPending,

    /// Ledger has verified the payment
    Verified,

    /// Verified and paid in full
    Completed,

    /// Transaction canceled
    Canceled,
}

impl LifecycleState {
    /// Check whether this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleState::Completed | LifecycleState::Canceled)
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleState::Created => write!(f, "Created"),
            LifecycleState::Signed => write!(f, "Signed"),
            LifecycleState::PaymentPending => write!(f, "PaymentPending"),
            LifecycleState::Verified => write!(f, "Verified"),
            LifecycleState::Completed => write!(f, "Completed"),
            LifecycleState::Canceled => write!(f, "Canceled"),
        }
    }
}

/// Creation request for a transaction record
///
/// All fields arrive as optional strings from the transport; the coordinator
/// validates presence and parses the amount before anything is persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTransaction {
    /// Buyer identity (required)
    pub buyer: Option<String>,

    /// Seller identity (required)
    pub seller: Option<String>,

    /// External land-parcel reference (required, numeric)
    pub parcel_id: Option<String>,

    /// Free-text contract terms (required)
    pub terms: Option<String>,

    /// Agreed sale total as a decimal string (required, non-negative)
    pub total_amount: Option<String>,
}

/// Update request for a transaction record
///
/// Only fields with no bearing on the ledger binding are mutable. `terms`
/// is immutable after creation so that `terms_hash` remains a valid
/// fingerprint of the stored text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTransaction {
    /// Replacement buyer identity
    pub buyer: Option<String>,

    /// Replacement seller identity
    pub seller: Option<String>,

    /// Replacement cancellation fee as a decimal string
    pub cancellation_fee: Option<String>,

    /// Replacement refund fee as a decimal string
    pub refund_fee: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn record() -> TransactionRecord {
        TransactionRecord::new(
            "Alice".to_string(),
            "Bob".to_string(),
            "42".to_string(),
            "Sale of Lot 42".to_string(),
            "0x00".to_string(),
            Decimal::new(100000, 2), // 1000.00
            "0xcontract".to_string(),
        )
    }

    #[test]
    fn test_new_record_starts_in_created_state() {
        let record = record();
        assert_eq!(record.state(), LifecycleState::Created);
        assert_eq!(record.current_amount_paid, Decimal::ZERO);
        assert_eq!(record.installments_paid, 0);
        assert!(!record.is_verified);
        assert!(!record.is_agreement_signed);
        assert!(!record.is_canceled);
    }

    #[rstest]
    #[case::signed(false, false, Decimal::ZERO, LifecycleState::Signed)]
    #[case::payment_pending(false, false, Decimal::new(5000, 2), LifecycleState::PaymentPending)]
    #[case::verified(true, false, Decimal::new(5000, 2), LifecycleState::Verified)]
    #[case::completed(true, false, Decimal::new(100000, 2), LifecycleState::Completed)]
    #[case::canceled(true, true, Decimal::new(100000, 2), LifecycleState::Canceled)]
    fn test_state_derivation(
        #[case] verified: bool,
        #[case] canceled: bool,
        #[case] paid: Decimal,
        #[case] expected: LifecycleState,
    ) {
        let mut record = record();
        record.is_agreement_signed = true;
        record.is_verified = verified;
        record.is_canceled = canceled;
        record.current_amount_paid = paid;
        assert_eq!(record.state(), expected);
    }

    #[test]
    fn test_cancellation_wins_over_completion() {
        let mut record = record();
        record.is_verified = true;
        record.is_canceled = true;
        record.current_amount_paid = record.total_amount;
        assert_eq!(record.state(), LifecycleState::Canceled);
        assert!(record.state().is_terminal());
    }

    #[rstest]
    #[case(LifecycleState::Created, false)]
    #[case(LifecycleState::Signed, false)]
    #[case(LifecycleState::PaymentPending, false)]
    #[case(LifecycleState::Verified, false)]
    #[case(LifecycleState::Completed, true)]
    #[case(LifecycleState::Canceled, true)]
    fn test_terminal_states(#[case] state: LifecycleState, #[case] terminal: bool) {
        assert_eq!(state.is_terminal(), terminal);
    }
}
