//! In-process agreement ledger
//!
//! Mirrors the remote contract's agreement semantics over a `DashMap` so the
//! coordinator can run without a node: tests drive the compensation and
//! failure paths through injected failures, and the CLI's local mode uses it
//! as a dry-run ledger.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::ledger::abi;
use crate::ledger::{AgreementDetails, LedgerClient, LedgerError, Receipt};

/// Remote agreement state held by the in-memory ledger
#[derive(Debug, Clone)]
struct Agreement {
    parcel_id: u64,
    total_amount_cents: u64,
    terms_hash: [u8; 32],
    is_agreement_signed: bool,
    is_verified: bool,
    is_canceled: bool,
    current_amount_paid_cents: u64,
    installments_paid: u64,
}

/// In-memory ledger with per-operation failure injection
///
/// Operation names accepted by [`InMemoryLedger::fail_on`] match the remote
/// contract functions: `addTransaction`, `signAgreement`, `verifyPayment`,
/// `isPaymentVerified`, `recordPayment`, `cancelTransaction`,
/// `getTransactionDetails`.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    /// Agreement state by agreement id
    agreements: DashMap<u64, Agreement>,

    /// Operations currently forced to fail
    failing_ops: DashMap<String, ()>,

    /// Monotonic counter behind synthetic receipts
    nonce: AtomicU64,
}

impl InMemoryLedger {
    /// Create an empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Force every subsequent call of the named operation to fail.
    pub fn fail_on(&self, operation: &str) {
        self.failing_ops.insert(operation.to_string(), ());
    }

    /// Clear all injected failures.
    pub fn clear_failures(&self) {
        self.failing_ops.clear();
    }

    /// Number of agreements currently registered.
    pub fn agreement_count(&self) -> usize {
        self.agreements.len()
    }

    fn check_failure(&self, operation: &str) -> Result<(), LedgerError> {
        if self.failing_ops.contains_key(operation) {
            return Err(LedgerError::Transport(format!(
                "injected failure for {}",
                operation
            )));
        }
        Ok(())
    }

    fn receipt(&self, operation: &str) -> Receipt {
        let nonce = self.nonce.fetch_add(1, Ordering::Relaxed) + 1;
        let payload = format!("{}:{}", operation, nonce);
        Receipt {
            transaction_hash: abi::keccak256_hex(payload.as_bytes()),
            block_number: nonce,
        }
    }

    fn with_agreement<T>(
        &self,
        agreement_id: u64,
        f: impl FnOnce(&mut Agreement) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let mut entry = self.agreements.get_mut(&agreement_id).ok_or_else(|| {
            LedgerError::Reverted(format!("unknown agreement {}", agreement_id))
        })?;
        f(entry.value_mut())
    }
}

impl LedgerClient for InMemoryLedger {
    async fn add_transaction(
        &self,
        agreement_id: u64,
        parcel_id: u64,
        total_amount_cents: u64,
        terms_hash: [u8; 32],
    ) -> Result<Receipt, LedgerError> {
        self.check_failure("addTransaction")?;

        if self.agreements.contains_key(&agreement_id) {
            return Err(LedgerError::Reverted(format!(
                "agreement {} already exists",
                agreement_id
            )));
        }

        self.agreements.insert(
            agreement_id,
            Agreement {
                parcel_id,
                total_amount_cents,
                terms_hash,
                is_agreement_signed: false,
                is_verified: false,
                is_canceled: false,
                current_amount_paid_cents: 0,
                installments_paid: 0,
            },
        );

        Ok(self.receipt("addTransaction"))
    }

    async fn sign_agreement(&self, agreement_id: u64) -> Result<Receipt, LedgerError> {
        self.check_failure("signAgreement")?;

        self.with_agreement(agreement_id, |agreement| {
            if agreement.is_canceled {
                return Err(LedgerError::Reverted("agreement is canceled".to_string()));
            }
            agreement.is_agreement_signed = true;
            Ok(())
        })?;

        Ok(self.receipt("signAgreement"))
    }

    async fn verify_payment(
        &self,
        agreement_id: u64,
        amount_cents: u64,
        terms_hash: [u8; 32],
    ) -> Result<Receipt, LedgerError> {
        self.check_failure("verifyPayment")?;

        self.with_agreement(agreement_id, |agreement| {
            if agreement.is_canceled {
                return Err(LedgerError::Reverted("agreement is canceled".to_string()));
            }
            if agreement.terms_hash != terms_hash {
                return Err(LedgerError::Reverted("terms hash mismatch".to_string()));
            }
            if amount_cents > agreement.total_amount_cents {
                return Err(LedgerError::Reverted(
                    "amount exceeds agreement total".to_string(),
                ));
            }
            agreement.is_verified = true;
            Ok(())
        })?;

        Ok(self.receipt("verifyPayment"))
    }

    async fn is_payment_verified(&self, agreement_id: u64) -> Result<bool, LedgerError> {
        self.check_failure("isPaymentVerified")?;

        // Unknown agreements read as unverified, matching the contract's
        // default mapping value.
        Ok(self
            .agreements
            .get(&agreement_id)
            .map(|agreement| agreement.is_verified)
            .unwrap_or(false))
    }

    async fn record_payment(
        &self,
        agreement_id: u64,
        amount_cents: u64,
    ) -> Result<Receipt, LedgerError> {
        self.check_failure("recordPayment")?;

        self.with_agreement(agreement_id, |agreement| {
            if agreement.is_canceled {
                return Err(LedgerError::Reverted("agreement is canceled".to_string()));
            }
            agreement.current_amount_paid_cents = agreement
                .current_amount_paid_cents
                .checked_add(amount_cents)
                .ok_or_else(|| LedgerError::Reverted("payment total overflow".to_string()))?;
            agreement.installments_paid += 1;
            Ok(())
        })?;

        Ok(self.receipt("recordPayment"))
    }

    async fn cancel_transaction(&self, agreement_id: u64) -> Result<Receipt, LedgerError> {
        self.check_failure("cancelTransaction")?;

        self.with_agreement(agreement_id, |agreement| {
            if agreement.is_canceled {
                return Err(LedgerError::Reverted(
                    "agreement already canceled".to_string(),
                ));
            }
            agreement.is_canceled = true;
            Ok(())
        })?;

        Ok(self.receipt("cancelTransaction"))
    }

    async fn get_transaction_details(
        &self,
        agreement_id: u64,
    ) -> Result<AgreementDetails, LedgerError> {
        self.check_failure("getTransactionDetails")?;

        let agreement = self.agreements.get(&agreement_id).ok_or_else(|| {
            LedgerError::Reverted(format!("unknown agreement {}", agreement_id))
        })?;

        Ok(AgreementDetails {
            parcel_id: agreement.parcel_id,
            total_amount_cents: agreement.total_amount_cents,
            current_amount_paid_cents: agreement.current_amount_paid_cents,
            installments_paid: agreement.installments_paid,
            is_verified: agreement.is_verified,
            is_agreement_signed: agreement.is_agreement_signed,
            is_canceled: agreement.is_canceled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::abi::keccak256;

    fn terms_hash() -> [u8; 32] {
        keccak256(b"Terms and conditions")
    }

    #[tokio::test]
    async fn test_add_and_read_agreement() {
        let ledger = InMemoryLedger::new();

        let receipt = ledger
            .add_transaction(1, 42, 100_000, terms_hash())
            .await
            .unwrap();
        assert!(receipt.transaction_hash.starts_with("0x"));
        assert_eq!(ledger.agreement_count(), 1);

        let details = ledger.get_transaction_details(1).await.unwrap();
        assert_eq!(details.parcel_id, 42);
        assert_eq!(details.total_amount_cents, 100_000);
        assert_eq!(details.current_amount_paid_cents, 0);
        assert!(!details.is_verified);
    }

    #[tokio::test]
    async fn test_duplicate_agreement_reverts() {
        let ledger = InMemoryLedger::new();
        ledger
            .add_transaction(1, 42, 100_000, terms_hash())
            .await
            .unwrap();

        let result = ledger.add_transaction(1, 42, 100_000, terms_hash()).await;
        assert!(matches!(result, Err(LedgerError::Reverted(_))));
    }

    #[tokio::test]
    async fn test_verify_payment_requires_matching_terms_hash() {
        let ledger = InMemoryLedger::new();
        ledger
            .add_transaction(1, 42, 100_000, terms_hash())
            .await
            .unwrap();

        let tampered = keccak256(b"Different terms");
        let result = ledger.verify_payment(1, 100_000, tampered).await;
        assert!(matches!(result, Err(LedgerError::Reverted(_))));
        assert!(!ledger.is_payment_verified(1).await.unwrap());

        ledger.verify_payment(1, 100_000, terms_hash()).await.unwrap();
        assert!(ledger.is_payment_verified(1).await.unwrap());
    }

    #[tokio::test]
    async fn test_record_payment_accumulates() {
        let ledger = InMemoryLedger::new();
        ledger
            .add_transaction(1, 42, 100_000, terms_hash())
            .await
            .unwrap();

        ledger.record_payment(1, 25_000).await.unwrap();
        ledger.record_payment(1, 10_000).await.unwrap();

        let details = ledger.get_transaction_details(1).await.unwrap();
        assert_eq!(details.current_amount_paid_cents, 35_000);
        assert_eq!(details.installments_paid, 2);
    }

    #[tokio::test]
    async fn test_canceled_agreement_rejects_payments() {
        let ledger = InMemoryLedger::new();
        ledger
            .add_transaction(1, 42, 100_000, terms_hash())
            .await
            .unwrap();
        ledger.cancel_transaction(1).await.unwrap();

        let result = ledger.record_payment(1, 1_000).await;
        assert!(matches!(result, Err(LedgerError::Reverted(_))));

        let result = ledger.cancel_transaction(1).await;
        assert!(matches!(result, Err(LedgerError::Reverted(_))));
    }

    #[tokio::test]
    async fn test_unknown_agreement_reads_as_unverified() {
        let ledger = InMemoryLedger::new();
        assert!(!ledger.is_payment_verified(999).await.unwrap());
        assert!(ledger.get_transaction_details(999).await.is_err());
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let ledger = InMemoryLedger::new();
        ledger.fail_on("addTransaction");

        let result = ledger.add_transaction(1, 42, 100_000, terms_hash()).await;
        assert!(matches!(result, Err(LedgerError::Transport(_))));
        assert_eq!(ledger.agreement_count(), 0);

        ledger.clear_failures();
        assert!(ledger.add_transaction(1, 42, 100_000, terms_hash()).await.is_ok());
    }
}
