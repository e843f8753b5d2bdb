//! Transaction lifecycle coordinator
//!
//! Orchestrates the lifecycle of land-sale transactions by pairing every
//! local state transition with the corresponding remote ledger call:
//! create → sign → verify → record payments → cancel/complete.
//!
//! The coordinator enforces the consistency rules between the two sides:
//! - validation happens before anything is persisted or sent
//! - a ledger failure during creation rolls the local record back
//! - every other ledger failure is reported without local mutation, with
//!   one deliberate exception: `sign_agreement` persists its flag before
//!   the ledger confirms and does not revert it on failure
//! - read-modify-write spans that include a ledger round trip hold a
//!   per-record lock, so concurrent operations on one record serialize

use std::str::FromStr;
use std::sync::Arc;

use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{error, info, warn};

use crate::core::draft_store::DraftStore;
use crate::core::record_store::RecordStore;
use crate::ledger::{abi, to_minor_units, AgreementDetails, LedgerClient};
use crate::types::{
    CoordinatorError, DraftId, DraftedContract, NewDraftedContract, NewTransaction,
    TransactionId, TransactionRecord, UpdateDraftedContract, UpdateTransaction,
};

/// Coordinator configuration
///
/// The agreement contract address is injected here at construction; every
/// record created by this coordinator is bound to it. There is no lazy
/// deployment or runtime mutation of the address.
#[derive(Debug, Clone, Default)]
pub struct CoordinatorConfig {
    /// Address of the deployed agreement contract all records bind to
    pub agreement_address: String,
}

/// Outcome of a successful cancellation
#[derive(Debug, Clone, PartialEq)]
pub struct Cancellation {
    /// The record after the cancellation was applied
    pub record: TransactionRecord,

    /// Computed refund: `current_amount_paid - cancellation_fee`
    ///
    /// May be negative when the fee exceeds the amount paid; no clamping
    /// is applied. Disbursement itself is not performed here.
    pub refund_amount: Decimal,
}

/// Transaction lifecycle coordinator
///
/// Owns the record and draft stores plus a ledger client, and drives
/// records through their lifecycle. Generic over the ledger client so the
/// same coordinator runs against a real node or the in-memory ledger.
pub struct LifecycleCoordinator<L: LedgerClient> {
    config: CoordinatorConfig,
    ledger: L,
    records: RecordStore,
    drafts: DraftStore,

    /// Per-record locks serializing lifecycle spans that include a remote
    /// round trip
    record_locks: DashMap<TransactionId, Arc<Mutex<()>>>,
}

impl<L: LedgerClient> LifecycleCoordinator<L> {
    /// Create a coordinator with empty stores.
    pub fn new(config: CoordinatorConfig, ledger: L) -> Self {
        Self {
            config,
            ledger,
            records: RecordStore::new(),
            drafts: DraftStore::new(),
            record_locks: DashMap::new(),
        }
    }

    /// Access the underlying ledger client.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    async fn lock_record(&self, id: TransactionId) -> OwnedMutexGuard<()> {
        let mutex = self.record_locks.entry(id).or_default().clone();
        mutex.lock_owned().await
    }

    /// Create a transaction record and register the agreement on the ledger.
    ///
    /// All five fields are validated before anything is persisted. If the
    /// ledger rejects the registration, the just-created record is deleted
    /// again (best-effort compensation) and the failure is reported.
    pub async fn create_transaction(
        &self,
        request: NewTransaction,
    ) -> Result<TransactionRecord, CoordinatorError> {
        let buyer = require_field(&request.buyer, "buyer")?.to_string();
        let seller = require_field(&request.seller, "seller")?.to_string();
        let parcel_id = require_field(&request.parcel_id, "parcel_id")?.to_string();
        let terms = require_field(&request.terms, "terms")?.to_string();
        let total_text = require_field(&request.total_amount, "total_amount")?.to_string();

        let total_amount = parse_amount(&total_text)?;
        let total_cents = to_minor_units(total_amount)
            .map_err(|_| CoordinatorError::invalid_amount(&total_text))?;
        let parcel_number: u64 = parcel_id
            .parse()
            .map_err(|_| CoordinatorError::invalid_parcel_id(&parcel_id))?;

        let terms_hash_bytes = abi::keccak256(terms.as_bytes());
        let terms_hash = format!("0x{}", hex::encode(terms_hash_bytes));

        let record = self.records.insert(TransactionRecord::new(
            buyer,
            seller,
            parcel_id,
            terms,
            terms_hash,
            total_amount,
            self.config.agreement_address.clone(),
        ));

        match self
            .ledger
            .add_transaction(record.id, parcel_number, total_cents, terms_hash_bytes)
            .await
        {
            Ok(receipt) => {
                info!(
                    "Transaction {} registered on ledger (tx: {})",
                    record.id, receipt.transaction_hash
                );
                Ok(record)
            }
            Err(e) => {
                self.records.remove(record.id);
                error!(
                    "Ledger rejected agreement for transaction {}, record rolled back: {}",
                    record.id, e
                );
                Err(CoordinatorError::remote_ledger("create_transaction", e))
            }
        }
    }

    /// Sign the agreement for a record.
    ///
    /// The signed flag is persisted before the ledger call and is not
    /// reverted if the call fails, so a remote failure leaves the local
    /// flag ahead of the ledger until a later reconciliation.
    pub async fn sign_agreement(
        &self,
        id: TransactionId,
    ) -> Result<TransactionRecord, CoordinatorError> {
        let _guard = self.lock_record(id).await;

        let record = self.records.update(id, |r| r.is_agreement_signed = true)?;

        match self.ledger.sign_agreement(id).await {
            Ok(receipt) => {
                info!(
                    "Agreement {} signed on ledger (tx: {})",
                    id, receipt.transaction_hash
                );
                Ok(record)
            }
            Err(e) => {
                warn!(
                    "Ledger sign failed for transaction {} after local flag was set: {}",
                    id, e
                );
                Err(CoordinatorError::remote_ledger("sign_agreement", e))
            }
        }
    }

    /// Ask the ledger to verify the payment for a record.
    ///
    /// The stored terms are re-hashed first; a fingerprint mismatch is
    /// tamper evidence and aborts before any remote call. On ledger success
    /// the verified flag is persisted; on failure nothing changes locally.
    pub async fn verify_payment(
        &self,
        id: TransactionId,
    ) -> Result<TransactionRecord, CoordinatorError> {
        let _guard = self.lock_record(id).await;

        let record = self
            .records
            .get(id)
            .ok_or_else(|| CoordinatorError::transaction_not_found(id))?;

        let terms_hash_bytes = abi::keccak256(record.terms.as_bytes());
        if format!("0x{}", hex::encode(terms_hash_bytes)) != record.terms_hash {
            error!("Stored terms for transaction {} no longer match their hash", id);
            return Err(CoordinatorError::terms_hash_mismatch(id));
        }

        let total_cents = to_minor_units(record.total_amount)
            .map_err(|_| CoordinatorError::invalid_amount(&record.total_amount.to_string()))?;

        match self
            .ledger
            .verify_payment(id, total_cents, terms_hash_bytes)
            .await
        {
            Ok(receipt) => {
                let updated = self.records.update(id, |r| r.is_verified = true)?;
                info!(
                    "Payment verified for transaction {} (tx: {})",
                    id, receipt.transaction_hash
                );
                Ok(updated)
            }
            Err(e) => {
                error!("Ledger verification failed for transaction {}: {}", id, e);
                Err(CoordinatorError::remote_ledger("verify_payment", e))
            }
        }
    }

    /// Read the ledger's verification flag for a record.
    pub async fn check_verification(&self, id: TransactionId) -> Result<bool, CoordinatorError> {
        if self.records.get(id).is_none() {
            return Err(CoordinatorError::transaction_not_found(id));
        }

        self.ledger
            .is_payment_verified(id)
            .await
            .map_err(|e| CoordinatorError::remote_ledger("check_verification", e))
    }

    /// Record an installment payment against a record.
    ///
    /// On ledger success the running totals are updated; on failure the
    /// local record is untouched.
    pub async fn record_payment(
        &self,
        id: TransactionId,
        amount: Option<String>,
    ) -> Result<TransactionRecord, CoordinatorError> {
        let amount_text = require_field(&amount, "amount")?.to_string();
        let amount = parse_amount(&amount_text)?;
        let amount_cents = to_minor_units(amount)
            .map_err(|_| CoordinatorError::invalid_amount(&amount_text))?;

        let _guard = self.lock_record(id).await;

        if self.records.get(id).is_none() {
            return Err(CoordinatorError::transaction_not_found(id));
        }

        match self.ledger.record_payment(id, amount_cents).await {
            Ok(receipt) => {
                let updated = self.records.update(id, |r| {
                    r.current_amount_paid += amount;
                    r.installments_paid += 1;
                })?;
                info!(
                    "Recorded payment of {} against transaction {} (tx: {})",
                    amount, id, receipt.transaction_hash
                );
                Ok(updated)
            }
            Err(e) => {
                error!("Ledger payment failed for transaction {}: {}", id, e);
                Err(CoordinatorError::remote_ledger("record_payment", e))
            }
        }
    }

    /// Cancel a transaction.
    ///
    /// On ledger success the canceled flag is persisted and the refund
    /// amount is computed and reported; disbursement itself does not
    /// happen here. On failure nothing changes locally.
    pub async fn cancel_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Cancellation, CoordinatorError> {
        let _guard = self.lock_record(id).await;

        if self.records.get(id).is_none() {
            return Err(CoordinatorError::transaction_not_found(id));
        }

        match self.ledger.cancel_transaction(id).await {
            Ok(receipt) => {
                let record = self.records.update(id, |r| r.is_canceled = true)?;
                let refund_amount = record.current_amount_paid - record.cancellation_fee;
                info!(
                    "Transaction {} canceled, refund {} pending disbursement (tx: {})",
                    id, refund_amount, receipt.transaction_hash
                );
                Ok(Cancellation {
                    record,
                    refund_amount,
                })
            }
            Err(e) => {
                error!("Ledger cancellation failed for transaction {}: {}", id, e);
                Err(CoordinatorError::remote_ledger("cancel_transaction", e))
            }
        }
    }

    /// Read the remote agreement state for a record.
    pub async fn agreement_details(
        &self,
        id: TransactionId,
    ) -> Result<AgreementDetails, CoordinatorError> {
        if self.records.get(id).is_none() {
            return Err(CoordinatorError::transaction_not_found(id));
        }

        self.ledger
            .get_transaction_details(id)
            .await
            .map_err(|e| CoordinatorError::remote_ledger("get_agreement_details", e))
    }

    // Collection CRUD over transaction records

    /// Fetch a record by id.
    pub fn get_transaction(&self, id: TransactionId) -> Result<TransactionRecord, CoordinatorError> {
        self.records
            .get(id)
            .ok_or_else(|| CoordinatorError::transaction_not_found(id))
    }

    /// List all records sorted by id.
    pub fn list_transactions(&self) -> Vec<TransactionRecord> {
        self.records.list()
    }

    /// Update a record's mutable fields.
    ///
    /// `terms` and the ledger binding are immutable; fee amounts are parsed
    /// and validated before the record is touched.
    pub async fn update_transaction(
        &self,
        id: TransactionId,
        update: UpdateTransaction,
    ) -> Result<TransactionRecord, CoordinatorError> {
        let cancellation_fee = update
            .cancellation_fee
            .as_deref()
            .map(parse_amount)
            .transpose()?;
        let refund_fee = update.refund_fee.as_deref().map(parse_amount).transpose()?;

        let _guard = self.lock_record(id).await;

        self.records.update(id, |record| {
            if let Some(buyer) = update.buyer {
                record.buyer = buyer;
            }
            if let Some(seller) = update.seller {
                record.seller = seller;
            }
            if let Some(fee) = cancellation_fee {
                record.cancellation_fee = fee;
            }
            if let Some(fee) = refund_fee {
                record.refund_fee = fee;
            }
        })
    }

    /// Delete a record.
    pub fn delete_transaction(
        &self,
        id: TransactionId,
    ) -> Result<TransactionRecord, CoordinatorError> {
        self.records
            .remove(id)
            .ok_or_else(|| CoordinatorError::transaction_not_found(id))
    }

    // Drafted-contract CRUD

    /// Create a drafted contract.
    pub fn create_draft(
        &self,
        request: NewDraftedContract,
    ) -> Result<DraftedContract, CoordinatorError> {
        let title = require_field(&request.title, "title")?.to_string();
        let body = require_field(&request.body, "body")?.to_string();

        Ok(self.drafts.insert(DraftedContract {
            id: 0,
            title,
            buyer: request.buyer.unwrap_or_default(),
            seller: request.seller.unwrap_or_default(),
            parcel_id: request.parcel_id.unwrap_or_default(),
            body,
            created_at: 0,
            updated_at: 0,
        }))
    }

    /// Fetch a draft by id.
    pub fn get_draft(&self, id: DraftId) -> Result<DraftedContract, CoordinatorError> {
        self.drafts
            .get(id)
            .ok_or_else(|| CoordinatorError::draft_not_found(id))
    }

    /// List all drafts sorted by id.
    pub fn list_drafts(&self) -> Vec<DraftedContract> {
        self.drafts.list()
    }

    /// Update a draft.
    pub fn update_draft(
        &self,
        id: DraftId,
        update: UpdateDraftedContract,
    ) -> Result<DraftedContract, CoordinatorError> {
        self.drafts.update(id, update)
    }

    /// Delete a draft.
    pub fn delete_draft(&self, id: DraftId) -> Result<DraftedContract, CoordinatorError> {
        self.drafts
            .remove(id)
            .ok_or_else(|| CoordinatorError::draft_not_found(id))
    }
}

/// Require a field to be present and non-empty.
fn require_field<'a>(
    value: &'a Option<String>,
    field: &str,
) -> Result<&'a str, CoordinatorError> {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(CoordinatorError::missing_field(field)),
    }
}

/// Parse an amount string as a non-negative decimal.
fn parse_amount(text: &str) -> Result<Decimal, CoordinatorError> {
    let amount =
        Decimal::from_str(text.trim()).map_err(|_| CoordinatorError::invalid_amount(text))?;
    if amount.is_sign_negative() {
        return Err(CoordinatorError::invalid_amount(text));
    }
    Ok(amount)
}
