//! Land Ledger Coordinator Library
//! # Overview
//!
//! This library coordinates land-sale transaction records with an
//! externally-deployed agreement contract on an Ethereum-style ledger.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (TransactionRecord, DraftedContract, errors)
//! - [`cli`] - CLI argument parsing
//! - [`core`] - Business logic components:
//!   - [`core::coordinator`] - Lifecycle orchestration and ledger reconciliation
//!   - [`core::record_store`] - Transaction record persistence
//!   - [`core::draft_store`] - Drafted-contract persistence
//! - [`ledger`] - Remote ledger client (JSON-RPC and in-memory backends)
//! - [`api`] - Transport wire contract (response shapes, status mapping)
//!
//! # Transaction Lifecycle
//!
//! A record moves through the states
//! `Created → Signed → PaymentPending → Verified → (Completed | Canceled)`.
//! Every transition pairs a local mutation with a remote ledger call:
//!
//! - **create_transaction**: validate, persist, register the agreement;
//!   roll the record back if the ledger rejects it
//! - **sign_agreement**: set the signed flag, then confirm on the ledger
//! - **verify_payment**: ask the ledger to verify against the terms hash
//! - **record_payment**: record an installment and accumulate totals
//! - **cancel_transaction**: cancel on the ledger and compute the refund
//!
//! # Consistency
//!
//! Validation happens before persistence or remote calls; ledger failures
//! never half-apply a transition (with the documented exception of
//! `sign_agreement`); read-modify-write spans hold a per-record lock.

// Module declarations
pub mod api;
pub mod cli;
pub mod core;
pub mod ledger;
pub mod types;

pub use core::{Cancellation, CoordinatorConfig, DraftStore, LifecycleCoordinator, RecordStore};
pub use ledger::{
    AgreementDetails, InMemoryLedger, LedgerClient, LedgerConfig, LedgerError, Receipt,
    RpcLedgerClient,
};
pub use types::{
    CoordinatorError, DraftedContract, LifecycleState, NewDraftedContract, NewTransaction,
    TransactionId, TransactionRecord, UpdateDraftedContract, UpdateTransaction,
};
