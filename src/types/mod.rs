//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `transaction`: Transaction records, lifecycle state, and request payloads
//! - `contract`: Drafted-contract records and request payloads
//! - `error`: Error types for the lifecycle coordinator

pub mod contract;
pub mod error;
pub mod transaction;

pub use contract::{DraftId, DraftedContract, NewDraftedContract, UpdateDraftedContract};
pub use error::CoordinatorError;
pub use transaction::{
    LifecycleState, NewTransaction, TransactionId, TransactionRecord, UpdateTransaction,
};
