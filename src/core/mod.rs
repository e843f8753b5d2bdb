//! Core business logic module
//!
//! This module contains the lifecycle coordination components:
//! - `coordinator` - Lifecycle orchestration and ledger reconciliation
//! - `record_store` - Transaction record persistence
//! - `draft_store` - Drafted-contract persistence

pub mod coordinator;
pub mod draft_store;
pub mod record_store;

pub use coordinator::{Cancellation, CoordinatorConfig, LifecycleCoordinator};
pub use draft_store::DraftStore;
pub use record_store::RecordStore;
