//! Transaction record store
//!
//! CRUD persistence for transaction records over a concurrent map. The
//! store assigns ids monotonically, stamps timestamps on every mutation,
//! and exposes closure-based atomic updates so callers never observe a
//! partially-updated record.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;

use crate::types::{CoordinatorError, TransactionId, TransactionRecord};

/// Clock function returning unix milliseconds
pub type ClockFn = Box<dyn Fn() -> u64 + Send + Sync>;

fn system_clock() -> ClockFn {
    Box::new(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    })
}

/// Concurrent store of transaction records
///
/// `DashMap` provides fine-grained locking per record, so operations on
/// different records never block each other. Serialization of whole
/// read-call-write lifecycle spans is the coordinator's job, not the
/// store's.
pub struct RecordStore {
    /// Records by id
    records: DashMap<TransactionId, TransactionRecord>,

    /// Next id to assign
    next_id: AtomicU64,

    /// Current time provider (injectable for tests)
    clock: ClockFn,
}

impl RecordStore {
    /// Create an empty store using the system clock.
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            next_id: AtomicU64::new(1),
            clock: system_clock(),
        }
    }

    /// Replace the clock function (for tests).
    pub fn with_clock<F>(mut self, f: F) -> Self
    where
        F: Fn() -> u64 + Send + Sync + 'static,
    {
        self.clock = Box::new(f);
        self
    }

    /// Persist a new record, assigning its id and timestamps.
    ///
    /// Returns the record as stored.
    pub fn insert(&self, mut record: TransactionRecord) -> TransactionRecord {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let now = (self.clock)();
        record.id = id;
        record.created_at = now;
        record.updated_at = now;
        self.records.insert(id, record.clone());
        record
    }

    /// Fetch a record by id.
    pub fn get(&self, id: TransactionId) -> Option<TransactionRecord> {
        self.records.get(&id).map(|entry| entry.clone())
    }

    /// List all records sorted by id.
    pub fn list(&self) -> Vec<TransactionRecord> {
        let mut records: Vec<TransactionRecord> =
            self.records.iter().map(|entry| entry.clone()).collect();
        records.sort_by_key(|record| record.id);
        records
    }

    /// Atomically update a record through a closure.
    ///
    /// The closure runs while the record's map entry is locked; `updated_at`
    /// is stamped afterwards. Returns the updated record.
    pub fn update<F>(&self, id: TransactionId, f: F) -> Result<TransactionRecord, CoordinatorError>
    where
        F: FnOnce(&mut TransactionRecord),
    {
        let mut entry = self
            .records
            .get_mut(&id)
            .ok_or_else(|| CoordinatorError::transaction_not_found(id))?;
        let record = entry.value_mut();
        f(record);
        record.updated_at = (self.clock)();
        Ok(record.clone())
    }

    /// Remove a record, returning it if it existed.
    ///
    /// Used both by collection CRUD and as the compensation path when the
    /// ledger rejects a just-created record.
    pub fn remove(&self, id: TransactionId) -> Option<TransactionRecord> {
        self.records.remove(&id).map(|(_, record)| record)
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}
