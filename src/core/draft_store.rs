//! Drafted-contract store
//!
//! Plain CRUD persistence for drafted contracts. Drafts carry no lifecycle
//! and never touch the ledger, so the store is a thin concurrent map with
//! the same id-assignment and timestamping conventions as the record store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;

use crate::types::{CoordinatorError, DraftId, DraftedContract, UpdateDraftedContract};

/// Concurrent store of drafted contracts
pub struct DraftStore {
    /// Drafts by id
    drafts: DashMap<DraftId, DraftedContract>,

    /// Next id to assign
    next_id: AtomicU64,

    /// Current time provider (injectable for tests)
    clock: Box<dyn Fn() -> u64 + Send + Sync>,
}

impl DraftStore {
    /// Create an empty store using the system clock.
    pub fn new() -> Self {
        Self {
            drafts: DashMap::new(),
            next_id: AtomicU64::new(1),
            clock: Box::new(|| {
                SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_millis() as u64
            }),
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

    /// Persist a new draft, assigning its id and timestamps.
    pub fn insert(&self, mut draft: DraftedContract) -> DraftedContract {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let now = (self.clock)();
        draft.id = id;
        draft.created_at = now;
        draft.updated_at = now;
        self.drafts.insert(id, draft.clone());
        draft
    }

    /// Fetch a draft by id.
    pub fn get(&self, id: DraftId) -> Option<DraftedContract> {
        self.drafts.get(&id).map(|entry| entry.clone())
    }

    /// List all drafts sorted by id.
    pub fn list(&self) -> Vec<DraftedContract> {
        let mut drafts: Vec<DraftedContract> =
            self.drafts.iter().map(|entry| entry.clone()).collect();
        drafts.sort_by_key(|draft| draft.id);
        drafts
    }

    /// Apply an update request to a draft; omitted fields keep their value.
    pub fn update(
        &self,
        id: DraftId,
        update: UpdateDraftedContract,
    ) -> Result<DraftedContract, CoordinatorError> {
        let mut entry = self
            .drafts
            .get_mut(&id)
            .ok_or_else(|| CoordinatorError::draft_not_found(id))?;
        let draft = entry.value_mut();

        if let Some(title) = update.title {
            draft.title = title;
        }
        if let Some(buyer) = update.buyer {
            draft.buyer = buyer;
        }
        if let Some(seller) = update.seller {
            draft.seller = seller;
        }
        if let Some(parcel_id) = update.parcel_id {
            draft.parcel_id = parcel_id;
        }
        if let Some(body) = update.body {
            draft.body = body;
        }
        draft.updated_at = (self.clock)();

        Ok(draft.clone())
    }

    /// Remove a draft, returning it if it existed.
    pub fn remove(&self, id: DraftId) -> Option<DraftedContract> {
        self.drafts.remove(&id).map(|(_, draft)| draft)
    }

    /// Number of drafts currently stored.
    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    /// Whether the store holds no drafts.
    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }
}

impl Default for DraftStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> DraftedContract {
        DraftedContract {
            id: 0,
            title: "Lot 42 sale agreement".to_string(),
            buyer: "Alice".to_string(),
            seller: "Bob".to_string(),
            parcel_id: "42".to_string(),
            body: "The buyer agrees to purchase Lot 42.".to_string(),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let store = DraftStore::new().with_clock(|| 500);
        let stored = store.insert(draft());

        assert_eq!(stored.id, 1);
        assert_eq!(stored.created_at, 500);
        assert_eq!(store.get(1).unwrap(), stored);
    }

    #[test]
    fn test_update_merges_fields() {
        let store = DraftStore::new();
        let stored = store.insert(draft());

        let updated = store
            .update(
                stored.id,
                UpdateDraftedContract {
                    title: Some("Revised Lot 42 agreement".to_string()),
                    body: Some("The buyer agrees to purchase Lot 42 as-is.".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.title, "Revised Lot 42 agreement");
        assert_eq!(updated.buyer, "Alice");
        assert_eq!(updated.seller, "Bob");
    }

    #[test]
    fn test_update_unknown_draft_fails() {
        let store = DraftStore::new();
        let result = store.update(7, UpdateDraftedContract::default());
        assert!(matches!(
            result,
            Err(CoordinatorError::DraftNotFound { id: 7 })
        ));
    }

    #[test]
    fn test_remove_and_list() {
        let store = DraftStore::new();
        let first = store.insert(draft());
        store.insert(draft());

        assert_eq!(store.list().len(), 2);
        assert!(store.remove(first.id).is_some());
        assert_eq!(store.list().len(), 1);
        assert!(!store.is_empty());
    }
}
