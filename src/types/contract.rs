//! Drafted-contract types
//!
//! A drafted contract is a plain document record with full CRUD and no
//! lifecycle: lawyers draft and revise these before a transaction is
//! created from the agreed text.

use serde::{Deserialize, Serialize};

/// Drafted-contract identifier
pub type DraftId = u64;

/// A drafted land-sale contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftedContract {
    /// Draft identifier
    pub id: DraftId,

    /// Short title of the draft
    pub title: String,

    /// Buyer identity named in the draft
    pub buyer: String,

    /// Seller identity named in the draft
    pub seller: String,

    /// External land-parcel reference
    pub parcel_id: String,

    /// Full draft text
    pub body: String,

    /// Creation timestamp (unix milliseconds)
    pub created_at: u64,

    /// Last-mutation timestamp (unix milliseconds)
    pub updated_at: u64,
}

/// Creation request for a drafted contract
///
/// `title` and `body` are required; the identity fields default to empty
/// strings when omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewDraftedContract {
    /// Short title of the draft (required)
    pub title: Option<String>,

    /// Buyer identity named in the draft
    pub buyer: Option<String>,

    /// Seller identity named in the draft
    pub seller: Option<String>,

    /// External land-parcel reference
    pub parcel_id: Option<String>,

    /// Full draft text (required)
    pub body: Option<String>,
}

/// Update request for a drafted contract
///
/// Any subset of fields may be replaced; omitted fields keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDraftedContract {
    /// Replacement title
    pub title: Option<String>,

    /// Replacement buyer identity
    pub buyer: Option<String>,

    /// Replacement seller identity
    pub seller: Option<String>,

    /// Replacement parcel reference
    pub parcel_id: Option<String>,

    /// Replacement draft text
    pub body: Option<String>,
}
