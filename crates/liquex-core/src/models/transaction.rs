//! Transaction history and rating records

use serde::{Deserialize, Serialize};

use crate::models::RequestKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Money,
    Service,
    Goods,
    ProximityTransfer,
}

impl From<RequestKind> for TransactionKind {
    fn from(kind: RequestKind) -> Self {
        match kind {
            RequestKind::Money => Self::Money,
            RequestKind::Service => Self::Service,
            RequestKind::Goods => Self::Goods,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Completed,
}

/// Append-only history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// `TXN`-prefixed identifier
    pub id: String,
    pub amount: f64,
    pub kind: TransactionKind,
    pub requester: String,
    pub responder: String,
    pub status: TransactionStatus,
    /// Completion timestamp (Unix ms)
    pub timestamp: i64,
    /// Optional 1-5 rating
    #[serde(default)]
    pub rating: Option<u8>,
}

impl Transaction {
    /// Build the history identifier for a transaction completed at `timestamp_ms`.
    pub fn id_for(timestamp_ms: i64) -> String {
        format!("TXN{timestamp_ms}")
    }
}

/// A single rating left for a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRating {
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    pub timestamp: i64,
    pub rater: String,
}
