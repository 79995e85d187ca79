//! Pending cross-device updates

use serde::{Deserialize, Serialize};

use crate::models::{Request, RequestId};

/// What another (simulated) device did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Update {
    NewRequest(Request),
    RemovedRequest { id: RequestId },
}

impl Update {
    pub const fn request_id(&self) -> RequestId {
        match self {
            Self::NewRequest(request) => request.id,
            Self::RemovedRequest { id } => *id,
        }
    }
}

/// An update queued for the next merge cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingUpdate {
    pub update: Update,
    /// Enqueue timestamp (Unix ms)
    pub timestamp: i64,
}

impl PendingUpdate {
    pub const fn new(update: Update, timestamp: i64) -> Self {
        Self { update, timestamp }
    }

    pub const fn removed(id: RequestId, timestamp: i64) -> Self {
        Self::new(Update::RemovedRequest { id }, timestamp)
    }
}
