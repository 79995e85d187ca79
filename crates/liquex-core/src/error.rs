//! Error types for liquex-core

use thiserror::Error;

/// Result type alias using liquex-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in liquex-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// `SQLite` error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request not found
    #[error("Request not found: {0}")]
    NotFound(String),

    /// Caller-facing validation failure
    #[error(transparent)]
    Rejected(#[from] Rejection),
}

/// Named rejections surfaced to the presentation layer.
///
/// None of these are fatal; the caller shows the message and carries on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Rejection {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),

    #[error("Location access required to raise requests")]
    LocationRequired,

    #[error("No user is logged in")]
    NotLoggedIn,

    #[error("Recipient {recipient} is not within proximity range")]
    RecipientNotNearby { recipient: String },

    #[error("Recipient {recipient} is too far away for proximity transfer ({distance_m:.0}m)")]
    RecipientOutOfRange { recipient: String, distance_m: f64 },

    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("Cannot transfer money to yourself")]
    SelfTransfer,

    #[error("Only the requester can remove request {0}")]
    NotRequester(u64),

    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("Duplicate request id: {0}")]
    DuplicateRequest(u64),
}

impl Rejection {
    /// Whether the rejection is about distance rather than input
    pub const fn is_proximity(&self) -> bool {
        matches!(
            self,
            Self::RecipientNotNearby { .. } | Self::RecipientOutOfRange { .. }
        )
    }
}

impl Error {
    /// Returns the rejection when this error is a validation failure.
    pub const fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }
}
