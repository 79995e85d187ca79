//! Data models for Liquex

mod login;
mod notification;
mod place;
mod request;
mod transaction;
mod transfer;
mod update;
mod user;

pub use login::{ExternalLoginRecord, RecentLogin};
pub use notification::Notification;
pub use place::{SafeSpot, SafetyLevel};
pub use request::{ExternalOrigin, Request, RequestId, RequestKind, Urgency};
pub use transaction::{Transaction, TransactionKind, TransactionStatus, UserRating};
pub use transfer::{Transfer, TransferId, TransferStatus};
pub use update::{PendingUpdate, Update};
pub use user::{DeviceType, ExternalUser, LoginSource, User};
