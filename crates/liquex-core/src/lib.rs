//! liquex-core - Core library for Liquex
//!
//! This crate contains the models, the shared registry, and the sync,
//! proximity and simulation engines behind every Liquex front end.

pub mod analytics;
pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod fixtures;
pub mod geo;
pub mod models;
pub mod proximity;
pub mod registry;
pub mod simulation;
pub mod sync;
pub mod util;

pub use app::{Liquex, LocationFix, RequestDraft, RequestView, Session};
pub use config::LiquexConfig;
pub use db::SqliteStore;
pub use error::{Error, Rejection, Result};
pub use geo::{haversine_distance_m, GeoPoint, Located, ProximityBand};
pub use models::{Request, RequestId, Transaction, Transfer};
pub use proximity::{Nearby, Neighbour, TransferDraft};
pub use registry::{KeyValueStore, MemoryStore, SharedRegistry};
