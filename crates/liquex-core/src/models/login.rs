//! Simulated login records

use serde::{Deserialize, Serialize};

use crate::geo::{GeoPoint, Located};
use crate::models::{DeviceType, ExternalUser, LoginSource};

/// A login observed from another (simulated) device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentLogin {
    pub username: String,
    pub location: GeoPoint,
    /// Login timestamp (Unix ms)
    pub timestamp: i64,
    /// Synthetic device identifier, e.g. `device_k3j9x0a1b`
    pub device_id: String,
}

impl Located for RecentLogin {
    fn location(&self) -> GeoPoint {
        self.location
    }

    fn owner(&self) -> &str {
        &self.username
    }
}

/// An external user sighting kept in the capped external-login log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalLoginRecord {
    pub username: String,
    pub location: GeoPoint,
    pub distance_m: f64,
    pub timestamp: i64,
    pub device_type: DeviceType,
    pub login_source: LoginSource,
    pub rating: f64,
    pub completed_transactions: u32,
}

impl ExternalLoginRecord {
    pub fn sighting(user: &ExternalUser, distance_m: f64, timestamp: i64) -> Self {
        Self {
            username: user.user.username.clone(),
            location: user.user.location,
            distance_m,
            timestamp,
            device_type: user.device_type,
            login_source: user.login_source,
            rating: user.user.rating,
            completed_transactions: user.user.completed_transactions,
        }
    }
}
