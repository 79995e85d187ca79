//! Safe meet-up places

use serde::{Deserialize, Serialize};

use crate::geo::{GeoPoint, Located};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyLevel {
    High,
    Medium,
    Low,
}

/// A public spot suggested for handing over cash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafeSpot {
    pub name: String,
    pub coordinates: GeoPoint,
    pub safety: SafetyLevel,
}

impl Located for SafeSpot {
    fn location(&self) -> GeoPoint {
        self.coordinates
    }

    // Places belong to nobody, so self-exclusion never drops them.
    fn owner(&self) -> &str {
        ""
    }
}
