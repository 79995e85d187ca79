//! Synthetic user models

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geo::{GeoPoint, Located};

/// A synthetic user standing in for another device in the neighbourhood
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Catalogue identifier
    pub id: u32,
    /// Display name, also the identity used on requests
    pub username: String,
    /// Contact string
    pub phone: String,
    /// Last known position
    pub location: GeoPoint,
    /// Average rating, 0-5
    pub rating: f64,
    /// Number of completed transactions
    pub completed_transactions: u32,
    /// Whether the user is online
    pub is_online: bool,
    /// Last-seen timestamp (Unix ms)
    pub last_seen: i64,
}

impl Located for User {
    fn location(&self) -> GeoPoint {
        self.location
    }

    fn owner(&self) -> &str {
        &self.username
    }
}

/// Device a user appears to log in from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    Tablet,
    Desktop,
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Mobile => "mobile",
            Self::Tablet => "tablet",
            Self::Desktop => "desktop",
        };
        f.write_str(label)
    }
}

impl FromStr for DeviceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mobile" => Ok(Self::Mobile),
            "tablet" => Ok(Self::Tablet),
            "desktop" => Ok(Self::Desktop),
            other => Err(format!("unknown device type '{other}'")),
        }
    }
}

/// Where an externally sourced login came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoginSource {
    #[default]
    ExternalDevice,
    DifferentCredentials,
}

impl fmt::Display for LoginSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExternalDevice => f.write_str("external_device"),
            Self::DifferentCredentials => f.write_str("different_credentials"),
        }
    }
}

/// A synthetic user that appears to arrive from other credentials or another device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalUser {
    #[serde(flatten)]
    pub user: User,
    pub is_external: bool,
    pub device_type: DeviceType,
    pub login_source: LoginSource,
}

impl ExternalUser {
    pub fn username(&self) -> &str {
        &self.user.username
    }
}

impl Located for ExternalUser {
    fn location(&self) -> GeoPoint {
        self.user.location
    }

    fn owner(&self) -> &str {
        &self.user.username
    }
}
