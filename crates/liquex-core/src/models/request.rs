//! Request model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geo::{GeoPoint, Located};
use crate::models::{DeviceType, LoginSource};

/// Identifier of a request in the global list.
///
/// Numeric so fixture requests keep their catalogue ids; freshly raised
/// requests get ids derived from the creation time (see
/// [`crate::registry::SharedRegistry::next_request_id`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// What is being asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Money,
    Service,
    Goods,
}

impl RequestKind {
    pub const ALL: [Self; 3] = [Self::Money, Self::Service, Self::Goods];
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Money => "money",
            Self::Service => "service",
            Self::Goods => "goods",
        };
        f.write_str(label)
    }
}

impl FromStr for RequestKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "money" => Ok(Self::Money),
            "service" => Ok(Self::Service),
            "goods" => Ok(Self::Goods),
            other => Err(format!("unknown request kind '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl Urgency {
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        f.write_str(label)
    }
}

impl FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown urgency '{other}'")),
        }
    }
}

/// Device metadata carried by requests raised by external users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalOrigin {
    pub device_type: DeviceType,
    pub login_source: LoginSource,
}

/// A request for money, a service or goods. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Unique identifier within the global list
    pub id: RequestId,
    /// Amount asked for
    pub amount: f64,
    /// Request kind
    pub kind: RequestKind,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Username of the requester
    pub requester: String,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Where the request was raised
    pub location: GeoPoint,
    pub urgency: Urgency,
    pub category: String,
    /// Present when the requester is an external user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<ExternalOrigin>,
    /// Requester rating at creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester_rating: Option<f64>,
}

impl Request {
    pub const fn is_external(&self) -> bool {
        self.external.is_some()
    }

    /// Whether the request is younger than `window_ms` at `now_ms`.
    pub const fn is_recent(&self, now_ms: i64, window_ms: i64) -> bool {
        now_ms - self.created_at < window_ms
    }
}

impl Located for Request {
    fn location(&self) -> GeoPoint {
        self.location
    }

    fn owner(&self) -> &str {
        &self.requester
    }
}
