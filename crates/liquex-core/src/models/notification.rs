//! User-visible notifications raised by the sync engine

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{DeviceType, RequestId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// A merged request from another device; distance is `None` without a viewer location
    NewRequest {
        id: RequestId,
        amount: f64,
        requester: String,
        distance_m: Option<f64>,
    },
    /// Reminder for the newest in-range request
    RequestNearby {
        id: RequestId,
        amount: f64,
        requester: String,
        distance_m: f64,
    },
    NewUserNearby {
        username: String,
        distance_m: f64,
    },
    ExternalUserNearby {
        username: String,
        device_type: DeviceType,
        distance_m: f64,
    },
    ExternalUserDetected {
        username: String,
        distance_m: f64,
    },
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewRequest {
                amount,
                requester,
                distance_m,
                ..
            } => match distance_m {
                Some(distance) => write!(
                    f,
                    "New request nearby: ${amount} from {requester} ({distance:.0}m away)"
                ),
                None => write!(
                    f,
                    "New request nearby: ${amount} from {requester} (Unknown distance)"
                ),
            },
            Self::RequestNearby {
                amount,
                requester,
                distance_m,
                ..
            } => write!(
                f,
                "New request nearby: ${amount} from {requester} ({distance_m:.0}m away)"
            ),
            Self::NewUserNearby {
                username,
                distance_m,
            } => write!(
                f,
                "New user nearby: {username} logged in from another device ({distance_m:.0}m away)"
            ),
            Self::ExternalUserNearby {
                username,
                device_type,
                distance_m,
            } => write!(
                f,
                "External user nearby: {username} logged in with different credentials on {device_type} ({distance_m:.0}m away)"
            ),
            Self::ExternalUserDetected {
                username,
                distance_m,
            } => write!(
                f,
                "External user detected: {username} ({distance_m:.0}m away)"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_request_renders_unknown_distance() {
        let notification = Notification::NewRequest {
            id: RequestId(1),
            amount: 25.5,
            requester: "John Doe".to_string(),
            distance_m: None,
        };
        assert_eq!(
            notification.to_string(),
            "New request nearby: $25.5 from John Doe (Unknown distance)"
        );
    }

    #[test]
    fn distances_are_rounded_in_messages() {
        let notification = Notification::NewUserNearby {
            username: "Jane Smith".to_string(),
            distance_m: 123.6,
        };
        assert!(notification.to_string().contains("(124m away)"));
    }
}
