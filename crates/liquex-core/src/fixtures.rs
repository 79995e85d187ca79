//! Static demo catalogue: synthetic users, external users, sample requests,
//! chat templates, meet-up spots and seed history.
//!
//! Every timestamp is expressed relative to the `now_ms` passed to
//! [`Fixtures::demo`], so tests get a deterministic catalogue.

use crate::geo::GeoPoint;
use crate::models::{
    DeviceType, ExternalUser, LoginSource, Request, RequestId, RequestKind, SafeSpot, SafetyLevel,
    Transaction, TransactionKind, TransactionStatus, Urgency, User,
};

/// Default demo coordinate; every fixture starts here.
pub const DEMO_LOCATION: GeoPoint = GeoPoint::new(16.922_251, 82.000_117);

/// Persona used by the quick demo login.
pub const DEMO_USERNAME: &str = "demo";

/// Categories the simulation picks from.
pub const REQUEST_CATEGORIES: [&str; 5] = ["food", "transport", "shopping", "services", "delivery"];

/// Descriptions appended to simulated requests.
pub const REQUEST_DESCRIPTIONS: [&str; 7] = [
    "Need help with something urgent",
    "Looking for assistance nearby",
    "Quick favor needed",
    "Emergency situation",
    "Need cash for immediate use",
    "Help with transportation",
    "Service request in the area",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatTemplate {
    Greetings,
    Questions,
    Confirmations,
}

const GREETINGS: [&str; 4] = [
    "Hi! I'm interested in your request.",
    "Hello! I can help you with that.",
    "Hey there! I'd like to assist you.",
    "Good day! I'm available to help.",
];

const QUESTIONS: [&str; 4] = [
    "When do you need this by?",
    "Where would you like to meet?",
    "Is there anything specific I should know?",
    "What's the best time for you?",
];

const CONFIRMATIONS: [&str; 4] = [
    "Perfect! I'll be there soon.",
    "Great! See you in a bit.",
    "Excellent! I'm on my way.",
    "Awesome! I'll meet you there.",
];

impl ChatTemplate {
    pub const fn messages(self) -> &'static [&'static str] {
        match self {
            Self::Greetings => &GREETINGS,
            Self::Questions => &QUESTIONS,
            Self::Confirmations => &CONFIRMATIONS,
        }
    }
}

/// The demo catalogue
#[derive(Debug, Clone, PartialEq)]
pub struct Fixtures {
    pub users: Vec<User>,
    pub external_users: Vec<ExternalUser>,
    pub sample_requests: Vec<Request>,
    pub safe_spots: Vec<SafeSpot>,
    pub transaction_history: Vec<Transaction>,
}

impl Fixtures {
    /// Build the demo catalogue anchored at `now_ms`.
    pub fn demo(now_ms: i64) -> Self {
        Self {
            users: demo_users(now_ms),
            external_users: demo_external_users(now_ms),
            sample_requests: demo_requests(now_ms),
            safe_spots: demo_safe_spots(),
            transaction_history: demo_history(now_ms),
        }
    }

    pub fn user(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|user| user.username == username)
    }

    pub fn external_user(&self, username: &str) -> Option<&ExternalUser> {
        self.external_users
            .iter()
            .find(|user| user.user.username == username)
    }
}

fn user(
    id: u32,
    username: &str,
    phone: &str,
    rating: f64,
    completed_transactions: u32,
    last_seen: i64,
) -> User {
    User {
        id,
        username: username.to_string(),
        phone: phone.to_string(),
        location: DEMO_LOCATION,
        rating,
        completed_transactions,
        is_online: true,
        last_seen,
    }
}

fn demo_users(now: i64) -> Vec<User> {
    vec![
        user(1, "John Doe", "+1-555-0101", 4.8, 15, now - 300_000),
        user(2, "Jane Smith", "+1-555-0102", 4.9, 23, now - 120_000),
        user(3, "Mike Johnson", "+1-555-0103", 4.7, 8, now - 60_000),
        user(4, "Sarah Wilson", "+1-555-0104", 4.6, 12, now - 180_000),
        user(5, "Alex Chen", "+1-555-0105", 4.9, 31, now - 45_000),
        user(6, "Maria Garcia", "+1-555-0106", 4.5, 7, now - 240_000),
    ]
}

fn demo_external_users(now: i64) -> Vec<ExternalUser> {
    let external = |user: User, device_type| ExternalUser {
        user,
        is_external: true,
        device_type,
        login_source: LoginSource::ExternalDevice,
    };

    vec![
        external(
            user(101, "ExternalUser1", "+1-555-0201", 4.6, 18, now - 120_000),
            DeviceType::Mobile,
        ),
        external(
            user(102, "ExternalUser2", "+1-555-0202", 4.8, 25, now - 180_000),
            DeviceType::Tablet,
        ),
        external(
            user(103, "ExternalUser3", "+1-555-0203", 4.7, 12, now - 240_000),
            DeviceType::Desktop,
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn request(
    id: u64,
    amount: f64,
    kind: RequestKind,
    description: &str,
    requester: &str,
    created_at: i64,
    urgency: Urgency,
    category: &str,
    requester_rating: Option<f64>,
) -> Request {
    Request {
        id: RequestId(id),
        amount,
        kind,
        description: description.to_string(),
        requester: requester.to_string(),
        created_at,
        location: DEMO_LOCATION,
        urgency,
        category: category.to_string(),
        external: None,
        requester_rating,
    }
}

fn demo_requests(now: i64) -> Vec<Request> {
    vec![
        request(
            1,
            25.50,
            RequestKind::Money,
            "Need cash for lunch at the food court. Will pay back tomorrow!",
            "John Doe",
            now - 300_000,
            Urgency::Medium,
            "food",
            None,
        ),
        request(
            2,
            15.00,
            RequestKind::Service,
            "Help with grocery shopping. Need someone to pick up a few items.",
            "Jane Smith",
            now - 600_000,
            Urgency::Low,
            "shopping",
            None,
        ),
        request(
            3,
            50.00,
            RequestKind::Money,
            "Emergency cash needed for taxi fare. Will transfer immediately.",
            "Mike Johnson",
            now - 900_000,
            Urgency::High,
            "transport",
            None,
        ),
        request(
            4,
            30.00,
            RequestKind::Goods,
            "Looking for someone to deliver a small package within the area.",
            "Sarah Wilson",
            now - 1_200_000,
            Urgency::Medium,
            "delivery",
            None,
        ),
        request(
            5,
            12.00,
            RequestKind::Money,
            "Need cash for coffee - will pay back immediately!",
            "Alex Chen",
            now - 180_000,
            Urgency::Low,
            "food",
            Some(4.9),
        ),
        request(
            6,
            8.50,
            RequestKind::Service,
            "Quick help with carrying groceries to my car",
            "Maria Garcia",
            now - 240_000,
            Urgency::Low,
            "services",
            Some(4.5),
        ),
    ]
}

fn demo_safe_spots() -> Vec<SafeSpot> {
    let spot = |name: &str, safety| SafeSpot {
        name: name.to_string(),
        coordinates: DEMO_LOCATION,
        safety,
    };

    vec![
        spot("Central Park Bench", SafetyLevel::High),
        spot("Coffee Shop Entrance", SafetyLevel::High),
        spot("Subway Station Platform", SafetyLevel::Medium),
        spot("Shopping Mall Food Court", SafetyLevel::High),
    ]
}

fn demo_history(now: i64) -> Vec<Transaction> {
    vec![
        Transaction {
            id: "TXN001".to_string(),
            amount: 20.00,
            kind: TransactionKind::Money,
            requester: "John Doe".to_string(),
            responder: "DemoUser".to_string(),
            status: TransactionStatus::Completed,
            timestamp: now - 86_400_000,
            rating: Some(5),
        },
        Transaction {
            id: "TXN002".to_string(),
            amount: 35.50,
            kind: TransactionKind::Service,
            requester: "DemoUser".to_string(),
            responder: "Jane Smith".to_string(),
            status: TransactionStatus::Completed,
            timestamp: now - 172_800_000,
            rating: Some(4),
        },
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn catalogue_sizes() {
        let fixtures = Fixtures::demo(1_000_000_000);
        assert_eq!(fixtures.users.len(), 6);
        assert_eq!(fixtures.external_users.len(), 3);
        assert_eq!(fixtures.sample_requests.len(), 6);
        assert_eq!(fixtures.safe_spots.len(), 4);
        assert_eq!(fixtures.transaction_history.len(), 2);
    }

    #[test]
    fn sample_request_ids_are_unique() {
        let fixtures = Fixtures::demo(1_000_000_000);
        let ids = fixtures
            .sample_requests
            .iter()
            .map(|request| request.id)
            .collect::<HashSet<_>>();
        assert_eq!(ids.len(), fixtures.sample_requests.len());
    }

    #[test]
    fn lookups_by_username() {
        let fixtures = Fixtures::demo(0);
        assert_eq!(fixtures.user("Alex Chen").map(|user| user.id), Some(5));
        assert!(fixtures.external_user("ExternalUser2").is_some());
        assert!(fixtures.user("Nobody").is_none());
    }

    #[test]
    fn chat_templates_are_not_empty() {
        for template in [
            ChatTemplate::Greetings,
            ChatTemplate::Questions,
            ChatTemplate::Confirmations,
        ] {
            assert!(!template.messages().is_empty());
        }
    }
}
