//! Proximity filtering, ranking and proximity-checked transfers.
//!
//! Membership is the closed interval `[0, radius]` on the raw haversine
//! distance. Every ranking is a stable ascending sort, so ties keep catalogue
//! order.

use std::cmp::Ordering;

use serde::Serialize;

use crate::error::{Rejection, Result};
use crate::fixtures::Fixtures;
use crate::geo::{GeoPoint, Located, ProximityBand};
use crate::models::{
    DeviceType, ExternalUser, Request, SafeSpot, Transaction, TransactionKind, TransactionStatus,
    Transfer, TransferId, TransferStatus, User,
};
use crate::registry::{KeyValueStore, SharedRegistry};
use crate::util::normalize_text_option;

/// An entity paired with its distance from the viewer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Nearby<T> {
    pub entity: T,
    pub distance_m: f64,
}

impl<T> Nearby<T> {
    pub fn band(&self, radius_m: f64) -> ProximityBand {
        ProximityBand::classify(self.distance_m, radius_m)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Nearby<U> {
        Nearby {
            entity: f(self.entity),
            distance_m: self.distance_m,
        }
    }
}

/// A member of either catalogue
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Neighbour {
    Synthetic(User),
    External(ExternalUser),
}

impl Neighbour {
    pub const fn user(&self) -> &User {
        match self {
            Self::Synthetic(user) => user,
            Self::External(external) => &external.user,
        }
    }

    pub fn username(&self) -> &str {
        &self.user().username
    }

    pub const fn device_type(&self) -> Option<DeviceType> {
        match self {
            Self::Synthetic(_) => None,
            Self::External(external) => Some(external.device_type),
        }
    }
}

impl Located for Neighbour {
    fn location(&self) -> GeoPoint {
        self.user().location
    }

    fn owner(&self) -> &str {
        self.username()
    }
}

/// The simulated population around the viewer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Population {
    pub users: Vec<User>,
    pub external_users: Vec<ExternalUser>,
}

impl Population {
    pub fn from_fixtures(fixtures: &Fixtures) -> Self {
        Self {
            users: fixtures.users.clone(),
            external_users: fixtures.external_users.clone(),
        }
    }

    /// Synthetic users first, then external users, each in catalogue order
    pub fn neighbours(&self) -> impl Iterator<Item = Neighbour> + '_ {
        self.users
            .iter()
            .cloned()
            .map(Neighbour::Synthetic)
            .chain(self.external_users.iter().cloned().map(Neighbour::External))
    }

    pub fn find(&self, username: &str) -> Option<Neighbour> {
        self.neighbours()
            .find(|neighbour| neighbour.username() == username)
    }
}

/// Filter `items` to those within `radius_m` of `origin`, excluding entities
/// owned by `exclude`, sorted by ascending distance.
pub fn within_radius<T: Located>(
    origin: GeoPoint,
    items: impl IntoIterator<Item = T>,
    exclude: Option<&str>,
    radius_m: f64,
) -> Vec<Nearby<T>> {
    let mut nearby: Vec<Nearby<T>> = items
        .into_iter()
        .filter(|item| exclude.is_none_or(|name| item.owner() != name))
        .map(|item| {
            let distance_m = origin.distance_to(&item.location());
            Nearby {
                entity: item,
                distance_m,
            }
        })
        .filter(|nearby| nearby.distance_m <= radius_m)
        .collect();
    nearby.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
    nearby
}

/// What the sender fills in before confirming a transfer
#[derive(Debug, Clone, PartialEq)]
pub struct TransferDraft {
    pub recipient: String,
    pub amount: f64,
    pub reason: Option<String>,
    pub description: Option<String>,
}

pub struct ProximityEngine {
    radius_m: f64,
}

impl ProximityEngine {
    pub const fn new(radius_m: f64) -> Self {
        Self { radius_m }
    }

    pub const fn radius_m(&self) -> f64 {
        self.radius_m
    }

    /// Users from both catalogues within range, nearest first
    pub fn nearby_users(
        &self,
        origin: GeoPoint,
        population: &Population,
        exclude_username: &str,
    ) -> Vec<Nearby<Neighbour>> {
        within_radius(
            origin,
            population.neighbours(),
            Some(exclude_username),
            self.radius_m,
        )
    }

    /// In-range requests not authored by `exclude_username`, nearest first
    pub fn nearby_requests(
        &self,
        origin: GeoPoint,
        requests: &[Request],
        exclude_username: &str,
    ) -> Vec<Nearby<Request>> {
        within_radius(
            origin,
            requests.iter().cloned(),
            Some(exclude_username),
            self.radius_m,
        )
    }

    /// Rank outstanding requests: in-range first, then the rest, each group by
    /// ascending distance. Without a location the input order is kept and no
    /// distance is reported.
    pub fn rank_requests(
        &self,
        origin: Option<GeoPoint>,
        requests: Vec<Request>,
    ) -> Vec<(Request, Option<f64>)> {
        let Some(origin) = origin else {
            return requests.into_iter().map(|request| (request, None)).collect();
        };

        let mut ranked: Vec<(Request, f64)> = requests
            .into_iter()
            .map(|request| {
                let distance = origin.distance_to(&request.location);
                (request, distance)
            })
            .collect();
        ranked.sort_by(|(_, a), (_, b)| {
            let a_near = *a <= self.radius_m;
            let b_near = *b <= self.radius_m;
            match (a_near, b_near) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => a.total_cmp(b),
            }
        });
        ranked
            .into_iter()
            .map(|(request, distance)| (request, Some(distance)))
            .collect()
    }

    /// Every spot with its distance, nearest first (no radius cut-off)
    pub fn safe_meetup_spots(&self, origin: GeoPoint, spots: &[SafeSpot]) -> Vec<Nearby<SafeSpot>> {
        within_radius(origin, spots.iter().cloned(), None, f64::INFINITY)
    }

    /// Check a draft against the population as it is now.
    ///
    /// Returns the recipient with its current distance.
    pub fn validate_transfer(
        &self,
        sender: &str,
        origin: GeoPoint,
        population: &Population,
        draft: &TransferDraft,
    ) -> std::result::Result<Nearby<Neighbour>, Rejection> {
        let recipient = draft.recipient.trim();
        if recipient.is_empty() {
            return Err(Rejection::MissingField("recipient"));
        }
        if !(draft.amount.is_finite() && draft.amount > 0.0) {
            return Err(Rejection::InvalidAmount(draft.amount));
        }
        if recipient == sender {
            return Err(Rejection::SelfTransfer);
        }

        let neighbour = population
            .find(recipient)
            .ok_or_else(|| Rejection::UnknownUser(recipient.to_string()))?;
        let distance_m = origin.distance_to(&neighbour.location());
        if !distance_m.is_finite() {
            return Err(Rejection::RecipientNotNearby {
                recipient: recipient.to_string(),
            });
        }
        if distance_m > self.radius_m {
            return Err(Rejection::RecipientOutOfRange {
                recipient: recipient.to_string(),
                distance_m,
            });
        }
        Ok(Nearby {
            entity: neighbour,
            distance_m,
        })
    }

    /// Re-validate and record a transfer plus its history entry.
    pub fn submit_transfer<S: KeyValueStore>(
        &self,
        registry: &mut SharedRegistry<S>,
        sender: &str,
        origin: GeoPoint,
        population: &Population,
        draft: TransferDraft,
        now_ms: i64,
    ) -> Result<(Transfer, Transaction)> {
        let recipient = self.validate_transfer(sender, origin, population, &draft)?;

        let transfer = Transfer {
            id: TransferId::new(),
            amount: draft.amount,
            sender: sender.to_string(),
            recipient: recipient.entity.username().to_string(),
            reason: normalize_text_option(draft.reason),
            description: normalize_text_option(draft.description),
            created_at: now_ms,
            sender_location: origin,
            recipient_location: recipient.entity.location(),
            distance_m: recipient.distance_m,
            status: TransferStatus::Completed,
        };
        registry.add_proximity_transfer(transfer.clone())?;

        let transaction = registry.append_transaction(Transaction {
            id: Transaction::id_for(now_ms),
            amount: transfer.amount,
            kind: TransactionKind::ProximityTransfer,
            requester: transfer.recipient.clone(),
            responder: transfer.sender.clone(),
            status: TransactionStatus::Completed,
            timestamp: now_ms,
            rating: None,
        })?;

        tracing::info!(
            "Transferred ${} to {} ({:.0}m away)",
            transfer.amount,
            transfer.recipient,
            transfer.distance_m
        );
        Ok((transfer, transaction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::DEMO_LOCATION;
    use crate::geo::haversine_distance_m;
    use crate::registry::MemoryStore;
    use pretty_assertions::assert_eq;

    const NOW: i64 = 1_700_000_000_000;

    fn engine() -> ProximityEngine {
        ProximityEngine::new(700.0)
    }

    fn population() -> Population {
        Population::from_fixtures(&Fixtures::demo(NOW))
    }

    /// Latitude offset (degrees) that puts a point `meters` north of `origin`
    fn north_of(origin: GeoPoint, meters: f64) -> GeoPoint {
        let degrees = (meters / crate::geo::EARTH_RADIUS_M).to_degrees();
        origin.offset(degrees, 0.0)
    }

    fn draft(recipient: &str, amount: f64) -> TransferDraft {
        TransferDraft {
            recipient: recipient.to_string(),
            amount,
            reason: Some("  lunch ".to_string()),
            description: None,
        }
    }

    #[test]
    fn user_at_identical_coordinates_is_included() {
        let nearby = engine().nearby_users(DEMO_LOCATION, &population(), "demo");
        let john = nearby
            .iter()
            .find(|nearby| nearby.entity.username() == "John Doe")
            .unwrap();
        assert!(john.distance_m.abs() < f64::EPSILON);
        assert_eq!(nearby.len(), 9);
    }

    #[test]
    fn excluded_user_never_appears() {
        let nearby = engine().nearby_users(DEMO_LOCATION, &population(), "Jane Smith");
        assert!(nearby
            .iter()
            .all(|nearby| nearby.entity.username() != "Jane Smith"));
        assert_eq!(nearby.len(), 8);
    }

    #[test]
    fn radius_is_a_closed_interval() {
        let origin = GeoPoint::new(0.0, 0.0);
        let mut population = population();
        population.external_users.clear();
        population.users.truncate(2);
        population.users[0].location = north_of(origin, 699.999);
        population.users[1].location = north_of(origin, 700.1);

        let nearby = ProximityEngine::new(700.0).nearby_users(origin, &population, "demo");
        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].entity.username(), "John Doe");
        assert!(nearby[0].distance_m <= 700.0);

        population.users[0].location = north_of(origin, 700.0);
        // radius set to the exact computed distance of the edge point
        let edge = haversine_distance_m(origin, population.users[0].location);
        assert!((edge - 700.0).abs() < 1e-6, "edge point computed at {edge}");

        let nearby = ProximityEngine::new(edge).nearby_users(origin, &population, "demo");
        let names: Vec<&str> = nearby.iter().map(|n| n.entity.username()).collect();
        assert_eq!(names, vec!["John Doe"]);
    }

    #[test]
    fn results_are_sorted_with_stable_ties() {
        let origin = DEMO_LOCATION;
        let mut population = population();
        population.users[0].location = north_of(origin, 300.0);
        population.users[1].location = north_of(origin, 100.0);

        let nearby = engine().nearby_users(origin, &population, "demo");
        for pair in nearby.windows(2) {
            assert!(pair[0].distance_m <= pair[1].distance_m);
        }
        // the zero-distance users keep catalogue order
        let zero: Vec<&str> = nearby
            .iter()
            .filter(|n| n.distance_m < 1.0)
            .map(|n| n.entity.username())
            .collect();
        assert_eq!(
            zero,
            vec![
                "Mike Johnson",
                "Sarah Wilson",
                "Alex Chen",
                "Maria Garcia",
                "ExternalUser1",
                "ExternalUser2",
                "ExternalUser3"
            ]
        );
        assert_eq!(nearby.last().map(|n| n.entity.username()), Some("John Doe"));
    }

    #[test]
    fn nearby_requests_exclude_own_requests() {
        let fixtures = Fixtures::demo(NOW);
        let nearby = engine().nearby_requests(DEMO_LOCATION, &fixtures.sample_requests, "John Doe");
        assert_eq!(nearby.len(), 5);
        assert!(nearby.iter().all(|n| n.entity.requester != "John Doe"));
    }

    #[test]
    fn ranking_hoists_in_range_requests() {
        let fixtures = Fixtures::demo(NOW);
        let origin = DEMO_LOCATION;
        let mut far = fixtures.sample_requests[0].clone();
        far.location = north_of(origin, 5_000.0);
        let mut mid = fixtures.sample_requests[1].clone();
        mid.location = north_of(origin, 400.0);
        let mut near = fixtures.sample_requests[2].clone();
        near.location = north_of(origin, 50.0);

        let ranked = engine().rank_requests(Some(origin), vec![far.clone(), mid.clone(), near.clone()]);
        let ids: Vec<_> = ranked.iter().map(|(request, _)| request.id).collect();
        assert_eq!(ids, vec![near.id, mid.id, far.id]);

        let unranked = engine().rank_requests(None, vec![far.clone(), near.clone()]);
        assert_eq!(unranked, vec![(far, None), (near, None)]);
    }

    #[test]
    fn meetup_spots_include_every_spot() {
        let fixtures = Fixtures::demo(NOW);
        let spots = engine().safe_meetup_spots(north_of(DEMO_LOCATION, 2_000.0), &fixtures.safe_spots);
        assert_eq!(spots.len(), 4);
        assert_eq!(spots[0].entity.name, "Central Park Bench");
    }

    #[test]
    fn transfer_validation_rejects_bad_input() {
        let population = population();
        let engine = engine();
        let check = |draft: TransferDraft| {
            engine
                .validate_transfer("demo", DEMO_LOCATION, &population, &draft)
                .unwrap_err()
        };

        assert_eq!(check(draft("", 10.0)), Rejection::MissingField("recipient"));
        assert_eq!(check(draft("John Doe", 0.0)), Rejection::InvalidAmount(0.0));
        assert!(matches!(
            check(draft("John Doe", f64::NAN)),
            Rejection::InvalidAmount(_)
        ));
        assert_eq!(check(draft("demo", 10.0)), Rejection::SelfTransfer);
        assert_eq!(
            check(draft("Nobody", 10.0)),
            Rejection::UnknownUser("Nobody".to_string())
        );
    }

    #[test]
    fn submit_records_transfer_and_history() {
        let mut registry = SharedRegistry::new(MemoryStore::new());
        let (transfer, transaction) = engine()
            .submit_transfer(
                &mut registry,
                "demo",
                DEMO_LOCATION,
                &population(),
                draft("Jane Smith", 12.5),
                NOW,
            )
            .unwrap();

        assert_eq!(transfer.recipient, "Jane Smith");
        assert_eq!(transfer.reason.as_deref(), Some("lunch"));
        assert_eq!(transfer.status, TransferStatus::Completed);
        assert_eq!(registry.proximity_transfers(), vec![transfer]);
        assert_eq!(transaction.kind, TransactionKind::ProximityTransfer);
        assert_eq!(registry.transactions(), vec![transaction]);
    }

    #[test]
    fn moving_away_before_confirming_rejects_transfer() {
        let mut registry = SharedRegistry::new(MemoryStore::new());
        let population = population();
        let engine = engine();

        let selected = engine.nearby_users(DEMO_LOCATION, &population, "demo");
        assert!(selected.iter().any(|n| n.entity.username() == "Alex Chen"));

        let moved = north_of(DEMO_LOCATION, 5_000.0);
        let error = engine
            .submit_transfer(
                &mut registry,
                "demo",
                moved,
                &population,
                draft("Alex Chen", 20.0),
                NOW,
            )
            .unwrap_err();

        let rejection = error.rejection().unwrap();
        assert!(rejection.is_proximity());
        assert!(matches!(rejection, Rejection::RecipientOutOfRange { .. }));
        assert!(registry.proximity_transfers().is_empty());
        assert!(registry.transactions().is_empty());
    }
}
