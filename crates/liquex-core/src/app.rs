//! Application context.
//!
//! `Liquex` owns the shared registry, the simulated population and the
//! engines, and tracks the logged-in session. Presentation layers hold a
//! `Liquex` and call into it; nothing reaches the store directly.

use crate::analytics::RequestAnalytics;
use crate::config::LiquexConfig;
use crate::error::{Error, Rejection, Result};
use crate::fixtures::Fixtures;
use crate::geo::{GeoPoint, ProximityBand};
use crate::models::{
    Notification, RecentLogin, Request, RequestId, RequestKind, SafeSpot, Transaction,
    TransactionStatus, Transfer, Urgency, UserRating,
};
use crate::proximity::{Nearby, Neighbour, Population, ProximityEngine, TransferDraft};
use crate::registry::{KeyValueStore, SharedRegistry};
use crate::simulation::{EventSource, SimulationDriver, TickReport, World};
use crate::sync::{SyncEngine, SyncOutcome, Viewer};
use crate::util::normalize_text_option;

const DEMO_RATING: f64 = 5.0;

/// Result of asking the platform for a position
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationFix {
    Granted(GeoPoint),
    Denied,
    Unavailable,
    TimedOut,
    Unsupported,
}

/// The logged-in persona
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub username: String,
    pub rating: f64,
    pub completed_transactions: u32,
    pub logged_in_at: i64,
}

/// Form input for a new request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestDraft {
    pub amount: f64,
    pub kind: Option<RequestKind>,
    pub urgency: Option<Urgency>,
    pub category: Option<String>,
    pub description: Option<String>,
}

/// An outstanding request as the notification list shows it
#[derive(Debug, Clone, PartialEq)]
pub struct RequestView {
    pub request: Request,
    pub distance_m: Option<f64>,
    pub band: Option<ProximityBand>,
    pub is_recent: bool,
    pub from_new_user: bool,
}

pub struct Liquex<S> {
    config: LiquexConfig,
    registry: SharedRegistry<S>,
    fixtures: Fixtures,
    population: Population,
    sync: SyncEngine,
    proximity: ProximityEngine,
    session: Option<Session>,
    location: Option<GeoPoint>,
    driver: Option<SimulationDriver>,
}

impl<S: KeyValueStore> Liquex<S> {
    pub fn new(store: S, config: LiquexConfig, now_ms: i64) -> Self {
        let fixtures = Fixtures::demo(now_ms);
        let registry = SharedRegistry::with_capacities(
            store,
            config.proximity.recent_login_capacity,
            config.proximity.external_login_capacity,
        );
        Self {
            population: Population::from_fixtures(&fixtures),
            sync: SyncEngine::new(config.proximity.clone()),
            proximity: ProximityEngine::new(config.proximity.radius_m),
            registry,
            fixtures,
            config,
            session: None,
            location: None,
            driver: None,
        }
    }

    pub const fn config(&self) -> &LiquexConfig {
        &self.config
    }

    pub const fn registry(&self) -> &SharedRegistry<S> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SharedRegistry<S> {
        &mut self.registry
    }

    pub const fn fixtures(&self) -> &Fixtures {
        &self.fixtures
    }

    pub const fn population(&self) -> &Population {
        &self.population
    }

    pub fn population_mut(&mut self) -> &mut Population {
        &mut self.population
    }

    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub const fn location(&self) -> Option<GeoPoint> {
        self.location
    }

    pub const fn proximity(&self) -> &ProximityEngine {
        &self.proximity
    }

    pub const fn sync_engine(&self) -> &SyncEngine {
        &self.sync
    }

    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------

    /// Log in as `username`, resolve the location and announce the login.
    ///
    /// Catalogue users keep their rating; anyone else, the `demo` persona
    /// included, starts at 5.0. Returns notifications from the login check.
    pub fn login(
        &mut self,
        username: &str,
        fix: LocationFix,
        now_ms: i64,
    ) -> Result<Vec<Notification>> {
        let username = username.trim();
        if username.is_empty() {
            return Err(Rejection::MissingField("username").into());
        }
        if self.session.is_some() {
            self.logout();
        }

        let (rating, completed_transactions) = self
            .fixtures
            .user(username)
            .map_or((DEMO_RATING, 0), |user| {
                (user.rating, user.completed_transactions)
            });
        self.session = Some(Session {
            username: username.to_string(),
            rating,
            completed_transactions,
            logged_in_at: now_ms,
        });
        let location = self.resolve_location(fix);

        self.registry.record_login(RecentLogin {
            username: username.to_string(),
            location,
            timestamp: now_ms,
            device_id: format!("device_{now_ms:x}"),
        })?;
        tracing::info!("Logged in as {username}");

        self.sync
            .check_new_logins(&mut self.registry, Viewer::new(username, Some(location)), now_ms)
    }

    /// Stop the simulation and forget the session
    pub fn logout(&mut self) {
        if let Some(mut driver) = self.driver.take() {
            driver.stop();
        }
        if let Some(session) = self.session.take() {
            tracing::info!("Logged out {}", session.username);
        }
        self.location = None;
        self.population = Population::from_fixtures(&self.fixtures);
    }

    fn current_username(&self) -> Result<String> {
        self.session
            .as_ref()
            .map(|session| session.username.clone())
            .ok_or_else(|| Rejection::NotLoggedIn.into())
    }

    fn viewer(&self) -> Viewer<'_> {
        Viewer::new(
            self.session
                .as_ref()
                .map_or("", |session| session.username.as_str()),
            self.location,
        )
    }

    // -----------------------------------------------------------------------
    // Location
    // -----------------------------------------------------------------------

    /// Use a granted fix as-is; anything else falls back to the configured point
    pub fn resolve_location(&mut self, fix: LocationFix) -> GeoPoint {
        let location = match fix {
            LocationFix::Granted(point) => point,
            other => {
                let fallback = self.config.proximity.fallback_location;
                tracing::warn!(
                    "Location {:?}, using fallback {}, {}",
                    other,
                    fallback.lat,
                    fallback.lng
                );
                fallback
            }
        };
        self.location = Some(location);
        location
    }

    pub fn set_location(&mut self, location: GeoPoint) {
        self.location = Some(location);
    }

    // -----------------------------------------------------------------------
    // Sync and simulation
    // -----------------------------------------------------------------------

    pub fn sync(&mut self, now_ms: i64) -> Result<SyncOutcome> {
        let username = self.current_username()?;
        self.sync.sync_with_other_devices(
            &mut self.registry,
            Viewer::new(&username, self.location),
            &self.population.external_users,
            now_ms,
        )
    }

    /// Merge immediately, ignoring the sync threshold
    pub fn force_sync(&mut self, now_ms: i64) -> Result<SyncOutcome> {
        self.registry.clear_last_sync()?;
        self.sync(now_ms)
    }

    pub fn start_simulation(
        &mut self,
        source: Box<dyn EventSource + Send>,
        now_ms: i64,
    ) -> Result<()> {
        self.current_username()?;
        let mut driver = SimulationDriver::new(self.config.simulation.clone(), source);
        driver.start(&self.registry, &self.fixtures.sample_requests, now_ms);
        self.driver = Some(driver);
        Ok(())
    }

    pub fn is_simulating(&self) -> bool {
        self.driver
            .as_ref()
            .is_some_and(SimulationDriver::is_running)
    }

    /// Advance the simulation; a no-op when it is not running
    pub fn tick(&mut self, now_ms: i64) -> Result<TickReport> {
        let Some(driver) = self.driver.as_mut() else {
            return Ok(TickReport::default());
        };
        let username = self
            .session
            .as_ref()
            .map_or("", |session| session.username.as_str());
        let mut world = World {
            registry: &mut self.registry,
            population: &mut self.population,
            sync: &self.sync,
            username,
            location: &mut self.location,
            sample_requests: &self.fixtures.sample_requests,
        };
        driver.tick(&mut world, now_ms)
    }

    // -----------------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------------

    pub fn raise_request(&mut self, draft: RequestDraft, now_ms: i64) -> Result<Request> {
        let session = self.session.clone().ok_or(Rejection::NotLoggedIn)?;
        if !(draft.amount.is_finite() && draft.amount > 0.0) {
            return Err(Rejection::InvalidAmount(draft.amount).into());
        }
        let kind = draft.kind.ok_or(Rejection::MissingField("kind"))?;
        let urgency = draft.urgency.ok_or(Rejection::MissingField("urgency"))?;
        let category =
            normalize_text_option(draft.category).ok_or(Rejection::MissingField("category"))?;
        let location = self.location.ok_or(Rejection::LocationRequired)?;

        let request = Request {
            id: self.registry.next_request_id(now_ms),
            amount: draft.amount,
            kind,
            description: normalize_text_option(draft.description).unwrap_or_default(),
            requester: session.username,
            created_at: now_ms,
            location,
            urgency,
            category,
            external: None,
            requester_rating: Some(session.rating),
        };
        self.registry.add_global_request(request.clone(), now_ms)?;
        tracing::info!("Raised request {} for ${}", request.id, request.amount);
        Ok(request)
    }

    /// Withdraw one of the logged-in user's own requests
    pub fn remove_request(&mut self, id: RequestId, now_ms: i64) -> Result<()> {
        let username = self.current_username()?;
        let request = self
            .registry
            .request(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        if request.requester != username {
            return Err(Rejection::NotRequester(id.0).into());
        }
        self.registry.remove_global_request(id, now_ms)?;
        Ok(())
    }

    /// Other users' requests, in-range first, then by distance
    pub fn outstanding_requests(&self, now_ms: i64) -> Vec<RequestView> {
        let viewer = self.viewer();
        let others: Vec<Request> = self
            .registry
            .all_requests()
            .into_iter()
            .filter(|request| request.requester != viewer.username)
            .collect();
        let radius = self.proximity.radius_m();
        self.proximity
            .rank_requests(viewer.location, others)
            .into_iter()
            .map(|(request, distance_m)| RequestView {
                band: distance_m.map(|distance| ProximityBand::classify(distance, radius)),
                is_recent: self.sync.is_recent_request(&request, now_ms),
                from_new_user: self.sync.is_from_new_user(&self.registry, &request, now_ms),
                distance_m,
                request,
            })
            .collect()
    }

    /// Number of requests raised by anyone but the current user
    pub fn badge_count(&self) -> usize {
        let viewer = self.viewer();
        self.registry
            .all_requests()
            .iter()
            .filter(|request| request.requester != viewer.username)
            .count()
    }

    /// Complete someone else's request with the current user as responder
    pub fn accept_request(&mut self, id: RequestId, now_ms: i64) -> Result<Transaction> {
        let username = self.current_username()?;
        let request = self
            .registry
            .request(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        if request.requester == username {
            return Err(Rejection::SelfTransfer.into());
        }

        let transaction = self.registry.append_transaction(Transaction {
            id: Transaction::id_for(now_ms),
            amount: request.amount,
            kind: request.kind.into(),
            requester: request.requester,
            responder: username,
            status: TransactionStatus::Completed,
            timestamp: now_ms,
            rating: None,
        })?;
        tracing::info!("Accepted request {id} as {}", transaction.id);
        Ok(transaction)
    }

    pub fn analytics(&self) -> RequestAnalytics {
        let viewer = self.viewer();
        RequestAnalytics::collect(&self.registry.all_requests(), viewer.username)
    }

    // -----------------------------------------------------------------------
    // Proximity
    // -----------------------------------------------------------------------

    /// Empty without a location
    pub fn nearby_users(&self) -> Vec<Nearby<Neighbour>> {
        let viewer = self.viewer();
        viewer.location.map_or_else(Vec::new, |origin| {
            self.proximity
                .nearby_users(origin, &self.population, viewer.username)
        })
    }

    pub fn nearby_requests(&self) -> Vec<Nearby<Request>> {
        let viewer = self.viewer();
        viewer.location.map_or_else(Vec::new, |origin| {
            self.proximity
                .nearby_requests(origin, &self.registry.all_requests(), viewer.username)
        })
    }

    pub fn safe_meetup_spots(&self) -> Vec<Nearby<SafeSpot>> {
        self.location.map_or_else(Vec::new, |origin| {
            self.proximity
                .safe_meetup_spots(origin, &self.fixtures.safe_spots)
        })
    }

    /// Send money to a nearby user; proximity is checked again at this point.
    pub fn transfer(&mut self, draft: TransferDraft, now_ms: i64) -> Result<(Transfer, Transaction)> {
        let username = self.current_username()?;
        let origin = self.location.ok_or(Rejection::LocationRequired)?;
        self.proximity.submit_transfer(
            &mut self.registry,
            &username,
            origin,
            &self.population,
            draft,
            now_ms,
        )
    }

    // -----------------------------------------------------------------------
    // History and ratings
    // -----------------------------------------------------------------------

    /// Seed history plus recorded transactions, newest first
    pub fn history(&self) -> Vec<Transaction> {
        let mut history = self.fixtures.transaction_history.clone();
        history.extend(self.registry.transactions());
        history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        history
    }

    pub fn rate_user(
        &mut self,
        username: &str,
        rating: u8,
        comment: Option<String>,
        now_ms: i64,
    ) -> Result<()> {
        let rater = self.current_username()?;
        self.registry.rate_user(
            username,
            UserRating {
                rating,
                comment: normalize_text_option(comment).unwrap_or_default(),
                timestamp: now_ms,
                rater,
            },
        )
    }

    pub fn average_rating(&self, username: &str) -> Option<f64> {
        self.registry.average_rating(username)
    }
}
