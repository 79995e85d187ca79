//! Fabricated multi-device activity.
//!
//! The driver keeps an agenda of scheduled actions ordered by due time.
//! `tick(now)` fires every due action in order; periodic actions reschedule
//! themselves and one-shot actions (fixture promotion, follow-up requests)
//! fire once. All randomness comes from an [`EventSource`], so tests can
//! script it.

use std::collections::{BTreeMap, VecDeque};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{DelayRange, SimulationConfig};
use crate::error::Result;
use crate::fixtures::{REQUEST_CATEGORIES, REQUEST_DESCRIPTIONS};
use crate::geo::GeoPoint;
use crate::models::{
    ExternalOrigin, Notification, RecentLogin, Request, RequestId, RequestKind, Urgency, User,
};
use crate::proximity::Population;
use crate::registry::{KeyValueStore, SharedRegistry};
use crate::sync::{SyncEngine, Viewer};
use crate::util::round_cents;

const DEVICE_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const DEVICE_ID_LEN: usize = 9;

/// Source of every random decision the driver makes
pub trait EventSource {
    /// Uniform draw in `[0, 1)`
    fn unit(&mut self) -> f64;

    /// Uniform index in `0..len`; `len` must be non-zero
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn index(&mut self, len: usize) -> usize {
        ((self.unit() * len as f64) as usize).min(len.saturating_sub(1))
    }

    fn chance(&mut self, probability: f64) -> bool {
        self.unit() < probability
    }

    /// Delay in `[min, max)` milliseconds
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn delay(&mut self, range: DelayRange) -> u64 {
        let span = range.max_ms.saturating_sub(range.min_ms);
        range.min_ms + (self.unit() * span as f64) as u64
    }

    /// Uniform float in `[min, max)`
    fn between(&mut self, min: f64, max: f64) -> f64 {
        min + self.unit() * (max - min)
    }

    /// Synthetic device identifier such as `device_k3j9x0a1b`
    fn device_id(&mut self) -> String {
        let suffix: String = (0..DEVICE_ID_LEN)
            .map(|_| char::from(DEVICE_ID_ALPHABET[self.index(DEVICE_ID_ALPHABET.len())]))
            .collect();
        format!("device_{suffix}")
    }
}

/// `rand`-backed source used outside tests
pub struct RandomSource {
    rng: StdRng,
}

impl RandomSource {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible source for demos
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl EventSource for RandomSource {
    fn unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len.max(1))
    }
}

/// Replays a fixed list of unit draws, then repeats `fallback`
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    draws: VecDeque<f64>,
    fallback: f64,
}

impl ScriptedSource {
    pub fn new(draws: impl IntoIterator<Item = f64>) -> Self {
        Self {
            draws: draws.into_iter().collect(),
            fallback: 0.0,
        }
    }

    /// Every draw returns `value`
    pub fn constant(value: f64) -> Self {
        Self {
            draws: VecDeque::new(),
            fallback: value,
        }
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: f64) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn remaining(&self) -> usize {
        self.draws.len()
    }
}

impl EventSource for ScriptedSource {
    fn unit(&mut self) -> f64 {
        self.draws
            .pop_front()
            .unwrap_or(self.fallback)
            .clamp(0.0, 1.0 - f64::EPSILON)
    }
}

/// Something the driver will do at a due time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Sync,
    Jitter,
    Drift,
    DetectExternal,
    CheckProximity,
    PromoteFixture(RequestId),
    UserLogin,
    ExternalLogin,
    RequestFromUser(String),
    RequestFromExternal(String),
}

/// Mutable view of the app state an action can touch
pub struct World<'a, S> {
    pub registry: &'a mut SharedRegistry<S>,
    pub population: &'a mut Population,
    pub sync: &'a SyncEngine,
    pub username: &'a str,
    pub location: &'a mut Option<GeoPoint>,
    pub sample_requests: &'a [Request],
}

impl<'a, S> World<'a, S> {
    fn viewer(&self) -> Viewer<'a> {
        Viewer::new(self.username, *self.location)
    }
}

/// What one `tick` did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub fired: Vec<Action>,
    pub notifications: Vec<Notification>,
    pub requests_changed: bool,
    /// Merged updates that changed nothing
    pub skipped_updates: usize,
}

pub struct SimulationDriver {
    config: SimulationConfig,
    source: Box<dyn EventSource + Send>,
    agenda: BTreeMap<(i64, u64), Action>,
    next_seq: u64,
}

impl SimulationDriver {
    pub fn new(config: SimulationConfig, source: Box<dyn EventSource + Send>) -> Self {
        Self {
            config,
            source,
            agenda: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Seed the agenda: periodic cadences, fixture promotion and the first logins.
    pub fn start<S: KeyValueStore>(
        &mut self,
        registry: &SharedRegistry<S>,
        sample_requests: &[Request],
        now_ms: i64,
    ) {
        self.agenda.clear();
        let config = self.config.clone();
        self.schedule_after(now_ms, config.sync_interval_ms, Action::Sync);
        self.schedule_after(now_ms, config.jitter_interval_ms, Action::Jitter);
        self.schedule_after(now_ms, config.drift_interval_ms, Action::Drift);
        self.schedule_after(
            now_ms,
            config.external_detection_interval_ms,
            Action::DetectExternal,
        );
        self.schedule_after(
            now_ms,
            config.proximity_check_interval_ms,
            Action::CheckProximity,
        );

        let existing = registry.all_requests();
        for request in sample_requests {
            if existing.iter().any(|stored| stored.id == request.id) {
                continue;
            }
            let delay = self.source.delay(config.promote_delay);
            self.schedule_after(now_ms, delay, Action::PromoteFixture(request.id));
        }

        let delay = self.source.delay(config.first_login_delay);
        self.schedule_after(now_ms, delay, Action::UserLogin);
        let delay = self.source.delay(config.first_external_login_delay);
        self.schedule_after(now_ms, delay, Action::ExternalLogin);

        tracing::debug!("Simulation started with {} scheduled actions", self.agenda.len());
    }

    /// Drop every scheduled action
    pub fn stop(&mut self) {
        self.agenda.clear();
        tracing::debug!("Simulation stopped");
    }

    pub fn is_running(&self) -> bool {
        !self.agenda.is_empty()
    }

    pub fn next_due(&self) -> Option<i64> {
        self.agenda.keys().next().map(|(due, _)| *due)
    }

    /// Scheduled actions in due order
    pub fn agenda(&self) -> impl Iterator<Item = (i64, &Action)> {
        self.agenda.iter().map(|((due, _), action)| (*due, action))
    }

    pub fn schedule(&mut self, due_ms: i64, action: Action) {
        self.agenda.insert((due_ms, self.next_seq), action);
        self.next_seq += 1;
    }

    fn schedule_after(&mut self, now_ms: i64, delay_ms: u64, action: Action) {
        let delay = i64::try_from(delay_ms).unwrap_or(i64::MAX);
        self.schedule(now_ms.saturating_add(delay), action);
    }

    /// Fire every action due at or before `now_ms`, in due order.
    ///
    /// Actions scheduled by a fired action are picked up in the same tick when
    /// they are already due.
    pub fn tick<S: KeyValueStore>(
        &mut self,
        world: &mut World<'_, S>,
        now_ms: i64,
    ) -> Result<TickReport> {
        let mut report = TickReport::default();
        while let Some(entry) = self.agenda.first_entry() {
            if entry.key().0 > now_ms {
                break;
            }
            let action = entry.remove();
            self.fire(world, &action, now_ms, &mut report)?;
            report.fired.push(action);
        }
        Ok(report)
    }

    fn fire<S: KeyValueStore>(
        &mut self,
        world: &mut World<'_, S>,
        action: &Action,
        now_ms: i64,
        report: &mut TickReport,
    ) -> Result<()> {
        let config = self.config.clone();
        match action {
            Action::Sync => {
                let viewer = world.viewer();
                let outcome = world.sync.sync_with_other_devices(
                    world.registry,
                    viewer,
                    &world.population.external_users,
                    now_ms,
                )?;
                report.requests_changed |= outcome.requests_changed();
                if let Some(merge) = &outcome.merge {
                    report.skipped_updates += merge.skipped;
                }
                let interval = i64::try_from(config.sync_interval_ms).unwrap_or(i64::MAX);
                let mut next_ms = now_ms.saturating_add(interval);
                // Throttled: retry as soon as the threshold has passed
                if !outcome.ran() {
                    if let Some(last) = world.registry.last_sync() {
                        let threshold = world.sync.config().sync_threshold_ms;
                        next_ms = next_ms.min(last.saturating_add(threshold).saturating_add(1));
                    }
                }
                report.notifications.extend(outcome.notifications);
                self.schedule(next_ms, Action::Sync);
            }
            Action::Jitter => {
                self.jitter_population(world, now_ms);
                self.schedule_after(now_ms, config.jitter_interval_ms, Action::Jitter);
            }
            Action::Drift => {
                if let Some(location) = world.location.as_mut() {
                    *location = self.jittered(*location);
                    tracing::trace!(lat = location.lat, lng = location.lng, "Location drifted");
                }
                self.schedule_after(now_ms, config.drift_interval_ms, Action::Drift);
            }
            Action::DetectExternal => {
                let viewer = world.viewer();
                let detected = world.sync.detect_external_users(
                    world.registry,
                    viewer,
                    &world.population.external_users,
                    now_ms,
                )?;
                report.notifications.extend(detected);
                self.schedule_after(
                    now_ms,
                    config.external_detection_interval_ms,
                    Action::DetectExternal,
                );
            }
            Action::CheckProximity => {
                if let Some(reminder) = world
                    .sync
                    .check_proximity_requests(world.registry, world.viewer())
                {
                    report.notifications.push(reminder);
                }
                self.schedule_after(
                    now_ms,
                    config.proximity_check_interval_ms,
                    Action::CheckProximity,
                );
            }
            Action::PromoteFixture(id) => {
                let fixture = world
                    .sample_requests
                    .iter()
                    .find(|request| request.id == *id)
                    .cloned();
                match fixture {
                    Some(request) if world.registry.request(*id).is_none() => {
                        world.registry.add_global_request(request, now_ms)?;
                        tracing::debug!("Promoted fixture request {id}");
                    }
                    _ => tracing::debug!("Fixture request {id} already present"),
                }
            }
            Action::UserLogin => {
                self.simulate_user_login(world, now_ms, report)?;
                let delay = self.source.delay(config.login_interval);
                self.schedule_after(now_ms, delay, Action::UserLogin);
            }
            Action::ExternalLogin => {
                self.simulate_external_login(world, now_ms, report)?;
                let delay = self.source.delay(config.external_login_interval);
                self.schedule_after(now_ms, delay, Action::ExternalLogin);
            }
            Action::RequestFromUser(username) => {
                if let Some(user) = world
                    .population
                    .users
                    .iter()
                    .find(|user| &user.username == username)
                    .cloned()
                {
                    let request = self.manufacture_request(world.registry, &user, None, now_ms);
                    world.registry.add_global_request(request, now_ms)?;
                }
            }
            Action::RequestFromExternal(username) => {
                if let Some(external) = world
                    .population
                    .external_users
                    .iter()
                    .find(|external| external.username() == username)
                    .cloned()
                {
                    let origin = ExternalOrigin {
                        device_type: external.device_type,
                        login_source: external.login_source,
                    };
                    let request =
                        self.manufacture_request(world.registry, &external.user, Some(origin), now_ms);
                    world.registry.add_global_request(request, now_ms)?;
                }
            }
        }
        Ok(())
    }

    fn simulate_user_login<S: KeyValueStore>(
        &mut self,
        world: &mut World<'_, S>,
        now_ms: i64,
        report: &mut TickReport,
    ) -> Result<()> {
        if world.location.is_none() {
            return Ok(());
        }
        let candidates: Vec<&User> = world
            .population
            .users
            .iter()
            .filter(|user| user.username != world.username)
            .collect();
        if candidates.is_empty() {
            return Ok(());
        }
        let user = candidates[self.source.index(candidates.len())].clone();

        let login = RecentLogin {
            username: user.username.clone(),
            location: user.location,
            timestamp: now_ms,
            device_id: self.source.device_id(),
        };
        tracing::debug!("{} logged in from {}", login.username, login.device_id);
        world.registry.record_login(login)?;
        let viewer = world.viewer();
        report
            .notifications
            .extend(world.sync.check_new_logins(world.registry, viewer, now_ms)?);

        if self.source.chance(self.config.login_request_chance) {
            let delay = self.source.delay(self.config.login_request_delay);
            self.schedule_after(now_ms, delay, Action::RequestFromUser(user.username));
        }
        Ok(())
    }

    fn simulate_external_login<S: KeyValueStore>(
        &mut self,
        world: &mut World<'_, S>,
        now_ms: i64,
        report: &mut TickReport,
    ) -> Result<()> {
        if world.location.is_none() || world.population.external_users.is_empty() {
            return Ok(());
        }
        let index = self.source.index(world.population.external_users.len());
        let external = world.population.external_users[index].clone();

        let range = self.config.external_login_distance;
        let distance = self.source.between(range.min_m, range.max_m);
        if let Some(notification) =
            world
                .sync
                .announce_external_login(world.registry, &external, distance, now_ms)?
        {
            report.notifications.push(notification);
        }

        if self.source.chance(self.config.external_request_chance) {
            let delay = self.source.delay(self.config.external_request_delay);
            self.schedule_after(
                now_ms,
                delay,
                Action::RequestFromExternal(external.username().to_string()),
            );
        }
        Ok(())
    }

    fn manufacture_request<S: KeyValueStore>(
        &mut self,
        registry: &SharedRegistry<S>,
        user: &User,
        external: Option<ExternalOrigin>,
        now_ms: i64,
    ) -> Request {
        let kind = RequestKind::ALL[self.source.index(RequestKind::ALL.len())];
        let urgency = Urgency::ALL[self.source.index(Urgency::ALL.len())];
        let category = REQUEST_CATEGORIES[self.source.index(REQUEST_CATEGORIES.len())];
        let blurb = REQUEST_DESCRIPTIONS[self.source.index(REQUEST_DESCRIPTIONS.len())];
        let amount = round_cents(self.source.between(5.0, 55.0));
        let prefix = if external.is_some() {
            "External request from"
        } else {
            "Request from"
        };

        Request {
            id: registry.next_request_id(now_ms),
            amount,
            kind,
            description: format!("{prefix} {} - {blurb}", user.username),
            requester: user.username.clone(),
            created_at: now_ms,
            location: user.location,
            urgency,
            category: category.to_string(),
            external,
            requester_rating: Some(user.rating),
        }
    }

    fn jitter_population<S>(&mut self, world: &mut World<'_, S>, now_ms: i64) {
        for user in &mut world.population.users {
            if user.username == world.username {
                continue;
            }
            user.location = self.jittered(user.location);
            user.last_seen = now_ms;
        }
    }

    fn jittered(&mut self, point: GeoPoint) -> GeoPoint {
        let magnitude = self.config.jitter_degrees;
        let d_lat = (self.source.unit() - 0.5) * magnitude;
        let d_lng = (self.source.unit() - 0.5) * magnitude;
        point.offset(d_lat, d_lng)
    }
}
