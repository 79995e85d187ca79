//! Simulated cross-device sync.
//!
//! Other "devices" communicate only through the shared registry: they enqueue
//! pending updates and record logins. A merge cycle drains the queue into the
//! global request list, then looks for synthetic and external users that came
//! online within range. Every notification is gated by the [`NotifyLedger`] so
//! the same sighting is reported at most once per TTL.
//!
//! The engine never re-renders anything itself; callers inspect the returned
//! [`SyncOutcome`] and refresh whatever view is active.

use crate::config::ProximityConfig;
use crate::error::Result;
use crate::geo::GeoPoint;
use crate::models::{
    ExternalLoginRecord, ExternalUser, Notification, PendingUpdate, Request, RequestId, Update,
};
use crate::registry::{KeyValueStore, NotifyLedger, SharedRegistry};

/// Who is looking: the logged-in username and their current fix, if any
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewer<'a> {
    pub username: &'a str,
    pub location: Option<GeoPoint>,
}

impl<'a> Viewer<'a> {
    pub const fn new(username: &'a str, location: Option<GeoPoint>) -> Self {
        Self { username, location }
    }
}

/// What a merge did to the global list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    pub added: Vec<Request>,
    pub removed: Vec<RequestId>,
    /// Updates that changed nothing (duplicate adds, removals of unknown ids)
    pub skipped: usize,
}

impl MergeReport {
    pub fn changed(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

/// Result of one `sync_with_other_devices` call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncOutcome {
    /// `None` when the call was throttled
    pub merge: Option<MergeReport>,
    pub notifications: Vec<Notification>,
}

impl SyncOutcome {
    pub const fn ran(&self) -> bool {
        self.merge.is_some()
    }

    /// Whether the request list changed, i.e. the badge and list need a refresh
    pub fn requests_changed(&self) -> bool {
        self.merge.as_ref().is_some_and(MergeReport::changed)
    }
}

/// Apply updates in order to `requests`.
///
/// Adding an id that already exists and removing an id that does not are both
/// no-ops, so replaying a queue is harmless.
pub fn apply_updates(requests: &mut Vec<Request>, updates: &[PendingUpdate]) -> MergeReport {
    let mut report = MergeReport::default();
    for pending in updates {
        match &pending.update {
            Update::NewRequest(request) => {
                if requests.iter().any(|existing| existing.id == request.id) {
                    report.skipped += 1;
                } else {
                    requests.push(request.clone());
                    report.added.push(request.clone());
                }
            }
            Update::RemovedRequest { id } => {
                if let Some(index) = requests.iter().position(|existing| existing.id == *id) {
                    requests.remove(index);
                    report.removed.push(*id);
                    report.added.retain(|added| added.id != *id);
                } else {
                    report.skipped += 1;
                }
            }
        }
    }
    report
}

pub struct SyncEngine {
    config: ProximityConfig,
}

impl SyncEngine {
    pub const fn new(config: ProximityConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &ProximityConfig {
        &self.config
    }

    /// Run a merge cycle unless the last one was within the sync threshold.
    ///
    /// Order: drain and merge the queue, record the sync time, then check
    /// synthetic and external logins.
    pub fn sync_with_other_devices<S: KeyValueStore>(
        &self,
        registry: &mut SharedRegistry<S>,
        viewer: Viewer<'_>,
        external_users: &[ExternalUser],
        now_ms: i64,
    ) -> Result<SyncOutcome> {
        if let Some(last) = registry.last_sync() {
            if now_ms - last <= self.config.sync_threshold_ms {
                tracing::trace!("Sync throttled ({}ms since last)", now_ms - last);
                return Ok(SyncOutcome::default());
            }
        }

        let merge = self.merge_pending_updates(registry, now_ms)?;
        let mut notifications: Vec<Notification> = merge
            .added
            .iter()
            .filter(|request| request.requester != viewer.username)
            .map(|request| Notification::NewRequest {
                id: request.id,
                amount: request.amount,
                requester: request.requester.clone(),
                distance_m: viewer
                    .location
                    .map(|location| location.distance_to(&request.location)),
            })
            .collect();
        registry.set_last_sync(now_ms)?;

        notifications.extend(self.check_new_logins(registry, viewer, now_ms)?);
        notifications.extend(self.check_external_logins(
            registry,
            viewer,
            external_users,
            now_ms,
        )?);

        for notification in &notifications {
            tracing::debug!("{notification}");
        }

        Ok(SyncOutcome {
            merge: Some(merge),
            notifications,
        })
    }

    /// Drain the queue and fold it into the global list; saves only on change.
    /// The drain and the save happen in one registry unit.
    pub fn merge_pending_updates<S: KeyValueStore>(
        &self,
        registry: &mut SharedRegistry<S>,
        now_ms: i64,
    ) -> Result<MergeReport> {
        registry.fold_pending_updates(now_ms, |requests, updates| {
            let report = apply_updates(requests, updates);
            if !updates.is_empty() {
                tracing::debug!(
                    updates = updates.len(),
                    added = report.added.len(),
                    removed = report.removed.len(),
                    skipped = report.skipped,
                    "Merged pending updates"
                );
            }
            report
        })
    }

    /// Recent logins by other users within range, once per login
    pub fn check_new_logins<S: KeyValueStore>(
        &self,
        registry: &mut SharedRegistry<S>,
        viewer: Viewer<'_>,
        now_ms: i64,
    ) -> Result<Vec<Notification>> {
        let Some(origin) = viewer.location else {
            return Ok(Vec::new());
        };

        let mut ledger = registry.notify_ledger();
        let mut notifications = Vec::new();
        for login in registry.recent_logins(now_ms, self.config.recent_login_window_ms) {
            if login.username == viewer.username {
                continue;
            }
            let distance = origin.distance_to(&login.location);
            if distance > self.config.radius_m {
                continue;
            }
            let key = NotifyLedger::login_key(&login.username, login.timestamp);
            if ledger.is_suppressed(&key, now_ms, self.config.notify_ttl_ms) {
                continue;
            }
            ledger.mark(key, now_ms);
            notifications.push(Notification::NewUserNearby {
                username: login.username,
                distance_m: distance,
            });
        }

        self.store_ledger(registry, &ledger, now_ms)?;
        Ok(notifications)
    }

    /// External users within range; each sighting is logged and counted
    pub fn check_external_logins<S: KeyValueStore>(
        &self,
        registry: &mut SharedRegistry<S>,
        viewer: Viewer<'_>,
        external_users: &[ExternalUser],
        now_ms: i64,
    ) -> Result<Vec<Notification>> {
        let mut notifications = Vec::new();
        for (external, distance) in self.in_range(viewer, external_users) {
            if let Some(notification) =
                self.announce_external_login(registry, external, distance, now_ms)?
            {
                notifications.push(notification);
            }
        }
        Ok(notifications)
    }

    /// Report one external login unless it was reported within the TTL.
    ///
    /// `distance_m` is taken as given, so the simulation can supply a
    /// fabricated one.
    pub fn announce_external_login<S: KeyValueStore>(
        &self,
        registry: &mut SharedRegistry<S>,
        external: &ExternalUser,
        distance_m: f64,
        now_ms: i64,
    ) -> Result<Option<Notification>> {
        let mut ledger = registry.notify_ledger();
        let key = NotifyLedger::external_key(external.username());
        if ledger.is_suppressed(&key, now_ms, self.config.notify_ttl_ms) {
            return Ok(None);
        }
        ledger.mark(key, now_ms);
        self.store_ledger(registry, &ledger, now_ms)?;

        registry.record_external_login(ExternalLoginRecord::sighting(
            external, distance_m, now_ms,
        ))?;
        registry.increment_location_count()?;

        Ok(Some(Notification::ExternalUserNearby {
            username: external.username().to_string(),
            device_type: external.device_type,
            distance_m,
        }))
    }

    /// Separate cadence from logins, with its own suppression keys
    pub fn detect_external_users<S: KeyValueStore>(
        &self,
        registry: &mut SharedRegistry<S>,
        viewer: Viewer<'_>,
        external_users: &[ExternalUser],
        now_ms: i64,
    ) -> Result<Vec<Notification>> {
        let mut ledger = registry.notify_ledger();
        let mut notifications = Vec::new();
        for (external, distance) in self.in_range(viewer, external_users) {
            let key = NotifyLedger::detected_key(external.username());
            if ledger.is_suppressed(&key, now_ms, self.config.notify_ttl_ms) {
                continue;
            }
            ledger.mark(key, now_ms);
            registry.increment_location_count()?;
            notifications.push(Notification::ExternalUserDetected {
                username: external.username().to_string(),
                distance_m: distance,
            });
        }
        self.store_ledger(registry, &ledger, now_ms)?;
        Ok(notifications)
    }

    /// Reminder for the newest in-range request raised by someone else
    pub fn check_proximity_requests<S: KeyValueStore>(
        &self,
        registry: &SharedRegistry<S>,
        viewer: Viewer<'_>,
    ) -> Option<Notification> {
        let origin = viewer.location?;
        registry
            .all_requests()
            .into_iter()
            .filter(|request| request.requester != viewer.username)
            .map(|request| {
                let distance = origin.distance_to(&request.location);
                (request, distance)
            })
            .filter(|(_, distance)| *distance <= self.config.radius_m)
            .max_by_key(|(request, _)| request.created_at)
            .map(|(request, distance)| Notification::RequestNearby {
                id: request.id,
                amount: request.amount,
                requester: request.requester,
                distance_m: distance,
            })
    }

    /// Younger than the recent-request window
    pub const fn is_recent_request(&self, request: &Request, now_ms: i64) -> bool {
        request.is_recent(now_ms, self.config.recent_request_window_ms)
    }

    /// Whether the requester logged in recently and raised this request soon after
    pub fn is_from_new_user<S: KeyValueStore>(
        &self,
        registry: &SharedRegistry<S>,
        request: &Request,
        now_ms: i64,
    ) -> bool {
        registry
            .recent_logins(now_ms, self.config.recent_login_window_ms)
            .iter()
            .any(|login| {
                login.username == request.requester
                    && request.created_at - login.timestamp < self.config.new_user_request_window_ms
            })
    }

    fn in_range<'u>(
        &self,
        viewer: Viewer<'_>,
        external_users: &'u [ExternalUser],
    ) -> Vec<(&'u ExternalUser, f64)> {
        let Some(origin) = viewer.location else {
            return Vec::new();
        };
        external_users
            .iter()
            .filter(|external| external.username() != viewer.username)
            .map(|external| (external, origin.distance_to(&external.user.location)))
            .filter(|(_, distance)| *distance <= self.config.radius_m)
            .collect()
    }

    fn store_ledger<S: KeyValueStore>(
        &self,
        registry: &mut SharedRegistry<S>,
        ledger: &NotifyLedger,
        now_ms: i64,
    ) -> Result<()> {
        let pruned = registry.save_notify_ledger(ledger, now_ms, self.config.notify_ttl_ms)?;
        if pruned > 0 {
            tracing::debug!("Pruned {pruned} expired notification entries");
        }
        Ok(())
    }
}
