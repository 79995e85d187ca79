//! Runtime configuration.
//!
//! `LiquexConfig` is read from a JSON file; every field has a default so a
//! partial (or missing) file is valid. Resolution order: explicit path,
//! `LIQUEX_CONFIG`, `<config_dir>/liquex/config.json`, built-in defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fixtures::DEMO_LOCATION;
use crate::geo::GeoPoint;

const CONFIG_FILE_NAME: &str = "config.json";
const DATABASE_FILE_NAME: &str = "liquex.db";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "LIQUEX_CONFIG";

/// Inclusive millisecond range a randomized delay is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }
}

/// Distance range in meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DistanceRange {
    pub min_m: f64,
    pub max_m: f64,
}

/// Proximity and sync thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProximityConfig {
    /// "Nearby" radius in meters; membership is the closed interval `[0, radius]`
    pub radius_m: f64,
    /// Minimum gap between two merge cycles
    pub sync_threshold_ms: i64,
    /// Logins older than this are no longer considered "recent"
    pub recent_login_window_ms: i64,
    /// Suppression window for repeated "user nearby" notifications
    pub notify_ttl_ms: i64,
    /// A request counts as from a new user when raised this soon after login
    pub new_user_request_window_ms: i64,
    /// Requests younger than this are flagged as just posted
    pub recent_request_window_ms: i64,
    /// Capacity of the recent-login buffer
    pub recent_login_capacity: usize,
    /// Capacity of the external-login log
    pub external_login_capacity: usize,
    /// Substituted when no location fix is available
    pub fallback_location: GeoPoint,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            radius_m: 700.0,
            sync_threshold_ms: 3_000,
            recent_login_window_ms: 300_000,
            notify_ttl_ms: 300_000,
            new_user_request_window_ms: 600_000,
            recent_request_window_ms: 300_000,
            recent_login_capacity: 10,
            external_login_capacity: 20,
            fallback_location: DEMO_LOCATION,
        }
    }
}

/// Cadences of the simulation driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Periodic merge tick
    pub sync_interval_ms: u64,
    /// Population jitter tick
    pub jitter_interval_ms: u64,
    /// Maximum coordinate jitter in degrees (applied as +/- half)
    pub jitter_degrees: f64,
    /// Self-location drift tick
    pub drift_interval_ms: u64,
    pub external_detection_interval_ms: u64,
    pub proximity_check_interval_ms: u64,
    /// Delay before a fixture request is promoted into the registry
    pub promote_delay: DelayRange,
    /// First synthetic login after start
    pub first_login_delay: DelayRange,
    /// Gap between synthetic logins
    pub login_interval: DelayRange,
    /// Probability that a synthetic login is followed by a request
    pub login_request_chance: f64,
    pub login_request_delay: DelayRange,
    pub first_external_login_delay: DelayRange,
    pub external_login_interval: DelayRange,
    pub external_request_chance: f64,
    pub external_request_delay: DelayRange,
    /// Fabricated distance reported for external logins, in meters
    pub external_login_distance: DistanceRange,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            sync_interval_ms: 3_000,
            jitter_interval_ms: 15_000,
            jitter_degrees: 0.0001,
            drift_interval_ms: 30_000,
            external_detection_interval_ms: 10_000,
            proximity_check_interval_ms: 10_000,
            promote_delay: DelayRange::new(5_000, 15_000),
            first_login_delay: DelayRange::new(10_000, 30_000),
            login_interval: DelayRange::new(30_000, 60_000),
            login_request_chance: 0.7,
            login_request_delay: DelayRange::new(5_000, 15_000),
            first_external_login_delay: DelayRange::new(15_000, 45_000),
            external_login_interval: DelayRange::new(45_000, 90_000),
            external_request_chance: 0.8,
            external_request_delay: DelayRange::new(5_000, 20_000),
            external_login_distance: DistanceRange {
                min_m: 100.0,
                max_m: 600.0,
            },
        }
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LiquexConfig {
    pub proximity: ProximityConfig,
    pub simulation: SimulationConfig,
    /// Optional database location; defaults to the platform data dir
    pub database_path: Option<PathBuf>,
}

impl LiquexConfig {
    /// Resolve and load the configuration.
    ///
    /// A missing default file yields defaults; a missing explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_path(path);
        }
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Self::load_from_path(Path::new(path.trim()));
            }
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::load_from_path(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|error| {
            Error::Config(format!(
                "Failed to read config at {}: {}",
                path.display(),
                error
            ))
        })?;
        Self::parse(&raw)
            .map_err(|error| Error::Config(format!("{} ({})", error, path.display())))
    }

    /// Parse and validate a raw JSON payload.
    pub fn parse(raw: &str) -> Result<Self> {
        let config = serde_json::from_str::<Self>(raw)
            .map_err(|error| Error::Config(format!("invalid config JSON: {error}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let proximity = &self.proximity;
        if !(proximity.radius_m.is_finite() && proximity.radius_m > 0.0) {
            return Err(Error::Config(
                "proximity.radius_m must be a positive number".to_string(),
            ));
        }
        for (name, value) in [
            ("proximity.sync_threshold_ms", proximity.sync_threshold_ms),
            ("proximity.recent_login_window_ms", proximity.recent_login_window_ms),
            ("proximity.notify_ttl_ms", proximity.notify_ttl_ms),
            (
                "proximity.new_user_request_window_ms",
                proximity.new_user_request_window_ms,
            ),
            (
                "proximity.recent_request_window_ms",
                proximity.recent_request_window_ms,
            ),
        ] {
            if value < 0 {
                return Err(Error::Config(format!("{name} must not be negative")));
            }
        }
        if proximity.recent_login_capacity == 0 || proximity.external_login_capacity == 0 {
            return Err(Error::Config("log capacities must be at least 1".to_string()));
        }

        let simulation = &self.simulation;
        for (name, value) in [
            ("simulation.sync_interval_ms", simulation.sync_interval_ms),
            ("simulation.jitter_interval_ms", simulation.jitter_interval_ms),
            ("simulation.drift_interval_ms", simulation.drift_interval_ms),
            (
                "simulation.external_detection_interval_ms",
                simulation.external_detection_interval_ms,
            ),
            (
                "simulation.proximity_check_interval_ms",
                simulation.proximity_check_interval_ms,
            ),
        ] {
            if value == 0 {
                return Err(Error::Config(format!("{name} must be greater than zero")));
            }
        }
        for (name, range) in [
            ("simulation.promote_delay", simulation.promote_delay),
            ("simulation.first_login_delay", simulation.first_login_delay),
            ("simulation.login_interval", simulation.login_interval),
            ("simulation.login_request_delay", simulation.login_request_delay),
            (
                "simulation.first_external_login_delay",
                simulation.first_external_login_delay,
            ),
            (
                "simulation.external_login_interval",
                simulation.external_login_interval,
            ),
            (
                "simulation.external_request_delay",
                simulation.external_request_delay,
            ),
        ] {
            if range.min_ms > range.max_ms {
                return Err(Error::Config(format!("{name}: min exceeds max")));
            }
        }
        let distance = simulation.external_login_distance;
        if !(distance.min_m.is_finite()
            && distance.max_m.is_finite()
            && 0.0 <= distance.min_m
            && distance.min_m <= distance.max_m)
        {
            return Err(Error::Config(
                "simulation.external_login_distance must be a non-negative range".to_string(),
            ));
        }
        for (name, chance) in [
            ("simulation.login_request_chance", simulation.login_request_chance),
            (
                "simulation.external_request_chance",
                simulation.external_request_chance,
            ),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(Error::Config(format!("{name} must be within [0, 1]")));
            }
        }
        if !(simulation.jitter_degrees.is_finite() && simulation.jitter_degrees >= 0.0) {
            return Err(Error::Config(
                "simulation.jitter_degrees must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Database path from config, falling back to the platform data dir.
    pub fn resolve_database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(default_database_path)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("liquex").join(CONFIG_FILE_NAME))
}

pub fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("liquex")
        .join(DATABASE_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn empty_object_yields_defaults() {
        let config = LiquexConfig::parse("{}").unwrap();
        assert_eq!(config, LiquexConfig::default());
        assert!((config.proximity.radius_m - 700.0).abs() < f64::EPSILON);
        assert_eq!(config.proximity.recent_login_capacity, 10);
        assert_eq!(config.proximity.external_login_capacity, 20);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config =
            LiquexConfig::parse(r#"{"proximity": {"radius_m": 250.0}}"#).unwrap();
        assert!((config.proximity.radius_m - 250.0).abs() < f64::EPSILON);
        assert_eq!(config.proximity.sync_threshold_ms, 3_000);
        assert_eq!(config.simulation, SimulationConfig::default());
    }

    #[test]
    fn rejects_unknown_fields() {
        let error = LiquexConfig::parse(r#"{"proximity": {"radius": 1.0}}"#).unwrap_err();
        assert!(error.to_string().contains("unknown field"));
    }

    #[test]
    fn rejects_non_positive_radius() {
        let error = LiquexConfig::parse(r#"{"proximity": {"radius_m": 0.0}}"#).unwrap_err();
        assert!(error.to_string().contains("radius_m"));
    }

    #[test]
    fn rejects_inverted_delay_range() {
        let error = LiquexConfig::parse(
            r#"{"simulation": {"login_interval": {"min_ms": 10, "max_ms": 5}}}"#,
        )
        .unwrap_err();
        assert!(error.to_string().contains("login_interval"));
    }

    #[test]
    fn rejects_inverted_distance_range() {
        let error = LiquexConfig::parse(
            r#"{"simulation": {"external_login_distance": {"min_m": 600.0, "max_m": 100.0}}}"#,
        )
        .unwrap_err();
        assert!(error.to_string().contains("external_login_distance"));
    }

    #[test]
    fn rejects_out_of_range_probability() {
        let error =
            LiquexConfig::parse(r#"{"simulation": {"login_request_chance": 1.5}}"#).unwrap_err();
        assert!(error.to_string().contains("login_request_chance"));
    }

    #[test]
    fn load_from_path_reads_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"database_path": "/tmp/liquex-test.db"}"#).unwrap();

        let config = LiquexConfig::load(Some(&path)).unwrap();
        assert_eq!(
            config.resolve_database_path(),
            PathBuf::from("/tmp/liquex-test.db")
        );
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(LiquexConfig::load(Some(&missing)).is_err());
    }
}
