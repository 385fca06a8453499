//! Runtime configuration
//!
//! [`TrackerConfig`] carries every threshold the pipeline and daemon consult
//! at runtime. [`FleetwatchConfig`] is the on-disk shape: an ini file under
//! `~/.fleetwatch/`, loaded with warn-and-fall-back parsing so one bad value
//! never prevents startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;
use tracing::warn;

use crate::geo::GeoPoint;
use crate::routing::DEFAULT_HTTP_TIMEOUT_SECS;
use crate::tracker::{RefreshPolicy, DEFAULT_ARRIVAL_RADIUS_M, DEFAULT_STALE_AFTER};

/// Default seconds between fleet polling cycles.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Default bound on concurrent provider calls within one cycle.
pub const DEFAULT_MAX_CONCURRENT_REFRESHES: usize = 8;

/// Default tracked destination: Nyabugogo bus terminal, Kigali.
pub const DEFAULT_DESTINATION: GeoPoint = GeoPoint {
    lat: -1.9536,
    lon: 30.0606,
};

/// Default number of simulated vehicles when no endpoint is configured.
pub const DEFAULT_SYNTHETIC_VEHICLES: usize = 5;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),
}

/// Everything the tracking pipeline and cycle daemon need at runtime.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Fixed destination all vehicles are tracked against.
    pub destination: GeoPoint,

    /// Fix age beyond which a vehicle classifies as offline.
    pub stale_after: Duration,

    /// Distance to the destination that counts as arrived, meters.
    pub arrival_radius_m: f64,

    /// ETA/route refresh cadence thresholds.
    pub refresh: RefreshPolicy,

    /// Deadline applied to each routing provider call.
    pub provider_timeout: Duration,

    /// Time between fleet polling cycles.
    pub poll_interval: Duration,

    /// Bound on concurrent per-vehicle processing within one cycle.
    pub max_concurrent_refreshes: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            destination: DEFAULT_DESTINATION,
            stale_after: DEFAULT_STALE_AFTER,
            arrival_radius_m: DEFAULT_ARRIVAL_RADIUS_M,
            refresh: RefreshPolicy::default(),
            provider_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_concurrent_refreshes: DEFAULT_MAX_CONCURRENT_REFRESHES,
        }
    }
}

/// Routing provider settings.
#[derive(Debug, Clone, Default)]
pub struct RoutingConfig {
    /// OSRM host override; None uses the public demo instance.
    pub base_url: Option<String>,
}

/// Fix source settings.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Telemetry endpoint; None runs the synthetic fleet instead.
    pub endpoint: Option<String>,

    /// Fleet size for the synthetic source.
    pub synthetic_vehicles: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            synthetic_vehicles: DEFAULT_SYNTHETIC_VEHICLES,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub dir: String,
    pub file: String,
    /// Mirror log output to stdout.
    pub stdout: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: "logs".to_string(),
            file: "fleetwatch.log".to_string(),
            stdout: true,
        }
    }
}

/// Full on-disk configuration.
#[derive(Debug, Clone, Default)]
pub struct FleetwatchConfig {
    pub tracker: TrackerConfig,
    pub routing: RoutingConfig,
    pub source: SourceConfig,
    pub logging: LoggingConfig,
}

impl FleetwatchConfig {
    /// Loads configuration from the default path (~/.fleetwatch/config.ini).
    ///
    /// A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Loads configuration from a specific path.
    ///
    /// A missing file yields defaults. Unparseable values are logged and
    /// replaced with their defaults rather than failing the load.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        Ok(Self::from_ini(&ini))
    }

    fn from_ini(ini: &Ini) -> Self {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some("tracker")) {
            let defaults = TrackerConfig::default();
            let tracker = &mut config.tracker;

            let lat = parse_f64(section, "tracker", "destination_lat", defaults.destination.lat);
            let lon = parse_f64(section, "tracker", "destination_lon", defaults.destination.lon);
            match GeoPoint::new(lat, lon) {
                Ok(point) => tracker.destination = point,
                Err(e) => warn!(
                    error = %e,
                    "Invalid [tracker] destination, using default"
                ),
            }

            tracker.poll_interval = Duration::from_secs(parse_u64(
                section,
                "tracker",
                "poll_interval_secs",
                defaults.poll_interval.as_secs(),
            ));
            tracker.stale_after = Duration::from_secs(parse_u64(
                section,
                "tracker",
                "stale_after_secs",
                defaults.stale_after.as_secs(),
            ));
            tracker.arrival_radius_m = parse_f64(
                section,
                "tracker",
                "arrival_radius_m",
                defaults.arrival_radius_m,
            );
            tracker.max_concurrent_refreshes = parse_u64(
                section,
                "tracker",
                "max_concurrent_refreshes",
                defaults.max_concurrent_refreshes as u64,
            )
            .max(1) as usize;

            tracker.refresh.eta_refresh_interval = Duration::from_secs(parse_u64(
                section,
                "tracker",
                "eta_refresh_secs",
                defaults.refresh.eta_refresh_interval.as_secs(),
            ));
            tracker.refresh.route_refresh_interval = Duration::from_secs(parse_u64(
                section,
                "tracker",
                "route_refresh_secs",
                defaults.refresh.route_refresh_interval.as_secs(),
            ));
            tracker.refresh.min_move_for_refresh_m = parse_f64(
                section,
                "tracker",
                "min_move_for_refresh_m",
                defaults.refresh.min_move_for_refresh_m,
            );
            tracker.refresh.stationary_move_m = parse_f64(
                section,
                "tracker",
                "stationary_move_m",
                defaults.refresh.stationary_move_m,
            );
            tracker.refresh.stationary_speed_kmh = parse_f64(
                section,
                "tracker",
                "stationary_speed_kmh",
                defaults.refresh.stationary_speed_kmh,
            );
        }

        if let Some(section) = ini.section(Some("routing")) {
            config.routing.base_url = section.get("base_url").map(str::to_string);
            config.tracker.provider_timeout = Duration::from_secs(parse_u64(
                section,
                "routing",
                "timeout_secs",
                config.tracker.provider_timeout.as_secs(),
            ));
        }

        if let Some(section) = ini.section(Some("source")) {
            config.source.endpoint = section.get("endpoint").map(str::to_string);
            config.source.synthetic_vehicles = parse_u64(
                section,
                "source",
                "synthetic_vehicles",
                config.source.synthetic_vehicles as u64,
            )
            .max(1) as usize;
        }

        if let Some(section) = ini.section(Some("logging")) {
            if let Some(dir) = section.get("dir") {
                config.logging.dir = dir.to_string();
            }
            if let Some(file) = section.get("file") {
                config.logging.file = file.to_string();
            }
            config.logging.stdout =
                parse_bool(section, "logging", "stdout", config.logging.stdout);
        }

        config
    }
}

/// Path to the config directory (~/.fleetwatch).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".fleetwatch")
}

/// Path to the config file (~/.fleetwatch/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

fn parse_f64(section: &ini::Properties, section_name: &str, key: &str, default: f64) -> f64 {
    match section.get(key) {
        None => default,
        Some(raw) => match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => value,
            _ => {
                warn!(
                    section = section_name,
                    key = key,
                    value = raw,
                    default = default,
                    "Unparseable config value, using default"
                );
                default
            }
        },
    }
}

fn parse_u64(section: &ini::Properties, section_name: &str, key: &str, default: u64) -> u64 {
    match section.get(key) {
        None => default,
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(value) => value,
            Err(_) => {
                warn!(
                    section = section_name,
                    key = key,
                    value = raw,
                    default = default,
                    "Unparseable config value, using default"
                );
                default
            }
        },
    }
}

fn parse_bool(section: &ini::Properties, section_name: &str, key: &str, default: bool) -> bool {
    match section.get(key) {
        None => default,
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => true,
            "false" | "no" | "0" | "off" => false,
            _ => {
                warn!(
                    section = section_name,
                    key = key,
                    value = raw,
                    default = default,
                    "Unparseable config value, using default"
                );
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FleetwatchConfig::default();

        assert_eq!(config.tracker.destination.lat, DEFAULT_DESTINATION.lat);
        assert_eq!(config.tracker.poll_interval, Duration::from_secs(10));
        assert_eq!(config.tracker.stale_after, Duration::from_secs(600));
        assert_eq!(config.tracker.arrival_radius_m, 50.0);
        assert_eq!(config.tracker.provider_timeout, Duration::from_secs(5));
        assert_eq!(
            config.tracker.refresh.eta_refresh_interval,
            Duration::from_secs(45)
        );
        assert!(config.routing.base_url.is_none());
        assert!(config.source.endpoint.is_none());
        assert_eq!(config.source.synthetic_vehicles, 5);
        assert!(config.logging.stdout);
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("absent.ini");

        let config = FleetwatchConfig::load_from(&path).unwrap();
        assert_eq!(config.tracker.poll_interval, Duration::from_secs(10));
    }

    #[test]
    fn test_load_full_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(
            &path,
            "[tracker]\n\
             destination_lat = -1.9684\n\
             destination_lon = 30.0891\n\
             poll_interval_secs = 5\n\
             stale_after_secs = 300\n\
             arrival_radius_m = 75\n\
             eta_refresh_secs = 30\n\
             route_refresh_secs = 3600\n\
             min_move_for_refresh_m = 150\n\
             stationary_speed_kmh = 2\n\
             max_concurrent_refreshes = 4\n\
             \n\
             [routing]\n\
             base_url = https://osrm.internal\n\
             timeout_secs = 3\n\
             \n\
             [source]\n\
             endpoint = https://fleet.internal/devices\n\
             \n\
             [logging]\n\
             dir = /var/log/fleetwatch\n\
             file = tracker.log\n\
             stdout = no\n",
        )
        .unwrap();

        let config = FleetwatchConfig::load_from(&path).unwrap();

        assert_eq!(config.tracker.destination.lat, -1.9684);
        assert_eq!(config.tracker.poll_interval, Duration::from_secs(5));
        assert_eq!(config.tracker.stale_after, Duration::from_secs(300));
        assert_eq!(config.tracker.arrival_radius_m, 75.0);
        assert_eq!(config.tracker.max_concurrent_refreshes, 4);
        assert_eq!(
            config.tracker.refresh.eta_refresh_interval,
            Duration::from_secs(30)
        );
        assert_eq!(
            config.tracker.refresh.route_refresh_interval,
            Duration::from_secs(3600)
        );
        assert_eq!(config.tracker.refresh.min_move_for_refresh_m, 150.0);
        assert_eq!(config.tracker.refresh.stationary_speed_kmh, 2.0);
        assert_eq!(config.tracker.provider_timeout, Duration::from_secs(3));
        assert_eq!(
            config.routing.base_url.as_deref(),
            Some("https://osrm.internal")
        );
        assert_eq!(
            config.source.endpoint.as_deref(),
            Some("https://fleet.internal/devices")
        );
        assert_eq!(config.logging.dir, "/var/log/fleetwatch");
        assert_eq!(config.logging.file, "tracker.log");
        assert!(!config.logging.stdout);
    }

    #[test]
    fn test_bad_values_fall_back_to_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(
            &path,
            "[tracker]\n\
             destination_lat = ninety\n\
             poll_interval_secs = soon\n\
             arrival_radius_m = NaN\n",
        )
        .unwrap();

        let config = FleetwatchConfig::load_from(&path).unwrap();
        assert_eq!(config.tracker.destination.lat, DEFAULT_DESTINATION.lat);
        assert_eq!(config.tracker.poll_interval, Duration::from_secs(10));
        assert_eq!(config.tracker.arrival_radius_m, 50.0);
    }

    #[test]
    fn test_out_of_range_destination_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(
            &path,
            "[tracker]\ndestination_lat = 120.0\ndestination_lon = 30.0\n",
        )
        .unwrap();

        let config = FleetwatchConfig::load_from(&path).unwrap();
        assert_eq!(config.tracker.destination.lat, DEFAULT_DESTINATION.lat);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[tracker\nnot ini at all").unwrap();

        assert!(FleetwatchConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_config_paths() {
        assert!(config_directory().ends_with(".fleetwatch"));
        assert!(config_file_path().ends_with(".fleetwatch/config.ini"));
    }
}
