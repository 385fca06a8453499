//! Per-vehicle routing cache
//!
//! Routing answers are expensive, so the last good answer for each vehicle
//! is kept and reused between refreshes. Entries are created lazily on first
//! sight and never expire: an offline vehicle keeps its cache so tracking
//! resumes seamlessly when fixes return.

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::geo::GeoPoint;
use crate::time;

/// Cached routing state for one vehicle.
#[derive(Debug, Clone, Default)]
pub struct VehicleCacheEntry {
    /// Last ETA the provider returned, seconds
    pub eta_seconds: Option<f64>,
    /// ETA held before the most recent successful refresh
    pub previous_eta_seconds: Option<f64>,
    /// Last route geometry the provider returned
    pub path: Vec<GeoPoint>,
    pub eta_refreshed_at: Option<DateTime<Utc>>,
    pub route_refreshed_at: Option<DateTime<Utc>>,
    /// Vehicle position at the last successful ETA refresh
    pub last_position: Option<GeoPoint>,
}

impl VehicleCacheEntry {
    /// Seconds since the ETA was last refreshed.
    pub fn eta_age_secs(&self, now: DateTime<Utc>) -> Option<f64> {
        self.eta_refreshed_at
            .map(|at| time::seconds_between(at, now))
    }

    /// Seconds since the route was last refreshed.
    pub fn route_age_secs(&self, now: DateTime<Utc>) -> Option<f64> {
        self.route_refreshed_at
            .map(|at| time::seconds_between(at, now))
    }

    /// Stores a fresh ETA, keeping the outgoing value for trend comparison.
    pub fn record_eta(&mut self, eta_seconds: f64, position: GeoPoint, now: DateTime<Utc>) {
        self.previous_eta_seconds = self.eta_seconds;
        self.eta_seconds = Some(eta_seconds);
        self.eta_refreshed_at = Some(now);
        self.last_position = Some(position);
    }

    /// Stores a fresh route geometry.
    pub fn record_route(&mut self, path: Vec<GeoPoint>, now: DateTime<Utc>) {
        self.path = path;
        self.route_refreshed_at = Some(now);
    }

    /// Pins the entry to the arrived state: ETA zero, no remaining route.
    pub fn record_arrival(&mut self, now: DateTime<Utc>) {
        self.previous_eta_seconds = self.eta_seconds;
        self.eta_seconds = Some(0.0);
        self.eta_refreshed_at = Some(now);
        self.path.clear();
    }
}

/// Keyed registry of cache entries, one per vehicle id.
///
/// Callers snapshot an entry, decide, then write back through [`upsert`]:
/// no map guard is ever held across a provider call.
///
/// [`upsert`]: EtaCache::upsert
#[derive(Debug, Default)]
pub struct EtaCache {
    entries: DashMap<String, VehicleCacheEntry>,
}

impl EtaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clones the entry for `vehicle_id`, if one exists.
    pub fn snapshot(&self, vehicle_id: &str) -> Option<VehicleCacheEntry> {
        self.entries.get(vehicle_id).map(|entry| entry.clone())
    }

    /// Applies `apply` to the entry for `vehicle_id`, creating it first if
    /// the vehicle has never been seen.
    pub fn upsert(&self, vehicle_id: &str, apply: impl FnOnce(&mut VehicleCacheEntry)) {
        let mut entry = self.entries.entry(vehicle_id.to_string()).or_default();
        apply(&mut entry);
    }

    /// Number of vehicles with cached state.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
