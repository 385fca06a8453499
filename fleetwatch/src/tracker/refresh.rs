//! Refresh policy
//!
//! Decides when a vehicle's cached ETA or route is worth re-querying. The
//! policy runs on every fix, so each rule is a cheap comparison against the
//! cache snapshot taken at the start of the cycle.

use std::time::Duration;

/// Default seconds between ETA refreshes for a moving vehicle.
pub const DEFAULT_ETA_REFRESH_SECS: u64 = 45;

/// Default seconds between route geometry refreshes.
pub const DEFAULT_ROUTE_REFRESH_SECS: u64 = 7_200;

/// Metres a vehicle must move to force an early ETA refresh.
pub const DEFAULT_MIN_MOVE_FOR_REFRESH_M: f64 = 100.0;

/// Movement below this many metres counts as staying put.
pub const DEFAULT_STATIONARY_MOVE_M: f64 = 50.0;

/// Speeds below this many km/h count as staying put.
pub const DEFAULT_STATIONARY_SPEED_KMH: f64 = 3.0;

/// Thresholds governing ETA and route refresh cadence.
#[derive(Debug, Clone, Copy)]
pub struct RefreshPolicy {
    pub eta_refresh_interval: Duration,
    pub route_refresh_interval: Duration,
    pub min_move_for_refresh_m: f64,
    pub stationary_move_m: f64,
    pub stationary_speed_kmh: f64,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            eta_refresh_interval: Duration::from_secs(DEFAULT_ETA_REFRESH_SECS),
            route_refresh_interval: Duration::from_secs(DEFAULT_ROUTE_REFRESH_SECS),
            min_move_for_refresh_m: DEFAULT_MIN_MOVE_FOR_REFRESH_M,
            stationary_move_m: DEFAULT_STATIONARY_MOVE_M,
            stationary_speed_kmh: DEFAULT_STATIONARY_SPEED_KMH,
        }
    }
}

impl RefreshPolicy {
    /// Whether the vehicle counts as moving.
    ///
    /// A vehicle is stationary only when both signals agree: reported speed
    /// under the threshold and displacement since the last refresh under the
    /// stationary radius. A missing speed reading counts as zero.
    pub fn is_moving(&self, speed_kmh: Option<f64>, moved_m: f64) -> bool {
        let stationary = speed_kmh.unwrap_or(0.0) < self.stationary_speed_kmh
            && moved_m < self.stationary_move_m;
        !stationary
    }

    /// Whether the cached ETA should be re-queried.
    ///
    /// A vehicle with no cached ETA always refreshes. Stationary vehicles
    /// refresh at half the usual rate since the answer barely changes while
    /// parked. Moving vehicles refresh when the cache ages out or when they
    /// have covered enough ground to invalidate it early.
    pub fn should_refresh_eta(&self, eta_age_secs: Option<f64>, moved_m: f64, moving: bool) -> bool {
        let interval = self.eta_refresh_interval.as_secs_f64();
        let age = match eta_age_secs {
            Some(age) => age,
            None => return true,
        };
        if !moving {
            return age > interval * 2.0;
        }
        age >= interval || moved_m > self.min_move_for_refresh_m
    }

    /// Whether the cached route geometry should be re-queried.
    pub fn should_refresh_route(&self, route_age_secs: Option<f64>, has_path: bool) -> bool {
        if !has_path {
            return true;
        }
        match route_age_secs {
            Some(age) => age >= self.route_refresh_interval.as_secs_f64(),
            None => true,
        }
    }
}

/// Counts a cached ETA down by the time elapsed since it was refreshed.
///
/// Only moving vehicles count down: a parked vehicle's ETA describes the
/// remaining drive, not a deadline, so it holds until the next refresh.
pub fn countdown_eta(cached_eta_seconds: f64, eta_age_secs: f64, moving: bool) -> f64 {
    if moving {
        (cached_eta_seconds - eta_age_secs).max(0.0)
    } else {
        cached_eta_seconds
    }
}
