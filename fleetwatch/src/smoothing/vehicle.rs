//! Per-vehicle smoothing state
//!
//! One `VehicleSmoother` lives per tracked vehicle and carries every filter
//! the display signals need: a two-axis position filter, a clamped
//! Kalman+EMA speed chain, a rate-limited Kalman+EMA ETA chain, and a short
//! history ring used for trajectory prediction between fixes.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::geo::{self, GeoPoint};
use crate::smoothing::ema::Ema;
use crate::smoothing::kalman::{Kalman1D, Kalman2D};

/// Number of recent samples retained for trajectory prediction.
pub const HISTORY_CAPACITY: usize = 5;

/// Physical ceiling applied to raw speed readings, km/h.
pub const MAX_SPEED_KMH: f64 = 120.0;

/// Ceiling applied to raw ETA targets before filtering, seconds.
pub const MAX_ETA_SECONDS: f64 = 3600.0;

/// Samples considered when extrapolating a trajectory.
const TRAJECTORY_WINDOW: usize = 3;

/// Per-cycle fractional bounds on ETA movement.
const ETA_MAX_DECREASE: f64 = 0.05;
const ETA_MAX_INCREASE: f64 = 0.02;

// Filter tuning. Position noise is in squared degrees, so the magnitudes
// are small; speed is km/h and ETA is seconds.
const POSITION_PROCESS_NOISE: f64 = 1e-5;
const POSITION_MEASUREMENT_NOISE: f64 = 1e-4;
const SPEED_PROCESS_NOISE: f64 = 0.5;
const SPEED_MEASUREMENT_NOISE: f64 = 2.0;
const SPEED_EMA_ALPHA: f64 = 0.3;
const ETA_PROCESS_NOISE: f64 = 1.0;
const ETA_MEASUREMENT_NOISE: f64 = 15.0;
const ETA_EMA_ALPHA: f64 = 0.05;

/// One retained observation after smoothing.
#[derive(Debug, Clone)]
pub struct HistorySample {
    pub position: GeoPoint,
    pub observed_at: DateTime<Utc>,
    pub speed_kmh: f64,
}

/// Output of a single smoothing pass.
#[derive(Debug, Clone)]
pub struct SmoothedSignals {
    pub position: GeoPoint,
    pub speed_kmh: f64,
    /// None when no ETA target was available this cycle.
    pub eta_seconds: Option<f64>,
}

/// All smoothing state for one vehicle.
#[derive(Debug, Clone)]
pub struct VehicleSmoother {
    position: Kalman2D,
    speed_filter: Kalman1D,
    speed_ema: Ema,
    eta_filter: Kalman1D,
    /// Published ETA after EMA and rate limiting; anchor for the next
    /// cycle's rate-limit band.
    eta_seconds: Option<f64>,
    history: VecDeque<HistorySample>,
}

impl VehicleSmoother {
    pub fn new() -> Self {
        Self {
            position: Kalman2D::new(POSITION_PROCESS_NOISE, POSITION_MEASUREMENT_NOISE),
            speed_filter: Kalman1D::new(SPEED_PROCESS_NOISE, SPEED_MEASUREMENT_NOISE),
            speed_ema: Ema::new(SPEED_EMA_ALPHA),
            eta_filter: Kalman1D::new(ETA_PROCESS_NOISE, ETA_MEASUREMENT_NOISE),
            eta_seconds: None,
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Runs one observation through every filter chain.
    ///
    /// `raw_speed_kmh` of None keeps the previous smoothed speed (0 before
    /// any reading). `eta_target_seconds` of None skips the ETA chain and
    /// leaves its state untouched.
    pub fn observe(
        &mut self,
        raw_position: GeoPoint,
        raw_speed_kmh: Option<f64>,
        eta_target_seconds: Option<f64>,
        observed_at: DateTime<Utc>,
    ) -> SmoothedSignals {
        let position = self.position.update(raw_position);

        let speed_kmh = match raw_speed_kmh {
            Some(raw) => {
                let clamped = raw.clamp(0.0, MAX_SPEED_KMH);
                let filtered = self.speed_filter.update(clamped);
                self.speed_ema.update(filtered)
            }
            None => self.speed_ema.value().unwrap_or(0.0),
        };

        let eta_seconds = eta_target_seconds.map(|target| self.smooth_eta(target));

        self.history.push_back(HistorySample {
            position,
            observed_at,
            speed_kmh,
        });
        if self.history.len() > HISTORY_CAPACITY {
            self.history.pop_front();
        }

        SmoothedSignals {
            position,
            speed_kmh,
            eta_seconds,
        }
    }

    /// Last published ETA, if the chain has ever produced one.
    pub fn smoothed_eta_seconds(&self) -> Option<f64> {
        self.eta_seconds
    }

    /// Clears the ETA chain so the next target re-initializes it.
    ///
    /// Used after arrival: the rate-limit band anchored at 0 would otherwise
    /// pin every later ETA to 0.
    pub fn reset_eta(&mut self) {
        self.eta_filter.reset();
        self.eta_seconds = None;
    }

    /// Extrapolates the position `seconds_ahead` into the future from the
    /// recent trajectory.
    ///
    /// Averages velocity and bearing between the oldest and newest of the
    /// last three history samples. Returns None with fewer than two samples
    /// or when no wall-clock time elapsed between them.
    pub fn predict_position(&self, seconds_ahead: f64) -> Option<GeoPoint> {
        if self.history.len() < 2 {
            return None;
        }

        let start = self.history.len().saturating_sub(TRAJECTORY_WINDOW);
        let oldest = &self.history[start];
        let newest = &self.history[self.history.len() - 1];

        let elapsed = (newest.observed_at - oldest.observed_at).num_milliseconds() as f64 / 1000.0;
        if elapsed <= 0.0 {
            return None;
        }

        let travelled = geo::haversine_distance_m(oldest.position, newest.position);
        let speed_mps = travelled / elapsed;
        let bearing = geo::initial_bearing_deg(oldest.position, newest.position);

        Some(geo::project_position(
            newest.position,
            bearing,
            speed_mps * seconds_ahead,
        ))
    }

    /// ETA chain: clamp, rate-limit toward the previous published value,
    /// Kalman, EMA, rate-limit again, floor at zero.
    fn smooth_eta(&mut self, target_seconds: f64) -> f64 {
        let clamped = target_seconds.clamp(0.0, MAX_ETA_SECONDS);

        let bounded = match self.eta_seconds {
            Some(previous) => rate_limit(clamped, previous),
            None => clamped,
        };

        let filtered = self.eta_filter.update(bounded);

        let averaged = match self.eta_seconds {
            None => filtered,
            Some(previous) => ETA_EMA_ALPHA * filtered + (1.0 - ETA_EMA_ALPHA) * previous,
        };

        let published = match self.eta_seconds {
            Some(previous) => rate_limit(averaged, previous),
            None => averaged,
        }
        .max(0.0);

        self.eta_seconds = Some(published);
        published
    }
}

impl Default for VehicleSmoother {
    fn default() -> Self {
        Self::new()
    }
}

/// Clamps `value` into the allowed band around `previous`.
///
/// A non-positive anchor disables the band: a zero anchor would otherwise
/// hold the output at zero forever.
fn rate_limit(value: f64, previous: f64) -> f64 {
    if previous <= 0.0 {
        return value;
    }
    value.clamp(
        previous * (1.0 - ETA_MAX_DECREASE),
        previous * (1.0 + ETA_MAX_INCREASE),
    )
}
