//! Scalar Kalman filtering

use crate::geo::GeoPoint;

/// One-dimensional Kalman filter with constant process and measurement noise.
///
/// The first observation initializes the state directly; subsequent
/// observations blend prediction and measurement by the computed gain.
#[derive(Debug, Clone)]
pub struct Kalman1D {
    /// Process noise covariance
    q: f64,
    /// Measurement noise covariance
    r: f64,
    value: Option<f64>,
    error_covariance: f64,
}

impl Kalman1D {
    pub fn new(q: f64, r: f64) -> Self {
        Self {
            q,
            r,
            value: None,
            error_covariance: 1.0,
        }
    }

    /// Feeds one measurement through the filter and returns the new estimate.
    pub fn update(&mut self, measurement: f64) -> f64 {
        match self.value {
            None => {
                self.value = Some(measurement);
                self.error_covariance = 1.0;
                measurement
            }
            Some(estimate) => {
                let predicted_covariance = self.error_covariance + self.q;
                let gain = predicted_covariance / (predicted_covariance + self.r);
                let corrected = estimate + gain * (measurement - estimate);
                self.error_covariance = (1.0 - gain) * predicted_covariance;
                self.value = Some(corrected);
                corrected
            }
        }
    }

    /// Current estimate, None before the first observation.
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    /// Drops all state so the next observation re-initializes the filter.
    pub fn reset(&mut self) {
        self.value = None;
        self.error_covariance = 1.0;
    }
}

/// Two-dimensional position filter built from independent per-axis filters.
///
/// Latitude and longitude are filtered separately in degree units, which is
/// adequate at vehicle speeds and keeps the math scalar.
#[derive(Debug, Clone)]
pub struct Kalman2D {
    lat: Kalman1D,
    lon: Kalman1D,
}

impl Kalman2D {
    pub fn new(q: f64, r: f64) -> Self {
        Self {
            lat: Kalman1D::new(q, r),
            lon: Kalman1D::new(q, r),
        }
    }

    pub fn update(&mut self, measurement: GeoPoint) -> GeoPoint {
        GeoPoint {
            lat: self.lat.update(measurement.lat),
            lon: self.lon.update(measurement.lon),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_observation_initializes_state() {
        let mut filter = Kalman1D::new(1.0, 15.0);

        assert_eq!(filter.value(), None);
        let out = filter.update(42.0);
        assert_eq!(out, 42.0);
        assert_eq!(filter.value(), Some(42.0));
    }

    #[test]
    fn test_converges_toward_constant_signal() {
        let mut filter = Kalman1D::new(0.5, 2.0);
        filter.update(0.0);

        let mut estimate = 0.0;
        for _ in 0..50 {
            estimate = filter.update(50.0);
        }
        assert!(
            (estimate - 50.0).abs() < 0.5,
            "Filter should converge to the signal, got {}",
            estimate
        );
    }

    #[test]
    fn test_update_moves_between_estimate_and_measurement() {
        let mut filter = Kalman1D::new(1.0, 15.0);
        filter.update(100.0);

        let out = filter.update(50.0);
        assert!(out < 100.0 && out > 50.0);
    }

    #[test]
    fn test_damps_oscillating_signal() {
        let mut filter = Kalman1D::new(1.0, 15.0);
        filter.update(100.0);

        // Alternating inputs should produce far smaller output swings
        let mut previous = 100.0;
        let mut max_step = 0.0f64;
        for i in 0..20 {
            let raw = if i % 2 == 0 { 10.0 } else { 100.0 };
            let out = filter.update(raw);
            max_step = max_step.max((out - previous).abs());
            previous = out;
        }
        assert!(
            max_step < 45.0,
            "Output steps should be damped versus the 90-unit input swing, got {}",
            max_step
        );
    }

    #[test]
    fn test_reset_reinitializes() {
        let mut filter = Kalman1D::new(1.0, 15.0);
        filter.update(10.0);
        filter.update(20.0);

        filter.reset();
        assert_eq!(filter.value(), None);
        assert_eq!(filter.update(300.0), 300.0);
    }

    #[test]
    fn test_two_dimensional_axes_independent() {
        let mut filter = Kalman2D::new(1e-5, 1e-4);

        let first = filter.update(GeoPoint {
            lat: -1.9441,
            lon: 30.0619,
        });
        assert_eq!(first.lat, -1.9441);
        assert_eq!(first.lon, 30.0619);

        let second = filter.update(GeoPoint {
            lat: -1.9450,
            lon: 30.0619,
        });
        // Latitude moves toward the new measurement, longitude is unchanged
        assert!(second.lat < -1.9441 && second.lat > -1.9450);
        assert_eq!(second.lon, 30.0619);
    }
}
