//! Offline and arrival classification

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::status::Phase;
use crate::geo::{self, GeoPoint};
use crate::ingest::RawFix;
use crate::time;

/// Fixes older than this mean the vehicle has stopped reporting.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(10 * 60);

/// Within this distance of the destination a vehicle counts as arrived.
pub const DEFAULT_ARRIVAL_RADIUS_M: f64 = 50.0;

/// Classifies a fix against the destination.
///
/// Staleness wins over arrival: a ten-minute-old fix parked at the
/// destination still classifies as offline.
pub fn classify(
    fix: &RawFix,
    destination: GeoPoint,
    now: DateTime<Utc>,
    stale_after: Duration,
    arrival_radius_m: f64,
) -> Phase {
    let age_secs = time::seconds_between(fix.observed_at, now);
    if age_secs > stale_after.as_secs_f64() {
        return Phase::Offline;
    }

    if geo::haversine_distance_m(fix.position, destination) <= arrival_radius_m {
        return Phase::Arrived;
    }

    Phase::Tracking
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn destination() -> GeoPoint {
        GeoPoint {
            lat: -1.9684,
            lon: 30.0891,
        }
    }

    fn fix_at(position: GeoPoint, observed_at: DateTime<Utc>) -> RawFix {
        RawFix {
            vehicle_id: "RAC-440".to_string(),
            plate_label: "RAC 440 B".to_string(),
            position,
            speed_kmh: Some(40.0),
            observed_at,
        }
    }

    fn now() -> DateTime<Utc> {
        time::parse_timestamp("2024-05-04T08:00:00Z").unwrap()
    }

    #[test]
    fn test_fresh_distant_fix_is_tracking() {
        let fix = fix_at(
            GeoPoint {
                lat: -1.9441,
                lon: 30.0619,
            },
            now(),
        );

        let phase = classify(&fix, destination(), now(), DEFAULT_STALE_AFTER, 50.0);
        assert_eq!(phase, Phase::Tracking);
    }

    #[test]
    fn test_eleven_minute_old_fix_is_offline() {
        let fix = fix_at(
            GeoPoint {
                lat: -1.9441,
                lon: 30.0619,
            },
            now() - TimeDelta::minutes(11),
        );

        let phase = classify(&fix, destination(), now(), DEFAULT_STALE_AFTER, 50.0);
        assert_eq!(phase, Phase::Offline);
    }

    #[test]
    fn test_exactly_at_threshold_is_not_offline() {
        let fix = fix_at(
            GeoPoint {
                lat: -1.9441,
                lon: 30.0619,
            },
            now() - TimeDelta::minutes(10),
        );

        let phase = classify(&fix, destination(), now(), DEFAULT_STALE_AFTER, 50.0);
        assert_eq!(phase, Phase::Tracking);
    }

    #[test]
    fn test_fix_inside_radius_is_arrived() {
        // ~22 m northeast of the destination
        let fix = fix_at(
            GeoPoint {
                lat: -1.96826,
                lon: 30.08923,
            },
            now(),
        );

        let phase = classify(&fix, destination(), now(), DEFAULT_STALE_AFTER, 50.0);
        assert_eq!(phase, Phase::Arrived);
    }

    #[test]
    fn test_fix_just_outside_radius_is_tracking() {
        // ~78 m north of the destination
        let fix = fix_at(
            GeoPoint {
                lat: -1.9677,
                lon: 30.0891,
            },
            now(),
        );

        let phase = classify(&fix, destination(), now(), DEFAULT_STALE_AFTER, 50.0);
        assert_eq!(phase, Phase::Tracking);
    }

    #[test]
    fn test_stale_fix_at_destination_is_offline() {
        let fix = fix_at(destination(), now() - TimeDelta::minutes(20));

        let phase = classify(&fix, destination(), now(), DEFAULT_STALE_AFTER, 50.0);
        assert_eq!(phase, Phase::Offline);
    }

    #[test]
    fn test_future_dated_fix_is_not_offline() {
        // Device clocks drift; a slightly future timestamp is still fresh
        let fix = fix_at(
            GeoPoint {
                lat: -1.9441,
                lon: 30.0619,
            },
            now() + TimeDelta::seconds(30),
        );

        let phase = classify(&fix, destination(), now(), DEFAULT_STALE_AFTER, 50.0);
        assert_eq!(phase, Phase::Tracking);
    }
}
