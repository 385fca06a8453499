//! Integration tests for the tracking cycle daemon.
//!
//! These tests drive the full loop: a seeded synthetic fleet (or a failing
//! source) -> TrackerDaemon cycles -> pipeline -> payload and snapshot
//! broadcasts -> clean cancellation.
//!
//! Run with: `cargo test --test daemon_integration`

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use fleetwatch::config::TrackerConfig;
use fleetwatch::daemon::TrackerDaemon;
use fleetwatch::geo::GeoPoint;
use fleetwatch::ingest::{FixSource, IngestError, RawFix, SyntheticFleet, SyntheticFleetConfig};
use fleetwatch::routing::{RouteEstimate, RoutingError, RoutingProvider};
use fleetwatch::tracker::EtaPipeline;

// ============================================================================
// Test Helpers
// ============================================================================

/// Provider that always answers instantly with a fixed estimate.
struct InstantRouter;

impl RoutingProvider for InstantRouter {
    async fn fetch_eta(
        &self,
        _origin: GeoPoint,
        _destination: GeoPoint,
    ) -> Result<RouteEstimate, RoutingError> {
        Ok(RouteEstimate {
            duration_secs: Some(300.0),
            distance_meters: Some(3_500.0),
        })
    }

    async fn fetch_route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Result<Vec<GeoPoint>, RoutingError> {
        Ok(vec![origin, destination])
    }
}

/// Source whose every fetch fails, as if the telemetry backend were down.
struct DeadSource;

impl FixSource for DeadSource {
    async fn fetch_fleet(&self) -> Result<Vec<RawFix>, IngestError> {
        Err(IngestError::HttpError("telemetry backend down".to_string()))
    }
}

fn destination() -> GeoPoint {
    GeoPoint {
        lat: -1.9536,
        lon: 30.0606,
    }
}

fn fast_config() -> TrackerConfig {
    TrackerConfig {
        destination: destination(),
        poll_interval: Duration::from_millis(20),
        ..TrackerConfig::default()
    }
}

fn seeded_fleet(vehicles: usize) -> SyntheticFleet {
    SyntheticFleet::new(SyntheticFleetConfig {
        vehicle_count: vehicles,
        destination: destination(),
        dwell_probability: 0.0,
        seed: Some(42),
        ..SyntheticFleetConfig::default()
    })
}

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Full Cycle Flow
// ============================================================================

#[tokio::test]
async fn test_daemon_emits_payloads_and_snapshots() {
    let pipeline = Arc::new(EtaPipeline::new(InstantRouter, fast_config()));
    let daemon = TrackerDaemon::new(seeded_fleet(3), Arc::clone(&pipeline));

    let mut payloads = pipeline.subscribe();
    let mut snapshots = daemon.subscribe_snapshots();
    let cancel = daemon.cancellation_token();
    let handle = daemon.start();

    let payload = timeout(RECV_TIMEOUT, payloads.recv())
        .await
        .expect("payload within timeout")
        .expect("channel open");

    assert!(payload.vehicle_id.starts_with("SIM-"));
    assert!(payload.speed_kmh >= 0.0);
    assert!(payload.eta_seconds.unwrap_or(0.0) >= 0.0);

    let snapshot = timeout(RECV_TIMEOUT, snapshots.recv())
        .await
        .expect("snapshot within timeout")
        .expect("channel open");

    assert_eq!(snapshot.count, 3);
    assert_eq!(snapshot.vehicles.len(), 3);
    // Snapshots are ordered by vehicle id
    assert!(snapshot.vehicles[0].vehicle_id <= snapshot.vehicles[1].vehicle_id);

    cancel.cancel();
    timeout(RECV_TIMEOUT, handle)
        .await
        .expect("daemon stops after cancellation")
        .unwrap();
}

#[tokio::test]
async fn test_consecutive_cycles_accumulate_stats() {
    let pipeline = Arc::new(EtaPipeline::new(InstantRouter, fast_config()));
    let daemon = TrackerDaemon::new(seeded_fleet(2), Arc::clone(&pipeline));

    let mut snapshots = daemon.subscribe_snapshots();
    let cancel = daemon.cancellation_token();
    let handle = daemon.start();

    // Wait for at least three full cycles
    for _ in 0..3 {
        timeout(RECV_TIMEOUT, snapshots.recv())
            .await
            .expect("snapshot within timeout")
            .expect("channel open");
    }

    cancel.cancel();
    timeout(RECV_TIMEOUT, handle).await.unwrap().unwrap();

    let stats = pipeline.stats();
    assert!(stats.fixes_processed >= 6, "3 cycles x 2 vehicles minimum");
    assert!(stats.payloads_emitted >= 6);
    assert_eq!(stats.fixes_skipped, 0);
    // The second and third cycles reuse the cache, so refreshes lag fixes
    assert!(stats.eta_refreshes >= 2);
}

// ============================================================================
// Source Failure Handling
// ============================================================================

#[tokio::test]
async fn test_source_failure_skips_cycles_without_crashing() {
    let pipeline = Arc::new(EtaPipeline::new(InstantRouter, fast_config()));
    let daemon = TrackerDaemon::new(DeadSource, Arc::clone(&pipeline));

    let mut snapshots = daemon.subscribe_snapshots();
    let cancel = daemon.cancellation_token();
    let handle = daemon.start();

    // Failed fetches publish nothing
    let result = timeout(Duration::from_millis(200), snapshots.recv()).await;
    assert!(result.is_err(), "no snapshot should arrive from a dead source");
    assert_eq!(pipeline.stats().fixes_processed, 0);

    // The daemon is still alive and stops cleanly on request
    cancel.cancel();
    timeout(RECV_TIMEOUT, handle)
        .await
        .expect("daemon stops even while backing off")
        .unwrap();
}

#[tokio::test]
async fn test_cancellation_before_first_cycle() {
    let pipeline = Arc::new(EtaPipeline::new(InstantRouter, fast_config()));
    let daemon = TrackerDaemon::new(seeded_fleet(1), Arc::clone(&pipeline));

    let cancel = daemon.cancellation_token();
    cancel.cancel();

    let handle = daemon.start();
    timeout(RECV_TIMEOUT, handle)
        .await
        .expect("pre-cancelled daemon exits immediately")
        .unwrap();
}
