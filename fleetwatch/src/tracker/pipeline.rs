//! ETA pipeline orchestrator
//!
//! Ties the tracker together: every fix runs through classification, the
//! refresh policy, an optional routing provider call, the cache, and the
//! smoothing engine, and comes out as one [`EtaPayload`]. The pipeline owns
//! all per-vehicle state and is the only way the rest of the process touches
//! it.
//!
//! One `process_fix` call per vehicle per cycle. Calls for different
//! vehicles may run concurrently: each one only touches its own cache and
//! smoother entries, and no registry guard is ever held across a provider
//! call.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::config::TrackerConfig;
use crate::geo::{self, GeoPoint};
use crate::ingest::RawFix;
use crate::routing::{RoutingError, RoutingProvider};
use crate::smoothing::VehicleSmoother;

use super::cache::EtaCache;
use super::classifier;
use super::payload::{eta_minutes_from_seconds, EtaPayload, FleetSnapshot};
use super::refresh;
use super::status::{PayloadStatus, Phase};

/// Broadcast buffer size for per-vehicle payloads.
const PAYLOAD_CHANNEL_CAPACITY: usize = 64;

/// Counters for one pipeline's lifetime.
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    pub fixes_processed: u64,
    pub fixes_skipped: u64,
    pub eta_refreshes: u64,
    pub route_refreshes: u64,
    pub provider_failures: u64,
    pub payloads_emitted: u64,
}

/// Per-fleet tracking orchestrator.
///
/// Generic over the routing provider so tests can script routing answers.
pub struct EtaPipeline<P: RoutingProvider> {
    provider: P,
    config: TrackerConfig,
    cache: EtaCache,
    smoothers: DashMap<String, VehicleSmoother>,
    /// Latest payload per vehicle, the source for fleet snapshots.
    latest: DashMap<String, EtaPayload>,
    payload_tx: broadcast::Sender<EtaPayload>,
    stats: Mutex<PipelineStats>,
}

impl<P: RoutingProvider> EtaPipeline<P> {
    pub fn new(provider: P, config: TrackerConfig) -> Self {
        let (payload_tx, _) = broadcast::channel(PAYLOAD_CHANNEL_CAPACITY);
        Self {
            provider,
            config,
            cache: EtaCache::new(),
            smoothers: DashMap::new(),
            latest: DashMap::new(),
            payload_tx,
            stats: Mutex::new(PipelineStats::default()),
        }
    }

    /// The configuration this pipeline runs under.
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// The routing provider this pipeline queries.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Subscribes to per-vehicle payloads as they are produced.
    pub fn subscribe(&self) -> broadcast::Receiver<EtaPayload> {
        self.payload_tx.subscribe()
    }

    /// Snapshot of the pipeline counters.
    pub fn stats(&self) -> PipelineStats {
        self.stats.lock().unwrap().clone()
    }

    /// Runs one fix through the full tracking pipeline.
    ///
    /// Returns None only when the fix carries unusable coordinates, which is
    /// logged and counted but never fatal. Every other fix produces a
    /// payload, including offline and arrived vehicles.
    pub async fn process_fix(&self, fix: &RawFix, now: DateTime<Utc>) -> Option<EtaPayload> {
        if !fix.position.lat.is_finite() || !fix.position.lon.is_finite() {
            warn!(
                vehicle_id = %fix.vehicle_id,
                "Skipping fix with non-finite coordinates"
            );
            self.stats.lock().unwrap().fixes_skipped += 1;
            return None;
        }

        let phase = classifier::classify(
            fix,
            self.config.destination,
            now,
            self.config.stale_after,
            self.config.arrival_radius_m,
        );

        let payload = match phase {
            Phase::Offline => self.offline_payload(fix),
            Phase::Arrived => self.arrived_payload(fix, now),
            Phase::Tracking => self.tracking_payload(fix, now).await,
        };

        {
            let mut stats = self.stats.lock().unwrap();
            stats.fixes_processed += 1;
            stats.payloads_emitted += 1;
        }
        self.latest.insert(fix.vehicle_id.clone(), payload.clone());
        // No subscribers is fine; the daemon may run headless
        let _ = self.payload_tx.send(payload.clone());

        Some(payload)
    }

    /// Builds the fleet-wide snapshot from the latest payload per vehicle.
    pub fn snapshot(&self, now: DateTime<Utc>) -> FleetSnapshot {
        let mut vehicles: Vec<EtaPayload> = self
            .latest
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        vehicles.sort_by(|a, b| a.vehicle_id.cmp(&b.vehicle_id));

        FleetSnapshot {
            timestamp: now,
            count: vehicles.len(),
            vehicles,
        }
    }

    /// Number of vehicles the pipeline has seen.
    pub fn vehicle_count(&self) -> usize {
        self.latest.len()
    }

    /// Payload for a vehicle whose fix has gone stale.
    ///
    /// Cache and smoother are deliberately left alone so tracking resumes
    /// from the last known state when fixes return.
    fn offline_payload(&self, fix: &RawFix) -> EtaPayload {
        debug!(vehicle_id = %fix.vehicle_id, "Vehicle offline, fix too old");

        EtaPayload {
            vehicle_id: fix.vehicle_id.clone(),
            plate_label: fix.plate_label.clone(),
            position: fix.position,
            speed_kmh: fix.speed_kmh.unwrap_or(0.0).max(0.0),
            eta_minutes: None,
            eta_seconds: None,
            status: PayloadStatus::Offline,
            status_message: PayloadStatus::Offline.message().to_string(),
            path: Vec::new(),
            last_fix_at: fix.observed_at,
        }
    }

    /// Payload for a vehicle inside the arrival radius.
    fn arrived_payload(&self, fix: &RawFix, now: DateTime<Utc>) -> EtaPayload {
        self.cache
            .upsert(&fix.vehicle_id, |entry| entry.record_arrival(now));

        // Position and speed still smooth; the ETA chain resets so a later
        // departure re-initializes instead of crawling up from zero.
        let smoothed = {
            let mut smoother = self.smoothers.entry(fix.vehicle_id.clone()).or_default();
            let out = smoother.observe(fix.position, fix.speed_kmh, None, fix.observed_at);
            smoother.reset_eta();
            out
        };

        debug!(vehicle_id = %fix.vehicle_id, "Vehicle arrived at destination");

        EtaPayload {
            vehicle_id: fix.vehicle_id.clone(),
            plate_label: fix.plate_label.clone(),
            position: smoothed.position,
            speed_kmh: smoothed.speed_kmh,
            eta_minutes: Some(0),
            eta_seconds: Some(0.0),
            status: PayloadStatus::Arrived,
            status_message: PayloadStatus::Arrived.message().to_string(),
            path: Vec::new(),
            last_fix_at: fix.observed_at,
        }
    }

    /// Full tracking path: refresh policy, provider, cache, smoothing.
    async fn tracking_payload(&self, fix: &RawFix, now: DateTime<Utc>) -> EtaPayload {
        let entry = self.cache.snapshot(&fix.vehicle_id).unwrap_or_default();

        let moved_m = entry
            .last_position
            .map(|p| geo::haversine_distance_m(p, fix.position))
            .unwrap_or(0.0);
        let moving = self.config.refresh.is_moving(fix.speed_kmh, moved_m);
        let previous_eta = entry.eta_seconds;

        let eta_target = if self.config.refresh.should_refresh_eta(
            entry.eta_age_secs(now),
            moved_m,
            moving,
        ) {
            match self.fetch_eta_guarded(fix.position).await {
                Some(duration_secs) => {
                    self.cache.upsert(&fix.vehicle_id, |e| {
                        e.record_eta(duration_secs, fix.position, now)
                    });
                    Some(duration_secs)
                }
                // Failed refresh: fall back to the cached value and leave
                // the refresh timestamp alone so the next cycle retries.
                None => entry
                    .eta_seconds
                    .zip(entry.eta_age_secs(now))
                    .map(|(eta, age)| refresh::countdown_eta(eta, age, moving)),
            }
        } else {
            entry
                .eta_seconds
                .zip(entry.eta_age_secs(now))
                .map(|(eta, age)| refresh::countdown_eta(eta, age, moving))
        };

        let path = if self
            .config
            .refresh
            .should_refresh_route(entry.route_age_secs(now), !entry.path.is_empty())
        {
            match self.fetch_route_guarded(fix.position).await {
                Some(path) => {
                    self.cache
                        .upsert(&fix.vehicle_id, |e| e.record_route(path.clone(), now));
                    path
                }
                None if !entry.path.is_empty() => entry.path.clone(),
                // Nothing cached either: degrade to a straight leg
                None => vec![fix.position, self.config.destination],
            }
        } else {
            entry.path.clone()
        };

        let smoothed = {
            let mut smoother = self.smoothers.entry(fix.vehicle_id.clone()).or_default();
            smoother.observe(fix.position, fix.speed_kmh, eta_target, fix.observed_at)
        };

        // Trend compares raw cache-level values: the smoothed stream is rate
        // limited and by construction never shows the jump being reported.
        let eta_delta = eta_target
            .zip(previous_eta)
            .map(|(new, old)| new - old);
        let status = PayloadStatus::from_eta_trend(eta_delta, moving);

        EtaPayload {
            vehicle_id: fix.vehicle_id.clone(),
            plate_label: fix.plate_label.clone(),
            position: smoothed.position,
            speed_kmh: smoothed.speed_kmh,
            eta_minutes: eta_minutes_from_seconds(smoothed.eta_seconds),
            eta_seconds: smoothed.eta_seconds,
            status,
            status_message: status.message().to_string(),
            path,
            last_fix_at: fix.observed_at,
        }
    }

    /// Provider ETA call bounded by the configured timeout.
    ///
    /// Every failure mode collapses to None; the caller falls back to cache.
    async fn fetch_eta_guarded(&self, origin: GeoPoint) -> Option<f64> {
        let call = self.provider.fetch_eta(origin, self.config.destination);
        match tokio::time::timeout(self.config.provider_timeout, call).await {
            Ok(Ok(estimate)) => match estimate.duration_secs {
                Some(duration) => {
                    self.stats.lock().unwrap().eta_refreshes += 1;
                    Some(duration)
                }
                None => {
                    warn!(origin = %origin, "Routing estimate carried no duration");
                    self.stats.lock().unwrap().provider_failures += 1;
                    None
                }
            },
            Ok(Err(e)) => {
                warn!(origin = %origin, error = %e, "ETA refresh failed");
                self.stats.lock().unwrap().provider_failures += 1;
                None
            }
            Err(_) => {
                let timeout = RoutingError::Timeout(self.config.provider_timeout);
                warn!(origin = %origin, error = %timeout, "ETA refresh timed out");
                self.stats.lock().unwrap().provider_failures += 1;
                None
            }
        }
    }

    /// Provider route call bounded by the configured timeout.
    async fn fetch_route_guarded(&self, origin: GeoPoint) -> Option<Vec<GeoPoint>> {
        let call = self.provider.fetch_route(origin, self.config.destination);
        match tokio::time::timeout(self.config.provider_timeout, call).await {
            Ok(Ok(path)) if !path.is_empty() => {
                self.stats.lock().unwrap().route_refreshes += 1;
                Some(path)
            }
            Ok(Ok(_)) => {
                warn!(origin = %origin, "Routing service returned an empty path");
                self.stats.lock().unwrap().provider_failures += 1;
                None
            }
            Ok(Err(e)) => {
                warn!(origin = %origin, error = %e, "Route refresh failed");
                self.stats.lock().unwrap().provider_failures += 1;
                None
            }
            Err(_) => {
                warn!(origin = %origin, "Route refresh timed out");
                self.stats.lock().unwrap().provider_failures += 1;
                None
            }
        }
    }
}
