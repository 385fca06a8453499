//! Fleetwatch - live fleet ETA tracking
//!
//! This library tracks a fleet of vehicles against a fixed destination and
//! produces a stable, continuously updating ETA, route path and status per
//! vehicle, suitable for live display. Raw fixes are noisy, bursty and
//! sometimes stale; routing answers come from an expensive external call
//! that is rate limited by a refresh policy and cached per vehicle; every
//! displayed signal runs through a Kalman + EMA smoothing chain.
//!
//! # High-Level API
//!
//! ```ignore
//! use std::sync::Arc;
//! use fleetwatch::config::TrackerConfig;
//! use fleetwatch::daemon::TrackerDaemon;
//! use fleetwatch::ingest::{SyntheticFleet, SyntheticFleetConfig};
//! use fleetwatch::routing::OsrmRouter;
//! use fleetwatch::tracker::EtaPipeline;
//!
//! let pipeline = Arc::new(EtaPipeline::new(OsrmRouter::new()?, TrackerConfig::default()));
//! let source = SyntheticFleet::new(SyntheticFleetConfig::default());
//! let daemon = TrackerDaemon::new(source, pipeline);
//!
//! let mut payloads = daemon.pipeline().subscribe();
//! daemon.start();
//! ```

pub mod config;
pub mod daemon;
pub mod geo;
pub mod ingest;
pub mod logging;
pub mod polyline;
pub mod routing;
pub mod smoothing;
pub mod time;
pub mod tracker;

/// Version of the fleetwatch library and CLI.
///
/// Synchronized across all workspace members via `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
