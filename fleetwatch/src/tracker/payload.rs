//! Broadcast payload types
//!
//! The wire shapes handed to the broadcast sink. Field names follow the
//! camelCase convention subscribers expect, so serde renames are pinned here
//! rather than left to struct field spelling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

use super::status::PayloadStatus;

/// One vehicle's tracking update, emitted once per processing cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtaPayload {
    /// Stable vehicle identifier from the telemetry source.
    pub vehicle_id: String,

    /// Human-facing label, usually the plate number.
    pub plate_label: String,

    /// Smoothed vehicle position.
    pub position: GeoPoint,

    /// Smoothed speed in km/h, never negative.
    #[serde(rename = "speed")]
    pub speed_kmh: f64,

    /// ETA rounded to whole minutes, absent when no estimate exists.
    #[serde(rename = "eta")]
    pub eta_minutes: Option<u64>,

    /// ETA in seconds, absent when no estimate exists.
    pub eta_seconds: Option<f64>,

    pub status: PayloadStatus,

    /// Display text matching `status`.
    pub status_message: String,

    /// Route geometry toward the destination, empty when offline.
    pub path: Vec<GeoPoint>,

    /// Timestamp of the fix this payload was derived from.
    #[serde(rename = "lastFixTimestamp")]
    pub last_fix_at: DateTime<Utc>,
}

/// Converts an ETA in seconds to the rounded minute figure shown to riders.
pub fn eta_minutes_from_seconds(eta_seconds: Option<f64>) -> Option<u64> {
    eta_seconds.map(|secs| (secs.max(0.0) / 60.0).round() as u64)
}

/// Whole-fleet view published after each successful cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetSnapshot {
    /// When the snapshot was assembled.
    pub timestamp: DateTime<Utc>,

    /// Number of vehicles in `vehicles`.
    pub count: usize,

    /// Latest payload per vehicle, ordered by vehicle id.
    pub vehicles: Vec<EtaPayload>,
}
