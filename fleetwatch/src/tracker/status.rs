//! Vehicle status types
//!
//! Two layers of status exist. [`Phase`] is the classifier's verdict on a
//! fix: is this vehicle still worth routing for at all? [`PayloadStatus`] is
//! what goes on the wire: lifecycle states pass through unchanged, and
//! en-route vehicles carry their ETA trend instead so displays can color the
//! state without re-deriving it.

use serde::{Deserialize, Serialize};

/// ETA increase that reads as congestion, seconds.
pub const TRAFFIC_DELTA_SECS: f64 = 90.0;

/// ETA decrease that reads as making good time, seconds.
pub const FASTER_DELTA_SECS: f64 = 60.0;

/// Lifecycle phase of a vehicle, classified from its latest fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Fix is fresh and the vehicle is en route; the full pipeline runs.
    Tracking,
    /// The last fix is older than the staleness threshold.
    Offline,
    /// The fix is within the arrival radius of the destination.
    Arrived,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tracking => write!(f, "Tracking"),
            Self::Offline => write!(f, "Offline"),
            Self::Arrived => write!(f, "Arrived"),
        }
    }
}

/// Status carried in an [`EtaPayload`](super::EtaPayload).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadStatus {
    /// En route, ETA roughly on track.
    Normal,
    /// En route, ETA jumped upward.
    Traffic,
    /// En route, ETA dropped sharply.
    Faster,
    /// Reporting but not moving.
    Stopped,
    /// At the destination.
    Arrived,
    /// No fresh fix.
    Offline,
}

impl PayloadStatus {
    /// Derives the en-route status from the ETA movement this cycle.
    ///
    /// `eta_delta_secs` is the new ETA minus the previously cached one; None
    /// when there is no previous value to compare against.
    pub fn from_eta_trend(eta_delta_secs: Option<f64>, is_moving: bool) -> Self {
        if !is_moving {
            return Self::Stopped;
        }
        match eta_delta_secs {
            Some(delta) if delta >= TRAFFIC_DELTA_SECS => Self::Traffic,
            Some(delta) if delta < -FASTER_DELTA_SECS => Self::Faster,
            _ => Self::Normal,
        }
    }

    /// True for every status that still represents an en-route vehicle.
    #[inline]
    pub fn is_tracking(&self) -> bool {
        matches!(
            self,
            Self::Normal | Self::Traffic | Self::Faster | Self::Stopped
        )
    }

    /// Rider-facing message paired with the status.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Normal => "on the way",
            Self::Traffic => "delayed",
            Self::Faster => "moving quickly",
            Self::Stopped => "bus is stopped",
            Self::Arrived => "arrived at destination",
            Self::Offline => "signal lost",
        }
    }
}

impl std::fmt::Display for PayloadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Traffic => write!(f, "traffic"),
            Self::Faster => write!(f, "faster"),
            Self::Stopped => write!(f, "stopped"),
            Self::Arrived => write!(f, "arrived"),
            Self::Offline => write!(f, "offline"),
        }
    }
}
