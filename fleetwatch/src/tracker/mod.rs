//! Vehicle tracking module
//!
//! The per-vehicle ETA tracking core: offline/arrival classification, the
//! routing cache and refresh policy, payload assembly, and the
//! [`EtaPipeline`] orchestrator that runs one fix through all of it.

mod cache;
mod classifier;
mod payload;
mod pipeline;
mod refresh;
mod status;

pub use cache::{EtaCache, VehicleCacheEntry};
pub use classifier::{classify, DEFAULT_ARRIVAL_RADIUS_M, DEFAULT_STALE_AFTER};
pub use payload::{eta_minutes_from_seconds, EtaPayload, FleetSnapshot};
pub use pipeline::{EtaPipeline, PipelineStats};
pub use refresh::{
    countdown_eta, RefreshPolicy, DEFAULT_ETA_REFRESH_SECS, DEFAULT_MIN_MOVE_FOR_REFRESH_M,
    DEFAULT_ROUTE_REFRESH_SECS, DEFAULT_STATIONARY_MOVE_M, DEFAULT_STATIONARY_SPEED_KMH,
};
pub use status::{PayloadStatus, Phase, FASTER_DELTA_SECS, TRAFFIC_DELTA_SECS};
