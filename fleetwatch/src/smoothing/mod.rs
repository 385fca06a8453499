//! Signal smoothing module
//!
//! Raw fleet telemetry is noisy: GPS positions scatter, speed readings spike,
//! and successive routing estimates can disagree by minutes. This module owns
//! the per-vehicle filter stack that turns those raw signals into the stable
//! values a live display can animate: Kalman filters for position, speed and
//! ETA, exponential moving averages on top, and asymmetric rate limiting so a
//! displayed ETA never jumps.

mod ema;
mod kalman;
mod vehicle;

pub use ema::Ema;
pub use kalman::{Kalman1D, Kalman2D};
pub use vehicle::{
    HistorySample, SmoothedSignals, VehicleSmoother, HISTORY_CAPACITY, MAX_ETA_SECONDS,
    MAX_SPEED_KMH,
};
