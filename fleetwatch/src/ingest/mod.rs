//! Fleet fix ingestion module
//!
//! Everything that produces position fixes for the tracker: the strict
//! [`RawFix`] shape, normalization of loose wire records, and the sources
//! the daemon can poll (a live telemetry endpoint or a simulated fleet).

mod error;
mod http;
mod record;
mod synthetic;

use std::future::Future;

pub use error::IngestError;
pub use http::{HttpFixSource, DEFAULT_FETCH_TIMEOUT_SECS};
pub use record::{DeviceRecord, RawFix};
pub use synthetic::{SyntheticFleet, SyntheticFleetConfig};

/// A source of fleet position fixes, polled once per tracking cycle.
///
/// Implementations must tolerate being polled forever: a failed fetch is
/// reported as an error and the daemon simply tries again next cycle.
pub trait FixSource: Send + Sync {
    /// Returns the latest known fix for every vehicle in the fleet.
    fn fetch_fleet(&self) -> impl Future<Output = Result<Vec<RawFix>, IngestError>> + Send;
}
