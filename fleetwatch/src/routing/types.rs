//! Routing provider types and trait definitions

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::geo::GeoPoint;

/// Travel estimate for one origin/destination pair.
///
/// Fields are optional because some backends omit them for degenerate
/// requests (zero-length legs, snapped-together endpoints).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RouteEstimate {
    /// Driving time in seconds
    pub duration_secs: Option<f64>,
    /// Driving distance in meters
    pub distance_meters: Option<f64>,
}

/// Errors returned by routing backends.
#[derive(Debug, Clone, Error)]
pub enum RoutingError {
    /// Transport-level failure (connect, TLS, non-success status)
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The service answered but rejected the request
    #[error("Routing service rejected request: {0}")]
    ServiceError(String),

    /// The response body could not be parsed
    #[error("Malformed routing response: {0}")]
    MalformedResponse(String),

    /// The service found no route between the endpoints
    #[error("No route from {origin} to {destination}")]
    NoRoute {
        origin: GeoPoint,
        destination: GeoPoint,
    },

    /// The call exceeded the caller's deadline
    #[error("Routing request timed out after {0:?}")]
    Timeout(Duration),
}

/// A routing backend that can answer ETA and route-shape queries.
///
/// Implementations are expected to be cheap to share (`&self` methods) and
/// safe to call concurrently for different vehicles. Either call may fail or
/// time out; the tracking pipeline falls back to cached values on failure.
pub trait RoutingProvider: Send + Sync {
    /// Returns the current driving estimate from `origin` to `destination`.
    fn fetch_eta(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> impl Future<Output = Result<RouteEstimate, RoutingError>> + Send;

    /// Returns the route geometry from `origin` to `destination`.
    fn fetch_route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> impl Future<Output = Result<Vec<GeoPoint>, RoutingError>> + Send;
}
