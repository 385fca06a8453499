//! Routing provider module
//!
//! Abstracts the external routing service that answers "how long from here
//! to the destination". The tracking pipeline treats it as expensive and
//! unreliable: calls are rate limited by the refresh policy and every
//! failure falls back to cached values.

mod http;
mod osrm;
mod types;

pub use http::{HttpClient, ReqwestClient, DEFAULT_HTTP_TIMEOUT_SECS};
pub use osrm::OsrmRouter;
pub use types::{RouteEstimate, RoutingError, RoutingProvider};

#[cfg(test)]
pub use http::tests::MockHttpClient;
