//! OSRM routing backend
//!
//! Queries an OSRM `route` service over HTTP. Works against the public demo
//! server by default, or any self-hosted instance via `with_base_url`.

use serde::Deserialize;
use tracing::debug;

use super::http::{HttpClient, ReqwestClient};
use super::types::{RouteEstimate, RoutingError, RoutingProvider};
use crate::geo::GeoPoint;
use crate::polyline;

const DEFAULT_BASE_URL: &str = "https://router.project-osrm.org";

/// Routing provider backed by an OSRM HTTP service.
///
/// Generic over the HTTP client so tests can substitute a mock.
pub struct OsrmRouter<C: HttpClient = ReqwestClient> {
    client: C,
    base_url: String,
}

impl OsrmRouter<ReqwestClient> {
    /// Creates a router against the default public OSRM instance.
    pub fn new() -> Result<Self, RoutingError> {
        Ok(Self::with_client(ReqwestClient::new()?))
    }
}

impl<C: HttpClient> OsrmRouter<C> {
    /// Creates a router with a custom HTTP client against the default host.
    pub fn with_client(client: C) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Creates a router against a custom OSRM host.
    pub fn with_base_url(client: C, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Builds the OSRM `route` query URL.
    ///
    /// OSRM takes coordinates in lon,lat order. `overview=false` skips
    /// geometry generation on ETA-only queries.
    fn build_url(&self, origin: GeoPoint, destination: GeoPoint, with_geometry: bool) -> String {
        let overview = if with_geometry { "full" } else { "false" };
        format!(
            "{}/route/v1/driving/{:.6},{:.6};{:.6},{:.6}?overview={}&geometries=polyline",
            self.base_url, origin.lon, origin.lat, destination.lon, destination.lat, overview
        )
    }

    async fn request_route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        with_geometry: bool,
    ) -> Result<OsrmRoute, RoutingError> {
        let url = self.build_url(origin, destination, with_geometry);
        let body = self.client.get(&url).await?;

        let response: OsrmResponse = serde_json::from_slice(&body)
            .map_err(|e| RoutingError::MalformedResponse(e.to_string()))?;

        if response.code != "Ok" {
            return Err(RoutingError::ServiceError(response.code));
        }

        response.routes.into_iter().next().ok_or(RoutingError::NoRoute {
            origin,
            destination,
        })
    }
}

impl<C: HttpClient> RoutingProvider for OsrmRouter<C> {
    async fn fetch_eta(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Result<RouteEstimate, RoutingError> {
        let route = self.request_route(origin, destination, false).await?;

        debug!(
            origin = %origin,
            destination = %destination,
            duration_secs = ?route.duration,
            "Routing estimate received"
        );

        Ok(RouteEstimate {
            duration_secs: route.duration,
            distance_meters: route.distance,
        })
    }

    async fn fetch_route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Result<Vec<GeoPoint>, RoutingError> {
        let route = self.request_route(origin, destination, true).await?;

        let path = route
            .geometry
            .as_deref()
            .map(polyline::decode)
            .unwrap_or_default();

        if path.is_empty() {
            return Err(RoutingError::MalformedResponse(
                "route geometry missing or undecodable".to_string(),
            ));
        }

        debug!(
            origin = %origin,
            destination = %destination,
            points = path.len(),
            "Route geometry received"
        );

        Ok(path)
    }
}

/// Top-level OSRM response envelope.
#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Clone, Deserialize)]
struct OsrmRoute {
    duration: Option<f64>,
    distance: Option<f64>,
    geometry: Option<String>,
}
