//! Spherical geodesy module
//!
//! Distance, bearing and forward projection between geographic points on a
//! spherical Earth model. These back the arrival classifier, the refresh
//! policy's movement checks and trajectory prediction.

mod types;

pub use types::{GeoError, GeoPoint, EARTH_RADIUS_M, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

/// Great-circle distance between two points in meters.
///
/// # Arguments
///
/// * `a` - Start point in decimal degrees
/// * `b` - End point in decimal degrees
///
/// # Returns
///
/// Haversine distance over a sphere of radius 6 371 000 m.
#[inline]
pub fn haversine_distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Initial great-circle bearing from one point toward another.
///
/// Returned in degrees, normalized to [0, 360) with 0 = north, 90 = east.
#[inline]
pub fn initial_bearing_deg(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat_a = from.lat.to_radians();
    let lat_b = to.lat.to_radians();
    let d_lon = (to.lon - from.lon).to_radians();

    let y = d_lon.sin() * lat_b.cos();
    let x = lat_a.cos() * lat_b.sin() - lat_a.sin() * lat_b.cos() * d_lon.cos();

    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Projects a point forward along a bearing.
///
/// Computes the destination reached by travelling `distance_m` meters from
/// `start` on the initial bearing `bearing_deg`.
#[inline]
pub fn project_position(start: GeoPoint, bearing_deg: f64, distance_m: f64) -> GeoPoint {
    let lat = start.lat.to_radians();
    let lon = start.lon.to_radians();
    let bearing = bearing_deg.to_radians();
    let angular = distance_m / EARTH_RADIUS_M;

    let dest_lat = (lat.sin() * angular.cos() + lat.cos() * angular.sin() * bearing.cos()).asin();
    let dest_lon = lon
        + (bearing.sin() * angular.sin() * lat.cos())
            .atan2(angular.cos() - lat.sin() * dest_lat.sin());

    // Wrap longitude back into [-180, 180)
    let lon_deg = (dest_lon.to_degrees() + 540.0) % 360.0 - 180.0;

    GeoPoint {
        lat: dest_lat.to_degrees(),
        lon: lon_deg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_known_city_pair() {
        // Kigali city center to Kanombe, roughly 4.05 km apart
        let a = GeoPoint::new(-1.9441, 30.0619).unwrap();
        let b = GeoPoint::new(-1.9684, 30.0891).unwrap();

        let d = haversine_distance_m(a, b);
        assert!(
            (4000.0..4120.0).contains(&d),
            "Distance should be about 4.05 km, got {} m",
            d
        );
    }

    #[test]
    fn test_haversine_zero_distance() {
        let p = GeoPoint::new(51.5074, -0.1278).unwrap();
        assert!(haversine_distance_m(p, p).abs() < 1e-9);
    }

    #[test]
    fn test_haversine_symmetric() {
        let a = GeoPoint::new(40.7128, -74.0060).unwrap();
        let b = GeoPoint::new(34.0522, -118.2437).unwrap();

        let ab = haversine_distance_m(a, b);
        let ba = haversine_distance_m(b, a);
        assert!((ab - ba).abs() < 1e-6);
        // NYC to LA is close to 3 936 km
        assert!((ab - 3_936_000.0).abs() < 10_000.0);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = GeoPoint::new(0.0, 0.0).unwrap();

        let north = initial_bearing_deg(origin, GeoPoint::new(1.0, 0.0).unwrap());
        let east = initial_bearing_deg(origin, GeoPoint::new(0.0, 1.0).unwrap());
        let south = initial_bearing_deg(origin, GeoPoint::new(-1.0, 0.0).unwrap());
        let west = initial_bearing_deg(origin, GeoPoint::new(0.0, -1.0).unwrap());

        assert!((north - 0.0).abs() < 1e-6);
        assert!((east - 90.0).abs() < 1e-6);
        assert!((south - 180.0).abs() < 1e-6);
        assert!((west - 270.0).abs() < 1e-6);
    }

    #[test]
    fn test_bearing_always_in_range() {
        let a = GeoPoint::new(-1.9441, 30.0619).unwrap();
        let b = GeoPoint::new(-1.9684, 30.0891).unwrap();

        let bearing = initial_bearing_deg(a, b);
        assert!((0.0..360.0).contains(&bearing));
        // Southeast-ish heading
        assert!(
            (128.0..136.0).contains(&bearing),
            "Expected a southeast bearing, got {}",
            bearing
        );
    }

    #[test]
    fn test_project_position_north_one_degree() {
        let start = GeoPoint::new(0.0, 0.0).unwrap();
        // One degree of latitude along a meridian
        let one_degree_m = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

        let dest = project_position(start, 0.0, one_degree_m);
        assert!((dest.lat - 1.0).abs() < 1e-6);
        assert!(dest.lon.abs() < 1e-6);
    }

    #[test]
    fn test_project_position_roundtrip_distance() {
        let start = GeoPoint::new(-1.9441, 30.0619).unwrap();

        let dest = project_position(start, 132.0, 500.0);
        let back = haversine_distance_m(start, dest);
        assert!(
            (back - 500.0).abs() < 0.5,
            "Projected distance should match input, got {} m",
            back
        );
    }

    #[test]
    fn test_geo_point_validation() {
        assert!(GeoPoint::new(90.1, 0.0).is_err());
        assert!(GeoPoint::new(-90.1, 0.0).is_err());
        assert!(GeoPoint::new(0.0, 180.1).is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::new(0.0, f64::NAN).is_err());
        assert!(matches!(
            GeoPoint::new(91.0, 0.0).unwrap_err(),
            GeoError::InvalidLatitude(_)
        ));
    }
}
