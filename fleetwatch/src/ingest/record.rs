//! Wire records and fix normalization
//!
//! Telemetry backends disagree on field naming and typing: the same feed can
//! carry `deviceId` or `device_id`, and coordinates as numbers or strings.
//! Everything loose lives in [`DeviceRecord`]; the rest of the crate only
//! ever sees the strict [`RawFix`] produced by [`DeviceRecord::normalize`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::geo::GeoPoint;
use crate::time;

/// One validated position report from a vehicle.
#[derive(Debug, Clone)]
pub struct RawFix {
    pub vehicle_id: String,
    /// Human-facing label, falls back to the vehicle id when absent upstream
    pub plate_label: String,
    pub position: GeoPoint,
    /// None when the device did not report a usable speed
    pub speed_kmh: Option<f64>,
    pub observed_at: DateTime<Utc>,
}

/// One device entry as telemetry endpoints actually send it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceRecord {
    #[serde(default, alias = "deviceId", alias = "id")]
    pub device_id: Option<String>,

    #[serde(default, alias = "plateNumber", alias = "plate")]
    pub plate_number: Option<String>,

    #[serde(
        default,
        alias = "lat",
        alias = "latitude",
        deserialize_with = "flexible_float"
    )]
    pub last_lat: Option<f64>,

    #[serde(
        default,
        alias = "lng",
        alias = "lon",
        alias = "longitude",
        deserialize_with = "flexible_float"
    )]
    pub last_lon: Option<f64>,

    #[serde(default, alias = "speed", deserialize_with = "flexible_float")]
    pub last_speed: Option<f64>,

    #[serde(default, alias = "lastUpdate", alias = "timestamp")]
    pub last_update: Option<String>,
}

impl DeviceRecord {
    /// Converts the loose record into the strict fix shape.
    ///
    /// Returns None when the record is unusable: blank id, missing or
    /// out-of-range coordinates, or an unparseable timestamp. A bad speed
    /// reading does not reject the fix; it becomes unknown.
    pub fn normalize(&self) -> Option<RawFix> {
        let vehicle_id = self.device_id.as_deref()?.trim();
        if vehicle_id.is_empty() {
            return None;
        }

        let position = GeoPoint::new(self.last_lat?, self.last_lon?).ok()?;
        let observed_at = time::parse_timestamp(self.last_update.as_deref()?)?;

        let speed_kmh = self.last_speed.filter(|s| s.is_finite() && *s >= 0.0);

        let plate_label = match self.plate_number.as_deref().map(str::trim) {
            Some(plate) if !plate.is_empty() => plate.to_string(),
            _ => vehicle_id.to_string(),
        };

        Some(RawFix {
            vehicle_id: vehicle_id.to_string(),
            plate_label,
            position,
            speed_kmh,
            observed_at,
        })
    }
}

/// Accepts a JSON number, a numeric string, or null.
fn flexible_float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flexible {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<Flexible>::deserialize(deserializer)? {
        None => None,
        Some(Flexible::Number(n)) => Some(n),
        Some(Flexible::Text(s)) => s.trim().parse().ok(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_snake_case_record() {
        let record: DeviceRecord = serde_json::from_str(
            r#"{
                "device_id": "RAC-440",
                "plate_number": "RAC 440 B",
                "last_lat": -1.9441,
                "last_lon": 30.0619,
                "last_speed": 40.0,
                "last_update": "2024-05-04T08:00:00Z"
            }"#,
        )
        .unwrap();

        let fix = record.normalize().unwrap();
        assert_eq!(fix.vehicle_id, "RAC-440");
        assert_eq!(fix.plate_label, "RAC 440 B");
        assert_eq!(fix.position.lat, -1.9441);
        assert_eq!(fix.speed_kmh, Some(40.0));
    }

    #[test]
    fn test_parse_camel_case_aliases() {
        let record: DeviceRecord = serde_json::from_str(
            r#"{
                "deviceId": "RAC-441",
                "plateNumber": "RAC 441 C",
                "lat": "-1.9520",
                "lng": "30.0700",
                "speed": "38.5",
                "lastUpdate": "2024-05-04 08:00:00"
            }"#,
        )
        .unwrap();

        let fix = record.normalize().unwrap();
        assert_eq!(fix.vehicle_id, "RAC-441");
        assert_eq!(fix.position.lon, 30.07);
        assert_eq!(fix.speed_kmh, Some(38.5));
    }

    #[test]
    fn test_missing_coordinates_rejected() {
        let record: DeviceRecord = serde_json::from_str(
            r#"{"device_id": "X", "last_update": "2024-05-04T08:00:00Z"}"#,
        )
        .unwrap();
        assert!(record.normalize().is_none());
    }

    #[test]
    fn test_out_of_range_coordinates_rejected() {
        let record: DeviceRecord = serde_json::from_str(
            r#"{
                "device_id": "X",
                "last_lat": 120.0,
                "last_lon": 30.0,
                "last_update": "2024-05-04T08:00:00Z"
            }"#,
        )
        .unwrap();
        assert!(record.normalize().is_none());
    }

    #[test]
    fn test_unparseable_coordinate_string_rejected() {
        let record: DeviceRecord = serde_json::from_str(
            r#"{
                "device_id": "X",
                "last_lat": "not-a-number",
                "last_lon": 30.0,
                "last_update": "2024-05-04T08:00:00Z"
            }"#,
        )
        .unwrap();
        assert!(record.normalize().is_none());
    }

    #[test]
    fn test_bad_timestamp_rejected() {
        let record: DeviceRecord = serde_json::from_str(
            r#"{
                "device_id": "X",
                "last_lat": -1.9441,
                "last_lon": 30.0619,
                "last_update": "five minutes ago"
            }"#,
        )
        .unwrap();
        assert!(record.normalize().is_none());
    }

    #[test]
    fn test_negative_speed_becomes_unknown() {
        let record: DeviceRecord = serde_json::from_str(
            r#"{
                "device_id": "X",
                "last_lat": -1.9441,
                "last_lon": 30.0619,
                "last_speed": -3.0,
                "last_update": "2024-05-04T08:00:00Z"
            }"#,
        )
        .unwrap();

        let fix = record.normalize().unwrap();
        assert_eq!(fix.speed_kmh, None);
    }

    #[test]
    fn test_missing_plate_falls_back_to_id() {
        let record: DeviceRecord = serde_json::from_str(
            r#"{
                "device_id": "RAC-442",
                "last_lat": -1.9441,
                "last_lon": 30.0619,
                "last_update": "2024-05-04T08:00:00Z"
            }"#,
        )
        .unwrap();

        assert_eq!(record.normalize().unwrap().plate_label, "RAC-442");
    }

    #[test]
    fn test_blank_id_rejected() {
        let record: DeviceRecord = serde_json::from_str(
            r#"{
                "device_id": "   ",
                "last_lat": -1.9441,
                "last_lon": 30.0619,
                "last_update": "2024-05-04T08:00:00Z"
            }"#,
        )
        .unwrap();
        assert!(record.normalize().is_none());
    }
}
