//! HTTP fleet telemetry source

use tracing::{debug, warn};

use super::error::IngestError;
use super::record::{DeviceRecord, RawFix};
use super::FixSource;

/// Default request timeout for the telemetry endpoint.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

const USER_AGENT: &str = concat!("fleetwatch/", env!("CARGO_PKG_VERSION"));

/// Polls a telemetry HTTP endpoint that returns a JSON array of device
/// records, one entry per vehicle.
pub struct HttpFixSource {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpFixSource {
    /// Creates a source for `endpoint` with the default timeout.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, IngestError> {
        Self::with_timeout(endpoint, DEFAULT_FETCH_TIMEOUT_SECS)
    }

    /// Creates a source with a custom timeout in seconds.
    pub fn with_timeout(endpoint: impl Into<String>, timeout_secs: u64) -> Result<Self, IngestError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| IngestError::HttpError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

impl FixSource for HttpFixSource {
    async fn fetch_fleet(&self) -> Result<Vec<RawFix>, IngestError> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| IngestError::HttpError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(IngestError::HttpError(format!(
                "HTTP {} from {}",
                response.status(),
                self.endpoint
            )));
        }

        let records: Vec<DeviceRecord> = response
            .json()
            .await
            .map_err(|e| IngestError::MalformedPayload(e.to_string()))?;

        let total = records.len();
        let mut fixes = Vec::with_capacity(total);
        for record in records {
            match record.normalize() {
                Some(fix) => fixes.push(fix),
                None => debug!(record = ?record, "Skipping unusable device record"),
            }
        }

        if fixes.len() < total {
            warn!(
                dropped = total - fixes.len(),
                total = total,
                "Dropped unusable device records from fleet payload"
            );
        }

        Ok(fixes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_construction() {
        let source = HttpFixSource::new("https://fleet.test/devices");
        assert!(source.is_ok());
    }

    #[test]
    fn test_fleet_payload_normalization_drops_bad_entries() {
        // Same filtering fetch_fleet applies, without the network layer
        let records: Vec<DeviceRecord> = serde_json::from_str(
            r#"[
                {
                    "device_id": "RAC-440",
                    "last_lat": -1.9441,
                    "last_lon": 30.0619,
                    "last_speed": 40,
                    "last_update": "2024-05-04T08:00:00Z"
                },
                {
                    "device_id": "RAC-441",
                    "last_lat": null,
                    "last_lon": 30.0700,
                    "last_update": "2024-05-04T08:00:00Z"
                },
                {
                    "deviceId": "RAC-442",
                    "lat": "-1.9520",
                    "lng": "30.0700",
                    "lastUpdate": "2024-05-04 08:00:10"
                }
            ]"#,
        )
        .unwrap();

        let fixes: Vec<_> = records.iter().filter_map(DeviceRecord::normalize).collect();
        assert_eq!(fixes.len(), 2);
        assert_eq!(fixes[0].vehicle_id, "RAC-440");
        assert_eq!(fixes[1].vehicle_id, "RAC-442");
    }
}
