//! Ingestion error types

use thiserror::Error;

/// Errors from fleet fix sources.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Transport-level failure reaching the telemetry endpoint
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The endpoint answered with something that is not a device list
    #[error("Malformed fleet payload: {0}")]
    MalformedPayload(String),
}
