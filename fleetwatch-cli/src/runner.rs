//! CLI runner for setup and daemon lifecycle.
//!
//! Encapsulates config loading, logging initialization, and wiring of the
//! fix source, routing provider, pipeline and daemon.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use fleetwatch::config::FleetwatchConfig;
use fleetwatch::daemon::TrackerDaemon;
use fleetwatch::ingest::{
    FixSource, HttpFixSource, IngestError, RawFix, SyntheticFleet, SyntheticFleetConfig,
};
use fleetwatch::logging::{init_logging, LoggingGuard};
use fleetwatch::routing::{OsrmRouter, ReqwestClient};
use fleetwatch::tracker::EtaPipeline;

use crate::error::CliError;

/// Fix source selected at startup from configuration.
///
/// The [`FixSource`] trait is not dyn-compatible, so runtime selection
/// happens through this enum instead of a boxed trait object.
enum FleetSource {
    Http(HttpFixSource),
    Synthetic(SyntheticFleet),
}

impl FixSource for FleetSource {
    async fn fetch_fleet(&self) -> Result<Vec<RawFix>, IngestError> {
        match self {
            FleetSource::Http(source) => source.fetch_fleet().await,
            FleetSource::Synthetic(source) => source.fetch_fleet().await,
        }
    }
}

/// Runner that manages the CLI lifecycle.
pub struct CliRunner {
    /// Logging guard - keeps logging active while the runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    config: FleetwatchConfig,
}

impl CliRunner {
    /// Creates a runner: loads config (default path or an override) and
    /// initializes logging.
    pub fn new(config_path: Option<&Path>) -> Result<Self, CliError> {
        let config = match config_path {
            Some(path) => FleetwatchConfig::load_from(path)?,
            None => FleetwatchConfig::load()?,
        };

        let logging_guard = init_logging(
            &config.logging.dir,
            &config.logging.file,
            config.logging.stdout,
        )
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// The loaded configuration, for CLI overrides before [`run`].
    ///
    /// [`run`]: CliRunner::run
    pub fn config_mut(&mut self) -> &mut FleetwatchConfig {
        &mut self.config
    }

    /// Builds the source, provider and daemon, then runs until Ctrl-C.
    pub async fn run(self) -> Result<(), CliError> {
        info!("fleetwatch v{}", fleetwatch::VERSION);

        let source = match &self.config.source.endpoint {
            Some(endpoint) => {
                info!(endpoint = %endpoint, "Polling live telemetry endpoint");
                FleetSource::Http(HttpFixSource::new(endpoint.clone())?)
            }
            None => {
                info!(
                    vehicles = self.config.source.synthetic_vehicles,
                    "No telemetry endpoint configured, running the synthetic fleet"
                );
                FleetSource::Synthetic(SyntheticFleet::new(SyntheticFleetConfig {
                    vehicle_count: self.config.source.synthetic_vehicles,
                    destination: self.config.tracker.destination,
                    ..SyntheticFleetConfig::default()
                }))
            }
        };

        let client =
            ReqwestClient::with_timeout(self.config.tracker.provider_timeout.as_secs())?;
        let router = match &self.config.routing.base_url {
            Some(base_url) => OsrmRouter::with_base_url(client, base_url.clone()),
            None => OsrmRouter::with_client(client),
        };

        let pipeline = Arc::new(EtaPipeline::new(router, self.config.tracker.clone()));
        let daemon = TrackerDaemon::new(source, pipeline);
        let cancel = daemon.cancellation_token();

        let handle = daemon.start();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, shutting down");
                cancel.cancel();
            }
            _ = cancel.cancelled() => {}
        }

        // The daemon finishes its in-flight cycle before exiting
        let _ = handle.await;
        Ok(())
    }
}
