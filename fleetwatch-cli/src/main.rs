//! Fleetwatch CLI - fleet tracking daemon
//!
//! This binary wires the fleetwatch library into a long-running daemon:
//! it polls a fix source, tracks every vehicle against the configured
//! destination, and broadcasts smoothed ETA payloads.

use std::path::PathBuf;

use clap::Parser;

use fleetwatch::geo::GeoPoint;

mod error;
mod runner;

use error::CliError;
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "fleetwatch")]
#[command(about = "Track a vehicle fleet and broadcast smoothed ETAs", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the config file (default: ~/.fleetwatch/config.ini)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Telemetry endpoint returning a JSON array of device records
    #[arg(long)]
    endpoint: Option<String>,

    /// Run a synthetic fleet of this many vehicles instead of polling
    #[arg(long, conflicts_with = "endpoint")]
    synthetic: Option<usize>,

    /// Destination latitude in decimal degrees
    #[arg(long, requires = "dest_lon")]
    dest_lat: Option<f64>,

    /// Destination longitude in decimal degrees
    #[arg(long, requires = "dest_lat")]
    dest_lon: Option<f64>,

    /// OSRM base URL (default: the public demo instance)
    #[arg(long)]
    osrm_url: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let mut runner = match CliRunner::new(args.config.as_deref()) {
        Ok(runner) => runner,
        Err(e) => e.exit(),
    };

    // Command-line flags override the config file
    let config = runner.config_mut();
    if let Some(endpoint) = args.endpoint {
        config.source.endpoint = Some(endpoint);
    }
    if let Some(vehicles) = args.synthetic {
        config.source.endpoint = None;
        config.source.synthetic_vehicles = vehicles.max(1);
    }
    if let (Some(lat), Some(lon)) = (args.dest_lat, args.dest_lon) {
        match GeoPoint::new(lat, lon) {
            Ok(point) => config.tracker.destination = point,
            Err(e) => CliError::Args(e.to_string()).exit(),
        }
    }
    if let Some(url) = args.osrm_url {
        config.routing.base_url = Some(url);
    }

    if let Err(e) = runner.run().await {
        e.exit();
    }
}
