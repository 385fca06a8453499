//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use fleetwatch::config::ConfigError;
use fleetwatch::ingest::IngestError;
use fleetwatch::routing::RoutingError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(ConfigError),
    /// Invalid command-line argument combination
    Args(String),
    /// Failed to build the routing provider
    Provider(RoutingError),
    /// Failed to build the fix source
    Source(IngestError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Config(_) => {
                eprintln!();
                eprintln!("Check the syntax of ~/.fleetwatch/config.ini, or pass");
                eprintln!("--config <path> to load a different file.");
            }
            CliError::Provider(_) => {
                eprintln!();
                eprintln!("If using a self-hosted OSRM instance, make sure:");
                eprintln!("  1. The base URL in [routing] is reachable");
                eprintln!("  2. The instance serves the /route/v1/driving endpoint");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Args(msg) => write!(f, "Invalid arguments: {}", msg),
            CliError::Provider(e) => write!(f, "Failed to create routing provider: {}", e),
            CliError::Source(e) => write!(f, "Failed to create fix source: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Provider(e) => Some(e),
            CliError::Source(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<RoutingError> for CliError {
    fn from(e: RoutingError) -> Self {
        CliError::Provider(e)
    }
}

impl From<IngestError> for CliError {
    fn from(e: IngestError) -> Self {
        CliError::Source(e)
    }
}
