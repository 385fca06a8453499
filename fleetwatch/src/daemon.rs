//! Tracking cycle daemon
//!
//! The [`TrackerDaemon`] drives the whole fleet on a fixed interval: fetch
//! the latest fixes, run every vehicle through the pipeline with bounded
//! concurrency, then publish a fleet snapshot. Cycles are strictly
//! serialized: the next tick is not consumed until the previous cycle's
//! fan-out has completed, so no vehicle ever has two cycles in flight.
//!
//! Whole-fleet fetch failures skip the cycle and back off exponentially;
//! the previous snapshot remains authoritative until the next success.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::ingest::{FixSource, IngestError};
use crate::routing::RoutingProvider;
use crate::tracker::{EtaPipeline, FleetSnapshot};

/// Maximum backoff after repeated source failures.
const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Broadcast buffer size for fleet snapshots.
const SNAPSHOT_CHANNEL_CAPACITY: usize = 16;

/// Periodic driver for the tracking pipeline.
pub struct TrackerDaemon<S: FixSource, P: RoutingProvider> {
    source: S,
    pipeline: Arc<EtaPipeline<P>>,
    snapshot_tx: broadcast::Sender<FleetSnapshot>,
    cancel: CancellationToken,
}

impl<S, P> TrackerDaemon<S, P>
where
    S: FixSource + 'static,
    P: RoutingProvider + 'static,
{
    pub fn new(source: S, pipeline: Arc<EtaPipeline<P>>) -> Self {
        let (snapshot_tx, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Self {
            source,
            pipeline,
            snapshot_tx,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops the run loop when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Subscribes to the per-cycle fleet snapshots.
    pub fn subscribe_snapshots(&self) -> broadcast::Receiver<FleetSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// The pipeline this daemon drives.
    pub fn pipeline(&self) -> &Arc<EtaPipeline<P>> {
        &self.pipeline
    }

    /// Starts the daemon as an async task.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Runs the cycle loop until cancelled.
    pub async fn run(self) {
        let config = self.pipeline.config();
        info!(
            poll_interval_secs = config.poll_interval.as_secs(),
            destination = %config.destination,
            "Fleet tracking daemon started"
        );

        let mut interval = tokio::time::interval(config.poll_interval);
        // Cycles serialize; a slow cycle delays the next tick instead of
        // bursting to catch up
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut consecutive_failures: u32 = 0;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            if consecutive_failures > 0 {
                let backoff = calculate_backoff(consecutive_failures);
                debug!(
                    backoff_secs = backoff.as_secs(),
                    consecutive_failures,
                    "Backing off after fleet fetch failures"
                );
                tokio::select! {
                    _ = self.cancel.cancelled() => break,
                    _ = tokio::time::sleep(backoff) => {}
                }
            }

            match self.run_cycle().await {
                Ok(emitted) => {
                    consecutive_failures = 0;
                    debug!(vehicles = emitted, "Tracking cycle complete");
                }
                Err(e) => {
                    consecutive_failures += 1;
                    warn!(
                        error = %e,
                        consecutive_failures,
                        "Fleet fetch failed, skipping cycle"
                    );
                }
            }
        }

        let stats = self.pipeline.stats();
        info!(
            fixes_processed = stats.fixes_processed,
            eta_refreshes = stats.eta_refreshes,
            provider_failures = stats.provider_failures,
            "Fleet tracking daemon stopped"
        );
    }

    /// One full fleet cycle: fetch, fan out, snapshot.
    async fn run_cycle(&self) -> Result<usize, IngestError> {
        let fixes = self.source.fetch_fleet().await?;
        let now = Utc::now();

        let emitted = stream::iter(fixes)
            .map(|fix| {
                let pipeline = Arc::clone(&self.pipeline);
                async move { pipeline.process_fix(&fix, now).await }
            })
            .buffer_unordered(self.pipeline.config().max_concurrent_refreshes)
            .filter(|payload| std::future::ready(payload.is_some()))
            .count()
            .await;

        let _ = self.snapshot_tx.send(self.pipeline.snapshot(now));
        Ok(emitted)
    }
}

/// Exponential backoff: 2^n seconds, capped.
fn calculate_backoff(consecutive_failures: u32) -> Duration {
    let secs = 2u64.saturating_pow(consecutive_failures.min(20));
    Duration::from_secs(secs).min(MAX_BACKOFF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_backoff() {
        assert_eq!(calculate_backoff(0), Duration::from_secs(1));
        assert_eq!(calculate_backoff(1), Duration::from_secs(2));
        assert_eq!(calculate_backoff(3), Duration::from_secs(8));
        assert_eq!(calculate_backoff(12), MAX_BACKOFF);
    }
}
