//! Timer-driven sink: one polling cycle per tick, one store write per reading.

use crate::error::Result;
use crate::metrics::Poller;
use crate::push::config::PushConfig;
use crate::store::{MetricsStore, Point};
use std::sync::Arc;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Periodically polls devices and writes their readings to a store.
pub struct Scheduler {
    poller: Poller,
    store: Arc<dyn MetricsStore>,
    config: PushConfig,
}

impl Scheduler {
    /// Create a scheduler. An invalid [`PushConfig`] is a configuration error.
    pub fn new(poller: Poller, store: Arc<dyn MetricsStore>, config: PushConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            poller,
            store,
            config,
        })
    }

    /// Run a single cycle and write its readings.
    ///
    /// Returns the number of points written. A failed cycle is returned as an
    /// error; a failed write is logged and the remaining readings are still
    /// written.
    pub async fn run_once(&self) -> Result<usize> {
        let metrics = self.poller.run_cycle().await?;

        for failure in &metrics.failures {
            warn!(
                device_id = %failure.device_id,
                device_name = %failure.device_name,
                "Skipping device without status: {}",
                failure.error
            );
        }

        let mut written = 0;
        for reading in &metrics.devices_value {
            let point = Point::from_reading(&self.config.measurement, reading, chrono::Utc::now());
            match self.store.write(&point).await {
                Ok(()) => written += 1,
                Err(e) => error!(
                    device_id = %reading.device_id,
                    device_name = %reading.device_name,
                    error = %e,
                    "Failed to write reading"
                ),
            }
        }
        Ok(written)
    }

    /// Tick until `token` is cancelled.
    ///
    /// The first cycle runs immediately. A cycle already in progress when the
    /// token fires is allowed to finish; no cycle starts afterwards. The store
    /// is closed once on the way out.
    pub async fn run(self, token: CancellationToken) -> Result<()> {
        let mut interval = time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            "Pushing readings every {}s as '{}'",
            self.config.interval.as_secs_f64(),
            self.config.measurement
        );

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = interval.tick() => {}
            }

            match self.run_once().await {
                Ok(written) => debug!(written, "Push cycle complete"),
                Err(e) => error!(error = %e, "Push cycle failed, waiting for next tick"),
            }
        }

        info!("Push scheduler stopped");
        if let Err(e) = self.store.close().await {
            error!(error = %e, "Failed to close metrics store");
        }
        Ok(())
    }
}
