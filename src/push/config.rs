//! Scheduled push configuration.

use crate::error::{MetricsError, Result};
use crate::store::DEFAULT_MEASUREMENT;
use std::time::Duration;

/// Configuration for the scheduled push sink.
#[derive(Debug, Clone)]
pub struct PushConfig {
    /// Time between two polling cycles
    pub interval: Duration,
    /// Measurement name written for every reading
    pub measurement: String,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(crate::DEFAULT_PUSH_INTERVAL_SECS),
            measurement: DEFAULT_MEASUREMENT.to_string(),
        }
    }
}

impl PushConfig {
    /// Set the polling interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the measurement name.
    pub fn with_measurement(mut self, measurement: impl Into<String>) -> Self {
        self.measurement = measurement.into();
        self
    }

    /// Check the configuration can drive a scheduler.
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(MetricsError::config_error("push interval must be greater than zero"));
        }
        if self.measurement.is_empty() {
            return Err(MetricsError::config_error("measurement name must not be empty"));
        }
        Ok(())
    }
}
