//! Polling cycle: list devices, fetch each status, normalize.

use crate::devices::DeviceClient;
use crate::error::CycleError;
use crate::metrics::data::{DeviceFailure, Metrics};
use crate::metrics::normalizer::normalize;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// What a cycle does when a single device status fetch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Abandon the cycle on the first failing device; no batch is produced.
    #[default]
    FailFast,
    /// Record the failure, keep polling, and return what succeeded.
    FailSoft,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FailFast => f.write_str("fail-fast"),
            Self::FailSoft => f.write_str("fail-soft"),
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fail-fast" | "failfast" => Ok(Self::FailFast),
            "fail-soft" | "failsoft" => Ok(Self::FailSoft),
            other => Err(format!(
                "unknown failure policy '{}', expected 'fail-fast' or 'fail-soft'",
                other
            )),
        }
    }
}

/// Runs polling cycles against a shared device client.
///
/// Cloning is cheap; every clone shares the same client handle.
#[derive(Clone)]
pub struct Poller {
    client: Arc<dyn DeviceClient>,
    policy: FailurePolicy,
}

impl Poller {
    /// Create a poller using the fail-fast policy.
    pub fn new(client: Arc<dyn DeviceClient>) -> Self {
        Self {
            client,
            policy: FailurePolicy::default(),
        }
    }

    /// Set the failure policy.
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn client(&self) -> &Arc<dyn DeviceClient> {
        &self.client
    }

    /// Run one cycle.
    ///
    /// A listing failure always fails the cycle. A status failure fails it
    /// under [`FailurePolicy::FailFast`] and is recorded in
    /// [`Metrics::failures`] under [`FailurePolicy::FailSoft`]. Hub-only
    /// devices are skipped without a status call.
    pub async fn run_cycle(&self) -> Result<Metrics, CycleError> {
        let devices = self.client.list_devices().await.map_err(|e| {
            error!(error = %e, "fetching device list failed!");
            CycleError::ListDevices(e)
        })?;
        debug!(count = devices.len(), "Listed devices");

        let mut metrics = Metrics::new();
        for device in devices.iter().filter(|d| !d.is_hub_only()) {
            match self.client.device_status(&device.id).await {
                Ok(status) => metrics.devices_value.push(normalize(device, &status)),
                Err(e) => {
                    error!(
                        device_id = %device.id,
                        hub_id = %device.hub_id,
                        device_name = %device.name,
                        device_type = %device.device_type,
                        error = %e,
                        "fetching device status failed!"
                    );

                    match self.policy {
                        FailurePolicy::FailFast => {
                            return Err(CycleError::DeviceStatus {
                                device_id: device.id.clone(),
                                hub_device_id: device.hub_id.clone(),
                                device_name: device.name.clone(),
                                device_type: device.device_type.to_string(),
                                cause: e,
                            });
                        }
                        FailurePolicy::FailSoft => metrics.failures.push(DeviceFailure {
                            device_id: device.id.clone(),
                            device_name: device.name.clone(),
                            device_type: device.device_type.to_string(),
                            error: e.to_string(),
                        }),
                    }
                }
            }
        }

        if metrics.is_partial() {
            warn!(
                readings = metrics.len(),
                failures = metrics.failures.len(),
                "Cycle completed with failing devices"
            );
        }

        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{DeviceRef, DeviceStatus, FakeDeviceClient, HUB_MINI};

    fn status(battery: i64) -> DeviceStatus {
        DeviceStatus {
            battery,
            humidity: 50,
            temperature: 20.0,
        }
    }

    fn fake() -> Arc<FakeDeviceClient> {
        Arc::new(
            FakeDeviceClient::new()
                .with_device(DeviceRef::new("A", "H", "Bedroom", "Meter"), status(90))
                .with_device(DeviceRef::new("H", "", "Hub", HUB_MINI), status(0))
                .with_device(DeviceRef::new("C", "H", "Cellar", "MeterPlus"), status(70)),
        )
    }

    #[tokio::test]
    async fn test_cycle_skips_hubs_and_keeps_order() {
        let client = fake();
        let poller = Poller::new(client.clone());

        let metrics = poller.run_cycle().await.unwrap();
        let ids: Vec<_> = metrics.devices_value.iter().map(|r| r.device_id.as_str()).collect();

        assert_eq!(ids, vec!["A", "C"]);
        assert_eq!(client.status_calls(), vec!["A", "C"]);
        assert!(!metrics.is_partial());
    }

    #[tokio::test]
    async fn test_list_failure_fails_cycle() {
        let client = fake();
        client.set_list_fails(true);

        for policy in [FailurePolicy::FailFast, FailurePolicy::FailSoft] {
            let poller = Poller::new(client.clone()).with_policy(policy);
            let err = poller.run_cycle().await.unwrap_err();
            assert!(matches!(err, CycleError::ListDevices(_)));
        }
        assert!(client.status_calls().is_empty());
    }

    #[tokio::test]
    async fn test_fail_fast_stops_at_first_failure() {
        let client = fake();
        client.set_failing("A", true);
        let poller = Poller::new(client.clone());

        let err = poller.run_cycle().await.unwrap_err();
        assert_eq!(err.device_id(), Some("A"));
        assert!(err.to_string().contains("Bedroom (Meter)"));
        // C is never polled
        assert_eq!(client.status_calls(), vec!["A"]);
    }

    #[tokio::test]
    async fn test_fail_soft_collects_failures() {
        let client = fake();
        client.set_failing("A", true);
        let poller = Poller::new(client.clone()).with_policy(FailurePolicy::FailSoft);

        let metrics = poller.run_cycle().await.unwrap();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics.devices_value[0].device_id, "C");
        assert_eq!(metrics.failures.len(), 1);
        assert_eq!(metrics.failures[0].device_id, "A");
        assert!(metrics.failures[0].error.contains("timed out"));
    }

    #[tokio::test]
    async fn test_back_to_back_cycles_are_equal() {
        let poller = Poller::new(fake());
        let first = poller.run_cycle().await.unwrap();
        let second = poller.run_cycle().await.unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("fail-fast".parse::<FailurePolicy>(), Ok(FailurePolicy::FailFast));
        assert_eq!("Fail-Soft".parse::<FailurePolicy>(), Ok(FailurePolicy::FailSoft));
        assert!("sometimes".parse::<FailurePolicy>().is_err());
        assert_eq!(FailurePolicy::FailSoft.to_string(), "fail-soft");
    }
}
