//! Data structures for device readings.

use serde::{Deserialize, Serialize};

/// Canonical reading of one device: identity merged with its sensor payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    /// Device identifier
    pub device_id: String,
    /// Identifier of the hub the device reports through
    pub hub_device_id: String,
    /// User-assigned device name
    pub device_name: String,
    /// Device classification (e.g., "Meter")
    pub device_type: String,
    /// Battery level in percent
    pub battery: i64,
    /// Relative humidity in percent
    pub humidity: i64,
    /// Temperature in Celsius
    pub temperature: f64,
}

/// A device whose status fetch failed during a fail-soft cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceFailure {
    pub device_id: String,
    pub device_name: String,
    pub device_type: String,
    /// Human-readable cause
    pub error: String,
}

/// Output of one polling cycle.
///
/// Readings follow the order in which devices were listed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Successful readings
    pub devices_value: Vec<Reading>,
    /// Per-device failures, only ever filled under the fail-soft policy
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<DeviceFailure>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.devices_value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices_value.is_empty()
    }

    /// Whether some devices could not be read.
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}
