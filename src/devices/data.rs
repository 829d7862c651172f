//! Data structures returned by the device API.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Device type reported by sensor-less hubs.
pub const HUB_MINI: &str = "Hub Mini";

/// Classification of a physical device, as reported by the vendor API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceType(pub String);

impl DeviceType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this device reports no sensor payload and must not produce a reading.
    pub fn is_hub_only(&self) -> bool {
        self.0 == HUB_MINI
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Identity and classification of a device, obtained from a device listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRef {
    /// Unique device identifier
    pub id: String,
    /// Identifier of the hub the device reports through (empty when none)
    pub hub_id: String,
    /// User-assigned device name
    pub name: String,
    /// Device classification (e.g., "Meter", "Hub Mini")
    pub device_type: DeviceType,
}

impl DeviceRef {
    pub fn new(
        id: impl Into<String>,
        hub_id: impl Into<String>,
        name: impl Into<String>,
        device_type: impl Into<DeviceType>,
    ) -> Self {
        Self {
            id: id.into(),
            hub_id: hub_id.into(),
            name: name.into(),
            device_type: device_type.into(),
        }
    }

    pub fn is_hub_only(&self) -> bool {
        self.device_type.is_hub_only()
    }
}

/// Raw sensor payload of a single status fetch.
///
/// Device types without a given sensor leave the field at zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// Battery level in percent
    #[serde(default)]
    pub battery: i64,
    /// Relative humidity in percent
    #[serde(default)]
    pub humidity: i64,
    /// Temperature in Celsius
    #[serde(default)]
    pub temperature: f64,
}
