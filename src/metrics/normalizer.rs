//! Conversion of raw device responses into readings.

use crate::devices::{DeviceRef, DeviceStatus};
use crate::metrics::data::Reading;

/// Merge a device's identity with its status into a [`Reading`].
///
/// Pure and total. Hub-only devices are filtered by the caller, not here.
pub fn normalize(device: &DeviceRef, status: &DeviceStatus) -> Reading {
    Reading {
        device_id: device.id.clone(),
        hub_device_id: device.hub_id.clone(),
        device_name: device.name.clone(),
        device_type: device.device_type.to_string(),
        battery: status.battery,
        humidity: status.humidity,
        temperature: status.temperature,
    }
}
