//! Traits for device API access.

use crate::devices::data::{DeviceRef, DeviceStatus};
use crate::error::DeviceError;

/// Remote capability for listing devices and fetching their status.
///
/// Implementations are shared by every in-flight cycle, so they must be safe
/// for concurrent use. Both calls may block on the network and fail for any
/// reason; failures are surfaced without interpretation.
#[async_trait::async_trait]
pub trait DeviceClient: Send + Sync {
    /// List all devices, in the order the API reports them.
    async fn list_devices(&self) -> Result<Vec<DeviceRef>, DeviceError>;

    /// Fetch the current status of a single device.
    async fn device_status(&self, device_id: &str) -> Result<DeviceStatus, DeviceError>;
}
