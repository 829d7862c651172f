//! Scripted in-memory device client used in tests and benchmarks.

use crate::devices::data::{DeviceRef, DeviceStatus};
use crate::devices::traits::DeviceClient;
use crate::error::DeviceError;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Minimal fake device API.
///
/// Device population and failures can be changed between calls, which lets
/// tests script one failing cycle followed by a healthy one.
#[derive(Default)]
pub struct FakeDeviceClient {
    devices: Mutex<Vec<DeviceRef>>,
    statuses: Mutex<HashMap<String, DeviceStatus>>,
    failing: Mutex<HashSet<String>>,
    list_fails: AtomicBool,
    delay: Mutex<Option<Duration>>,
    status_calls: Mutex<Vec<String>>,
    list_calls: AtomicUsize,
}

impl FakeDeviceClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device and the status it reports.
    pub fn with_device(self, device: DeviceRef, status: DeviceStatus) -> Self {
        self.add_device(device, status);
        self
    }

    /// Add a device whose status is never requested successfully.
    pub fn with_failing_device(self, device: DeviceRef) -> Self {
        self.set_failing(&device.id, true);
        self.lock_devices().push(device);
        self
    }

    /// Delay every remote call by `delay`.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap_or_else(|e| e.into_inner()) = Some(delay);
        self
    }

    pub fn add_device(&self, device: DeviceRef, status: DeviceStatus) {
        self.statuses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(device.id.clone(), status);
        self.lock_devices().push(device);
    }

    pub fn set_status(&self, device_id: &str, status: DeviceStatus) {
        self.statuses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(device_id.to_string(), status);
    }

    pub fn set_failing(&self, device_id: &str, failing: bool) {
        let mut set = self.failing.lock().unwrap_or_else(|e| e.into_inner());
        if failing {
            set.insert(device_id.to_string());
        } else {
            set.remove(device_id);
        }
    }

    pub fn set_list_fails(&self, fails: bool) {
        self.list_fails.store(fails, Ordering::SeqCst);
    }

    /// Device ids passed to `device_status`, in call order.
    pub fn status_calls(&self) -> Vec<String> {
        self.status_calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn lock_devices(&self) -> std::sync::MutexGuard<'_, Vec<DeviceRef>> {
        self.devices.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn pause(&self) {
        let delay = *self.delay.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait::async_trait]
impl DeviceClient for FakeDeviceClient {
    async fn list_devices(&self) -> Result<Vec<DeviceRef>, DeviceError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        if self.list_fails.load(Ordering::SeqCst) {
            return Err(DeviceError::network_error("device listing unavailable"));
        }
        Ok(self.lock_devices().clone())
    }

    async fn device_status(&self, device_id: &str) -> Result<DeviceStatus, DeviceError> {
        self.status_calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(device_id.to_string());
        self.pause().await;

        if self
            .failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(device_id)
        {
            return Err(DeviceError::network_error(format!(
                "connection to device {} timed out",
                device_id
            )));
        }

        self.statuses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(device_id)
            .copied()
            .ok_or_else(|| DeviceError::Api {
                code: 152,
                message: format!("device {} not found", device_id),
            })
    }
}
