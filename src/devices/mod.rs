//! Device API access.
//!
//! This module wraps the vendor capability the rest of the crate depends on:
//! listing devices and fetching the status of one device. The real adapter
//! talks to the SwitchBot cloud; the fake one is scripted in memory.

pub mod data;
pub mod fake;
pub mod switchbot;
pub mod traits;

// Re-export commonly used items
pub use data::{DeviceRef, DeviceStatus, DeviceType, HUB_MINI};
pub use fake::FakeDeviceClient;
pub use switchbot::SwitchBotClient;
pub use traits::DeviceClient;
