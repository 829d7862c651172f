//! Device readings and the polling cycle.
//!
//! This module turns the raw answers of the device API into the canonical
//! [`Reading`] shape and drives one polling cycle across all devices.

pub mod collector;
pub mod data;
pub mod normalizer;

// Re-export commonly used items
pub use collector::{FailurePolicy, Poller};
pub use data::{DeviceFailure, Metrics, Reading};
pub use normalizer::normalize;
