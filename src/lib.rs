//! # switchbot-metrics
//!
//! Polls SwitchBot sensors through the SwitchBot cloud API and delivers their
//! latest readings either on demand over HTTP or on a fixed schedule to an
//! InfluxDB bucket.
//!
//! ## Features
//!
//! - **Polling cycle**: list devices, skip sensor-less hubs, fetch each status,
//!   merge into a single [`Reading`] shape
//! - **Failure policy**: fail-fast (first failing device fails the cycle) or
//!   fail-soft (collect per-device failures and keep going)
//! - **HTTP sink**: `GET /metrics` runs one cycle per request
//! - **Push sink**: one cycle per tick, one InfluxDB point per reading
//! - **Graceful shutdown**: in-flight work drains within a bounded grace period
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use switchbot_metrics::{lifecycle::shutdown_signal, Lifecycle, Poller, SwitchBotClient, WebConfig, WebServer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SwitchBotClient::new("token", "secret")?;
//!     let poller = Poller::new(Arc::new(client));
//!
//!     let lifecycle = Lifecycle::new(Duration::from_secs(60));
//!     let server = WebServer::bind(WebConfig::default(), poller, &lifecycle).await?;
//!     lifecycle.run(server.serve(), shutdown_signal()).await?;
//!     Ok(())
//! }
//! ```

pub mod devices;
pub mod error;
pub mod lifecycle;
pub mod metrics;
pub mod push;
pub mod store;
pub mod web;

// Re-export public API
pub use devices::{DeviceClient, DeviceRef, DeviceStatus, DeviceType, SwitchBotClient};
pub use error::{CycleError, DeviceError, MetricsError, Result};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use metrics::{normalize, FailurePolicy, Metrics, Poller, Reading};
pub use push::{PushConfig, Scheduler};
pub use store::{InfluxConfig, InfluxWriter, MetricsStore, Point};
pub use web::{WebConfig, WebServer};

/// The default bind address of the web server
pub const DEFAULT_BIND_IP: &str = "127.0.0.1";

/// The default web server port
pub const DEFAULT_WEB_PORT: u16 = 3000;

/// The default interval between scheduled pushes, in seconds
pub const DEFAULT_PUSH_INTERVAL_SECS: u64 = 10;

/// The default grace period for in-flight work at shutdown, in seconds
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 60;
