//! Scheduled delivery of readings to a time-series store.

pub mod config;
pub mod scheduler;

// Re-export commonly used items
pub use config::PushConfig;
pub use scheduler::Scheduler;
