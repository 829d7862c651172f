//! Time-series store used by the scheduled sink.

pub mod influx;
pub mod memory;
pub mod traits;

// Re-export commonly used items
pub use influx::{InfluxConfig, InfluxWriter};
pub use memory::MemoryStore;
pub use traits::{FieldValue, MetricsStore, Point, DEFAULT_MEASUREMENT};
