//! Time-series points and the store they are written to.

use crate::error::Result;
use crate::metrics::Reading;
use chrono::{DateTime, Utc};
use std::fmt::Write as _;

/// Default measurement name for device readings.
pub const DEFAULT_MEASUREMENT: &str = "switchbot";

/// Value of a point field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
}

/// One time-series point.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub measurement: String,
    pub tags: Vec<(String, String)>,
    pub fields: Vec<(String, FieldValue)>,
    pub timestamp: DateTime<Utc>,
}

impl Point {
    /// Build the point for a reading: tagged by device name and type,
    /// carrying battery, humidity and temperature.
    pub fn from_reading(measurement: &str, reading: &Reading, timestamp: DateTime<Utc>) -> Self {
        Self {
            measurement: measurement.to_string(),
            tags: vec![
                ("device_name".to_string(), reading.device_name.clone()),
                ("device_type".to_string(), reading.device_type.clone()),
            ],
            fields: vec![
                ("battery".to_string(), FieldValue::Integer(reading.battery)),
                ("humidity".to_string(), FieldValue::Integer(reading.humidity)),
                ("temperature".to_string(), FieldValue::Float(reading.temperature)),
            ],
            timestamp,
        }
    }

    /// Look up a tag value by key.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Look up a field value by key.
    pub fn field(&self, key: &str) -> Option<FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }

    /// Render as an InfluxDB line-protocol record with nanosecond timestamp.
    pub fn to_line_protocol(&self) -> String {
        let mut line = escape(&self.measurement, &[',', ' ']);

        // Empty tag values are not representable in line protocol
        for (key, value) in self.tags.iter().filter(|(_, v)| !v.is_empty()) {
            let _ = write!(
                line,
                ",{}={}",
                escape(key, &[',', '=', ' ']),
                escape(value, &[',', '=', ' '])
            );
        }

        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|(key, value)| {
                let key = escape(key, &[',', '=', ' ']);
                match value {
                    FieldValue::Integer(v) => format!("{}={}i", key, v),
                    FieldValue::Float(v) => format!("{}={}", key, v),
                }
            })
            .collect();
        line.push(' ');
        line.push_str(&fields.join(","));

        if let Some(nanos) = self.timestamp.timestamp_nanos_opt() {
            let _ = write!(line, " {}", nanos);
        }
        line
    }
}

fn escape(raw: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == '\\' || special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Destination for time-series points.
///
/// A single instance is shared by the scheduler for the life of the process.
#[async_trait::async_trait]
pub trait MetricsStore: Send + Sync {
    /// Write one point; resolves once the store has accepted it.
    async fn write(&self, point: &Point) -> Result<()>;

    /// Release the store connection. Called once, at shutdown.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
