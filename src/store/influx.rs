//! InfluxDB v2 writer.

use crate::error::{MetricsError, Result};
use crate::store::traits::{MetricsStore, Point};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info};

const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for an InfluxDB v2 instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfluxConfig {
    /// Base URL, e.g. `http://localhost:8086`
    pub url: String,
    /// API token with write access to the bucket
    pub token: String,
    /// Organization name
    pub org: String,
    /// Destination bucket
    pub bucket: String,
}

impl InfluxConfig {
    pub fn new(
        url: impl Into<String>,
        token: impl Into<String>,
        org: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            org: org.into(),
            bucket: bucket.into(),
        }
    }

    fn write_url(&self) -> String {
        format!("{}/api/v2/write", self.url.trim_end_matches('/'))
    }
}

/// Writes points to InfluxDB, one blocking HTTP request per point.
pub struct InfluxWriter {
    config: InfluxConfig,
    client: reqwest::Client,
    closed: AtomicBool,
}

impl InfluxWriter {
    pub fn new(config: InfluxConfig) -> Result<Self> {
        if config.url.is_empty() || config.bucket.is_empty() || config.org.is_empty() {
            return Err(MetricsError::config_error(
                "InfluxDB url, org and bucket must all be set",
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(WRITE_TIMEOUT)
            .build()
            .map_err(|e| MetricsError::store_error(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            closed: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &InfluxConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl MetricsStore for InfluxWriter {
    async fn write(&self, point: &Point) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(MetricsError::store_error("writer is closed"));
        }

        let line = point.to_line_protocol();
        debug!(%line, "Writing point");

        let response = self
            .client
            .post(self.config.write_url())
            .query(&[
                ("org", self.config.org.as_str()),
                ("bucket", self.config.bucket.as_str()),
                ("precision", "ns"),
            ])
            .header(reqwest::header::AUTHORIZATION, format!("Token {}", self.config.token))
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(line)
            .send()
            .await
            .map_err(|e| MetricsError::store_error(format!("write request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MetricsError::store_error(format!(
                "write rejected with {}: {}",
                status, body
            )));
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!(url = %self.config.url, "Closed InfluxDB writer");
        }
        Ok(())
    }
}
