//! Error handling for the SwitchBot metrics crate.

/// A specialized `Result` type for crate-level operations.
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Failure of a single call against the device API.
///
/// The adapter does not try to classify causes (auth, rate limit, network);
/// it hands them to the caller as-is.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// Transport-level failure or non-success HTTP status
    #[error("HTTP request failed: {}", describe_chain(.0))]
    Http(reqwest::Error),

    /// The API answered but reported a failure status code
    #[error("SwitchBot API returned status {code}: {message}")]
    Api { code: i64, message: String },

    /// Network failure not originating from the HTTP client
    #[error("Network error: {0}")]
    Network(String),

    /// Response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The configured API endpoint is not a usable base URL
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    /// Request could not be signed with the configured credentials
    #[error("Failed to sign request: {0}")]
    Signing(String),
}

impl From<reqwest::Error> for DeviceError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err)
    }
}

impl DeviceError {
    /// Create a new network error
    pub fn network_error(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a new invalid URL error
    pub fn invalid_url(msg: impl Into<String>) -> Self {
        Self::InvalidUrl(msg.into())
    }

    /// Create a new decode error
    pub fn decode_error(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}

/// Render an error followed by each of its causes.
///
/// Used where the cause is folded into the message instead of being exposed
/// as `source`, so that `{:#}` chains never print a cause twice.
fn describe_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

/// Reasons a polling cycle produced no batch.
///
/// The message names the failing call and its cause; the cause is not
/// repeated as `source`.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    /// Listing the devices failed, nothing was polled
    #[error("error getting device list: {0}")]
    ListDevices(DeviceError),

    /// A device status fetch failed while running fail-fast
    #[error("fetching device status failed for {device_name} ({device_type}): {cause}")]
    DeviceStatus {
        device_id: String,
        hub_device_id: String,
        device_name: String,
        device_type: String,
        cause: DeviceError,
    },
}

impl CycleError {
    /// Identifier of the device whose fetch failed, if the failure is device-specific.
    pub fn device_id(&self) -> Option<&str> {
        match self {
            Self::ListDevices(_) => None,
            Self::DeviceStatus { device_id, .. } => Some(device_id),
        }
    }
}

/// The main error type for crate operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A polling cycle failed
    #[error(transparent)]
    Cycle(#[from] CycleError),

    /// Writing to the metrics store failed
    #[error("Metrics store error: {0}")]
    Store(String),

    /// Web server error
    #[error("Web server error: {0}")]
    WebServer(String),

    /// A sink task panicked or was aborted
    #[error("Task failed: {0}")]
    Task(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MetricsError {
    /// Create a new metrics store error
    pub fn store_error(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a new web server error
    pub fn web_server_error(msg: impl Into<String>) -> Self {
        Self::WebServer(msg.into())
    }

    /// Create a new task error
    pub fn task_error(msg: impl Into<String>) -> Self {
        Self::Task(msg.into())
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
