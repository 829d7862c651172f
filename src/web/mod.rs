//! On-demand HTTP sink.
//!
//! Every `GET /metrics` runs its own polling cycle against the shared device
//! client; concurrent requests are not coalesced. `GET /` answers a liveness
//! check and `GET /monitoring` shows process statistics.

pub mod config;
pub mod handlers;
pub mod monitoring;
pub mod router;

// Re-export commonly used items
pub use config::WebConfig;
pub use handlers::AppState;
pub use router::create_app;

use crate::error::{MetricsError, Result};
use crate::lifecycle::Lifecycle;
use crate::metrics::Poller;
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// A web server whose listener is already bound.
///
/// Binding happens during startup so that an unusable address is a fatal
/// startup error rather than a failure of the running sink.
pub struct WebServer {
    listener: TcpListener,
    app: Router,
    token: CancellationToken,
}

impl WebServer {
    /// Bind the listener and build the application.
    pub async fn bind(config: WebConfig, poller: Poller, lifecycle: &Lifecycle) -> Result<Self> {
        let addr = config
            .bind_address()
            .parse::<SocketAddr>()
            .map_err(|e| MetricsError::config_error(format!("Invalid bind address: {}", e)))?;

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| MetricsError::web_server_error(format!("Failed to bind to address: {}", e)))?;

        let state = AppState::new(poller, lifecycle.token(), lifecycle.tracker(), config);
        Ok(Self {
            listener,
            app: create_app(state),
            token: lifecycle.token(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until the lifecycle token is cancelled, then let open requests finish.
    pub async fn serve(self) -> Result<()> {
        let addr = self.local_addr()?;
        info!("Starting switchbot-metrics web server on http://{}", addr);
        info!("Metrics endpoint: http://{}/metrics", addr);
        info!("Monitoring page: http://{}/monitoring", addr);

        let token = self.token;
        axum::serve(self.listener, self.app)
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await
            .map_err(|e| MetricsError::web_server_error(format!("Server error: {}", e)))?;

        info!("Web server stopped");
        Ok(())
    }
}
