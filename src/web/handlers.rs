//! HTTP handlers for API endpoints.

use crate::metrics::Poller;
use crate::web::config::WebConfig;
use crate::web::monitoring::{render_page, ProcessMonitor};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Json, Response},
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::error;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub poller: Poller,
    pub token: CancellationToken,
    pub tracker: TaskTracker,
    pub monitor: Arc<Mutex<ProcessMonitor>>,
    pub config: Arc<WebConfig>,
    cycles: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(
        poller: Poller,
        token: CancellationToken,
        tracker: TaskTracker,
        config: WebConfig,
    ) -> Self {
        Self {
            poller,
            token,
            tracker,
            monitor: Arc::new(Mutex::new(ProcessMonitor::new())),
            config: Arc::new(config),
            cycles: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of `/metrics` cycles currently running.
    pub fn cycles_in_flight(&self) -> usize {
        self.cycles.load(Ordering::SeqCst)
    }
}

/// Counts one running cycle until dropped.
struct CycleGuard(Arc<AtomicUsize>);

impl CycleGuard {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Liveness check.
pub async fn pong() -> &'static str {
    "Pong!"
}

/// Run one polling cycle and return its readings.
///
/// The cycle runs on the shared task tracker so a shutdown waits for it.
/// Once shutdown has started, new requests are refused.
pub async fn get_metrics(State(state): State<AppState>) -> Response {
    if state.token.is_cancelled() {
        return (StatusCode::SERVICE_UNAVAILABLE, "shutting down").into_response();
    }

    let poller = state.poller.clone();
    let guard = CycleGuard::enter(&state.cycles);
    let cycle = state.tracker.spawn(async move {
        let _guard = guard;
        poller.run_cycle().await
    });

    match cycle.await {
        Ok(Ok(metrics)) => Json(metrics).into_response(),
        Ok(Err(e)) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response(),
        Err(e) => {
            error!(error = %e, "Metrics cycle task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics cycle aborted").into_response()
        }
    }
}

/// Monitoring page, or its statistics when JSON is requested.
pub async fn monitoring(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let wants_json = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));

    if !wants_json {
        return Html(render_page(&state.config.monitoring_title)).into_response();
    }

    // Sampling refreshes every process, keep it off the async workers
    let monitor = state.monitor.clone();
    let in_flight = state.cycles_in_flight();
    let stats = tokio::task::spawn_blocking(move || monitor.blocking_lock().sample(in_flight)).await;

    match stats {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to sample process statistics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
