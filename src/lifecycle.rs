//! Process lifecycle: start a sink, wait for a shutdown signal, drain in-flight work.

use crate::error::{MetricsError, Result};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

/// Lifecycle states, in the only order they can occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum LifecycleState {
    Starting,
    Running,
    ShuttingDown,
    Stopped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::ShuttingDown => "shutting down",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Owns the cancellation token and task tracker shared by every unit of work.
///
/// Sinks receive [`Lifecycle::token`] to learn when to stop accepting work and
/// spawn in-flight work on [`Lifecycle::tracker`] so shutdown can wait for it.
pub struct Lifecycle {
    state: watch::Sender<LifecycleState>,
    token: CancellationToken,
    tracker: TaskTracker,
    grace_period: Duration,
}

impl Lifecycle {
    pub fn new(grace_period: Duration) -> Self {
        let (state, _) = watch::channel(LifecycleState::Starting);
        Self {
            state,
            token: CancellationToken::new(),
            tracker: TaskTracker::new(),
            grace_period,
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Receive every state transition.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn tracker(&self) -> TaskTracker {
        self.tracker.clone()
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    fn transition(&self, next: LifecycleState) {
        info!("Lifecycle: {} -> {}", self.state(), next);
        self.state.send_replace(next);
    }

    /// Run `sink` until `shutdown` resolves or the sink exits on its own.
    ///
    /// On shutdown the token is cancelled and in-flight tracked work is given
    /// the grace period to finish. Work still running after that is abandoned.
    /// An error returned by the sink, or a panic inside it, is returned after
    /// the drain.
    pub async fn run<S, F>(self, sink: S, shutdown: F) -> Result<()>
    where
        S: Future<Output = Result<()>> + Send + 'static,
        F: Future<Output = ()>,
    {
        self.transition(LifecycleState::Running);
        let mut sink = self.tracker.spawn(sink);

        let outcome = tokio::select! {
            joined = &mut sink => match joined {
                Ok(result) => {
                    if let Err(e) = &result {
                        error!(error = %e, "Sink stopped with an error");
                    } else {
                        warn!("Sink stopped before shutdown was requested");
                    }
                    result
                }
                Err(e) => {
                    error!(error = %e, "Sink task panicked");
                    Err(MetricsError::task_error(format!("sink stopped abnormally: {}", e)))
                }
            },
            _ = shutdown => {
                info!("Shutdown requested");
                Ok(())
            }
        };

        self.transition(LifecycleState::ShuttingDown);
        self.token.cancel();
        self.tracker.close();

        if tokio::time::timeout(self.grace_period, self.tracker.wait())
            .await
            .is_err()
        {
            warn!(
                in_flight = self.tracker.len(),
                "Grace period of {}s elapsed, abandoning in-flight work",
                self.grace_period.as_secs_f64()
            );
        }

        self.transition(LifecycleState::Stopped);
        outcome
    }
}

/// Resolve on Ctrl+C, or on SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
