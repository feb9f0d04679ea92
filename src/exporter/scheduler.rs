//! Fixed-delay background scheduler.
//!
//! One Tokio task sleeps for the interval, runs the job, and repeats, so
//! successive runs never overlap. Stopping is cooperative: a run already in
//! progress completes before the task exits.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::collector::Schedulable;

/// Default timeout for graceful shutdown (5 seconds).
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to a running fixed-delay job.
pub struct FixedDelayScheduler {
    name: String,
    interval: Duration,
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl FixedDelayScheduler {
    /// Spawn `job`, first run after one `interval`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(job: Arc<dyn Schedulable>, interval: Duration) -> Self {
        let name = job.name().to_string();
        let (stop, mut stop_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = stop_rx.changed() => break,
                }
                job.run().await;
            }
            tracing::debug!(job = %job.name(), "Scheduled job stopped");
        });

        tracing::info!(job = %name, interval = ?interval, "Scheduled job started");
        Self {
            name,
            interval,
            stop,
            handle,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the job task has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop the job with the default timeout.
    pub async fn shutdown(self) -> Result<(), String> {
        self.shutdown_with_timeout(DEFAULT_SHUTDOWN_TIMEOUT).await
    }

    /// Signal the job to stop and wait up to `timeout` for it to exit.
    ///
    /// On timeout the task is left to finish its current run on its own.
    pub async fn shutdown_with_timeout(self, timeout: Duration) -> Result<(), String> {
        // Receiver already gone means the task has exited.
        let _ = self.stop.send(true);

        match tokio::time::timeout(timeout, self.handle).await {
            Ok(Ok(())) => {
                tracing::info!(job = %self.name, "Scheduled job shutdown complete");
                Ok(())
            }
            Ok(Err(e)) => {
                tracing::error!(job = %self.name, error = %e, "Scheduled job failed");
                Err(e.to_string())
            }
            Err(_) => {
                tracing::warn!(job = %self.name, "Scheduled job shutdown timed out");
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for FixedDelayScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedDelayScheduler")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}
