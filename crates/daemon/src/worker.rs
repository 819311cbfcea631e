//! Worker pool and retention sweeper
//!
//! Workers drain `pending` records until the queue is empty, then sleep for
//! the poll interval. Analysis runs on the blocking pool since the stores
//! are synchronous.

use crate::state::StateManager;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Back-off after a failed poll
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Fixed set of analysis workers plus the optional sweeper
pub struct WorkerPool {
    state: StateManager,
    shutdown: watch::Receiver<bool>,
}

impl WorkerPool {
    pub fn new(state: StateManager, shutdown: watch::Receiver<bool>) -> Self {
        Self { state, shutdown }
    }

    /// Spawn every task; they exit once shutdown is signalled
    pub fn spawn(self) -> Vec<JoinHandle<()>> {
        let config = self.state.config().clone();
        let mut handles: Vec<JoinHandle<()>> = (0..config.workers.count)
            .map(|index| {
                let state = self.state.clone();
                let shutdown = self.shutdown.clone();
                tokio::spawn(run_worker(index, state, shutdown))
            })
            .collect();

        if config.retention.enabled {
            handles.push(tokio::spawn(run_sweeper(
                self.state.clone(),
                self.shutdown.clone(),
            )));
        }

        info!(
            workers = config.workers.count,
            retention = config.retention.enabled,
            "worker pool started"
        );
        handles
    }
}

/// Process pending records until the queue is empty
pub async fn drain(state: &StateManager) -> testmend_common::Result<usize> {
    let mut processed = 0;
    loop {
        let queue = state.queue().clone();
        let outcome = tokio::task::spawn_blocking(move || queue.process_next())
            .await
            .map_err(|e| testmend_common::Error::Internal(format!("worker task failed: {}", e)))?;

        match outcome {
            Ok(Some(record)) => {
                debug!(record_id = %record.id, status = %record.status, "processed record");
                processed += 1;
            }
            Ok(None) => return Ok(processed),
            // Lost a race with an operator update; the record is someone else's now
            Err(testmend_common::Error::Conflict(reason)) => {
                debug!(%reason, "skipped conflicting record");
            }
            Err(e) => return Err(e),
        }
    }
}

async fn run_worker(index: usize, state: StateManager, mut shutdown: watch::Receiver<bool>) {
    debug!(worker = index, "worker started");
    let poll_interval = state.config().poll_interval();

    loop {
        if *shutdown.borrow() {
            break;
        }

        let wait = match drain(&state).await {
            Ok(processed) => {
                if processed > 0 {
                    info!(worker = index, processed, "queue drained");
                }
                poll_interval
            }
            Err(e) => {
                error!(worker = index, error = %e, "worker poll failed");
                ERROR_BACKOFF
            }
        };

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    debug!(worker = index, "worker stopped");
}

async fn run_sweeper(state: StateManager, mut shutdown: watch::Receiver<bool>) {
    let retention = state.config().retention.clone();
    let interval = state.config().sweep_interval();
    info!(
        older_than_days = retention.older_than_days,
        interval_secs = retention.sweep_interval_secs,
        "retention sweeper started"
    );

    loop {
        let queue = state.queue().clone();
        let days = retention.older_than_days;
        match tokio::task::spawn_blocking(move || queue.cleanup(days)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!(error = %e, "retention sweep failed"),
            Err(e) => error!(error = %e, "retention task failed"),
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
        if *shutdown.borrow() {
            break;
        }
    }
    debug!("retention sweeper stopped");
}
