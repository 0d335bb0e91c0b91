//! Worker runner: the polling loop that drives the pipeline.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use spoolhub_core::config::WorkerConfig;

use crate::pipeline::SpoolerWorker;

/// Repeatedly steps the pipeline, sleeping between polls when idle.
#[derive(Debug, Clone)]
pub struct WorkerRunner {
    worker: Arc<SpoolerWorker>,
    poll_interval: Duration,
}

impl WorkerRunner {
    pub fn new(worker: Arc<SpoolerWorker>, config: &WorkerConfig) -> Self {
        Self {
            worker,
            poll_interval: config.poll_interval(),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run until `shutdown` turns `true` or its sender is dropped.
    ///
    /// A step in progress always completes; only the idle wait is
    /// interrupted.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Spooler worker started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }
            if self.worker.process_one_step().await {
                continue;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = time::sleep(self.poll_interval) => {}
            }
        }

        tracing::info!("Spooler worker stopped");
    }

    /// Step until there is no more work. Returns the number of steps taken.
    pub async fn run_until_idle(&self) -> usize {
        let mut steps = 0;
        while self.worker.process_one_step().await {
            steps += 1;
        }
        tracing::debug!(steps, "Spooler worker idle");
        steps
    }
}
