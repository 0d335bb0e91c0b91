//! Background worker configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Spooler worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the server starts the worker loop.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Milliseconds to wait after a step that found no work.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl WorkerConfig {
    /// The poll backoff as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_ms: default_poll_interval(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    1000
}
