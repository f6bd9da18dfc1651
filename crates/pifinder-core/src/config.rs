use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_WORKERS: usize = 4;
const DEFAULT_POP_TIMEOUT: Duration = Duration::from_secs(1);
const DEFAULT_RETENTION: Duration = Duration::from_secs(60 * 60);
const DEFAULT_GC_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runtime configuration for an `App`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Number of workers pulling from the dispatch queue.
    pub workers: usize,

    /// How long an idle worker blocks on the queue before re-checking shutdown.
    pub pop_timeout: Duration,

    /// How long a finished job stays pollable. `None` keeps it forever.
    pub retention: Option<Duration>,

    /// How often the retention sweeper runs.
    pub gc_interval: Duration,

    /// Re-check interval used by `JobService::wait`.
    pub poll_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            pop_timeout: DEFAULT_POP_TIMEOUT,
            retention: Some(DEFAULT_RETENTION),
            gc_interval: DEFAULT_GC_INTERVAL,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl AppConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_retention(mut self, retention: Option<Duration>) -> Self {
        self.retention = retention;
        self
    }

    pub fn with_gc_interval(mut self, gc_interval: Duration) -> Self {
        self.gc_interval = gc_interval;
        self
    }

    pub fn with_pop_timeout(mut self, pop_timeout: Duration) -> Self {
        self.pop_timeout = pop_timeout;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}
