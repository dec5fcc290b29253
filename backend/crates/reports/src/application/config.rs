//! Export Configuration

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Concurrent export workers
    pub workers: usize,
    /// Lifetime of a job record and its artifact
    pub file_ttl: Duration,
    /// Status frame period of the WebSocket stream
    pub poll_interval: Duration,
    /// Row cap of one export
    pub row_limit: i64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            file_ttl: Duration::from_secs(60 * 60), // 1 hour
            poll_interval: Duration::from_secs(1),
            row_limit: 100_000,
        }
    }
}

impl ExportConfig {
    pub fn development() -> Self {
        Self {
            workers: 2,
            file_ttl: Duration::from_secs(10 * 60),
            ..Default::default()
        }
    }

    /// Zero workers is treated as one
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_file_ttl(mut self, ttl: Duration) -> Self {
        self.file_ttl = ttl;
        self
    }

    pub fn with_poll_interval(mut self, every: Duration) -> Self {
        self.poll_interval = every;
        self
    }
}
